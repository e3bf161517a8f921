//! Integration tests for normalization, row estimation and pagination.

use sopdoc::layout::{
    normalize_steps, paginate, plan, resolve_symbol, PageGeometry, RowEstimator, FALLBACK_CYCLE,
};
use sopdoc::{Error, ImageRef, Sop, StepRecord, SymbolType};

fn numbered_sop(count: usize) -> Sop {
    let mut sop = Sop::new("Filler Changeover");
    for i in 0..count {
        let description = (0..(i % 6) + 1)
            .map(|k| format!("Check item {} of step {}", k + 1, i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        let mut step = StepRecord::new(format!("Step {}", i + 1)).with_description(description);
        if i % 4 == 0 {
            step = step.with_image(ImageRef::new(format!("step-{}.png", i + 1)));
        }
        if i % 5 == 0 {
            step = step.with_reason("Prevents product contamination during the changeover");
        }
        sop.add_step(step);
    }
    sop
}

fn long_step(points: usize) -> StepRecord {
    let description = (0..points)
        .map(|i| format!("Key point number {}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    StepRecord::new("Long step").with_description(description)
}

#[test]
fn test_every_step_placed_exactly_once_in_order() {
    let sop = numbered_sop(40);
    let plan = plan(&sop, &PageGeometry::default()).unwrap();

    let order: Vec<usize> = plan.placements().map(|row| row.step_index).collect();
    assert_eq!(order, (0..40).collect::<Vec<_>>());
    assert!(plan.page_count() > 1);
}

#[test]
fn test_rows_do_not_overlap_and_stay_on_page() {
    let geometry = PageGeometry::default();
    let sop = numbered_sop(40);
    let plan = plan(&sop, &geometry).unwrap();

    for (i, page) in plan.pages.iter().enumerate() {
        assert_eq!(page.page_index, i);
        assert!(!page.rows.is_empty());
        assert!((page.rows[0].top - geometry.content_top()).abs() < 0.001);

        for pair in page.rows.windows(2) {
            assert!(pair[1].top > pair[0].top);
            assert!(pair[1].top >= pair[0].bottom() - 0.001);
        }
        if let Some(bottom) = page.bottom() {
            assert!(bottom <= geometry.usable_bottom());
        }
    }
}

#[test]
fn test_row_height_grows_with_text() {
    let geometry = PageGeometry::default();
    let estimator = RowEstimator::new(&geometry);
    let width = geometry.description_text_width();

    let mut previous = 0.0;
    for points in 0..30 {
        let height = estimator.estimate_height(&long_step(points), width);
        assert!(height >= previous, "{} points gave {} < {}", points, height, previous);
        assert!(height >= geometry.base_row_height);
        previous = height;
    }
}

#[test]
fn test_image_reserves_block_height() {
    let geometry = PageGeometry::default();
    let estimator = RowEstimator::new(&geometry);
    let width = geometry.description_text_width();

    let plain = StepRecord::new("Inspect seal");
    let with_image = plain.clone().with_image(ImageRef::new("seal.png"));

    let (_, image_height) = geometry.image_block();
    assert!(
        estimator.estimate_height(&with_image, width) >= image_height + 2.0 * geometry.padding
    );
    assert!(
        estimator.estimate_height(&with_image, width) >= estimator.estimate_height(&plain, width)
    );
}

#[test]
fn test_fallback_symbols_cycle() {
    let mut sop = Sop::new("Cycle");
    for i in 0..7 {
        sop.add_step(StepRecord::new(format!("Step {}", i + 1)));
    }
    let plan = plan(&sop, &PageGeometry::default()).unwrap();

    let symbols: Vec<SymbolType> = plan.placements().map(|row| row.symbol.symbol).collect();
    assert_eq!(
        symbols,
        vec![
            SymbolType::Quality,
            SymbolType::Correctness,
            SymbolType::Tip,
            SymbolType::Quality,
            SymbolType::Correctness,
            SymbolType::Tip,
            SymbolType::Quality,
        ]
    );
    assert!(plan.placements().all(|row| !row.symbol.explicit));
    assert!(!FALLBACK_CYCLE.contains(&SymbolType::Hazard));
}

#[test]
fn test_explicit_symbol_wins() {
    let step = StepRecord::new("Isolate power").with_symbol(SymbolType::Hazard);
    for index in 0..6 {
        let resolved = resolve_symbol(&step, index);
        assert_eq!(resolved.symbol, SymbolType::Hazard);
        assert!(resolved.explicit);
    }
}

#[test]
fn test_oversized_step_gets_own_page() {
    let geometry = PageGeometry::default();
    let sop = Sop::new("Overflow")
        .with_step(StepRecord::new("Short step"))
        .with_step(long_step(50))
        .with_step(StepRecord::new("After"));

    let estimator = RowEstimator::new(&geometry);
    assert!(
        estimator.estimate_height(&sop.steps[1], geometry.description_text_width())
            > geometry.usable_height()
    );

    let plan = plan(&sop, &geometry).unwrap();
    assert_eq!(plan.page_count(), 3);

    let pages: Vec<Vec<usize>> = plan
        .pages
        .iter()
        .map(|page| page.step_indices().collect())
        .collect();
    assert_eq!(pages, vec![vec![0], vec![1], vec![2]]);
    assert!((plan.pages[1].rows[0].top - geometry.content_top()).abs() < 0.001);
}

#[test]
fn test_untitled_steps_are_dropped() {
    let steps = vec![
        StepRecord::new("First"),
        StepRecord::new("   ").with_description("orphan text"),
        StepRecord::new(""),
        StepRecord::new("Second"),
    ];
    let normalized = normalize_steps(&steps);
    let titles: Vec<&str> = normalized.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);

    // Fallback symbols follow the normalized positions.
    let pages = paginate(&normalized, &PageGeometry::default());
    assert_eq!(pages[0].rows[1].symbol.symbol, SymbolType::Correctness);
}

#[test]
fn test_precondition_errors() {
    let geometry = PageGeometry::default();

    let untitled = Sop::new("  ").with_step(StepRecord::new("Step"));
    assert!(matches!(plan(&untitled, &geometry), Err(Error::MissingTitle)));

    let empty = Sop::new("Empty");
    assert!(matches!(plan(&empty, &geometry), Err(Error::NoSteps)));

    let only_blank = Sop::new("Blank").with_step(StepRecord::new(" "));
    assert!(matches!(plan(&only_blank, &geometry), Err(Error::NoSteps)));

    let cramped = PageGeometry::default().with_columns(300.0, 300.0, 100.0, 200.0);
    let sop = Sop::new("Cramped").with_step(StepRecord::new("Step"));
    assert!(matches!(plan(&sop, &cramped), Err(Error::InvalidGeometry(_))));
}

#[test]
fn test_layout_is_deterministic() {
    let sop = numbered_sop(25);
    let geometry = PageGeometry::a4_portrait();

    let first = plan(&sop, &geometry).unwrap();
    let second = plan(&sop, &geometry).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_portrait_preset_keeps_all_steps() {
    let sop = numbered_sop(30);
    let landscape = plan(&sop, &PageGeometry::a4_landscape()).unwrap();
    let portrait = plan(&sop, &PageGeometry::a4_portrait()).unwrap();

    assert_eq!(portrait.step_count(), landscape.step_count());
    assert_eq!(portrait.placements().count(), 30);
    assert!(portrait.geometry.page_height > landscape.geometry.page_height);
}
