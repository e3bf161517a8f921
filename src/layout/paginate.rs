//! Pagination of step rows into pages.

use super::estimate::{RowEstimator, RowLines};
use super::metrics::TextMeasure;
use super::symbol::{resolve_symbol, ResolvedSymbol};
use super::PageGeometry;
use crate::model::StepRecord;
use serde::{Deserialize, Serialize};

/// Vertical drawing position, threaded through pagination by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// 0-based page index
    pub page_index: usize,

    /// Offset from the top edge of the page
    pub y: f32,
}

impl Cursor {
    /// Cursor at the first row slot of the first page.
    pub fn start(geometry: &PageGeometry) -> Self {
        Self {
            page_index: 0,
            y: geometry.content_top(),
        }
    }

    /// Whether a row of `height` fits above `bottom`.
    ///
    /// A row that exactly fills the remaining space fits. The sum is the
    /// one [`RowPlacement::bottom`] reports, so an accepted row never ends
    /// below `bottom`.
    pub fn fits(&self, height: f32, bottom: f32) -> bool {
        self.y + height <= bottom
    }

    /// Place a row of `height` here; returns its top and the cursor below it.
    pub fn advance(self, height: f32) -> (f32, Cursor) {
        let top = self.y;
        (
            top,
            Cursor {
                y: top + height,
                ..self
            },
        )
    }

    /// Cursor at the first row slot of the following page.
    pub fn next_page(self, geometry: &PageGeometry) -> Cursor {
        Cursor {
            page_index: self.page_index + 1,
            y: geometry.content_top(),
        }
    }
}

/// Where one step's row sits on its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPlacement {
    /// Index into the normalized step list
    pub step_index: usize,

    /// Offset of the row's top edge from the top of the page
    pub top: f32,

    /// Row height
    pub height: f32,

    /// Symbol shown in the row
    pub symbol: ResolvedSymbol,

    /// Wrapped text for drawing
    pub lines: RowLines,
}

impl RowPlacement {
    /// Offset of the row's bottom edge.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// A contiguous run of step rows assigned to one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 0-based page index
    pub page_index: usize,

    /// Rows in top-to-bottom order
    pub rows: Vec<RowPlacement>,
}

impl PageLayout {
    /// Create an empty page.
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            rows: Vec::new(),
        }
    }

    /// Check if no row has been placed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bottom edge of the last row, if any.
    pub fn bottom(&self) -> Option<f32> {
        self.rows.last().map(RowPlacement::bottom)
    }

    /// Step indices on this page.
    pub fn step_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|r| r.step_index)
    }
}

/// Split `steps` into pages using Helvetica metrics.
pub fn paginate(steps: &[StepRecord], geometry: &PageGeometry) -> Vec<PageLayout> {
    paginate_with(steps, geometry, &RowEstimator::new(geometry))
}

/// Split `steps` into pages using a specific estimator.
///
/// Rows are placed in input order. A row that would cross the usable
/// bottom starts a new page, unless the current page is still empty: an
/// empty page always accepts the row, so a row taller than a whole page
/// gets a page to itself and pagination always terminates.
pub fn paginate_with<M: TextMeasure>(
    steps: &[StepRecord],
    geometry: &PageGeometry,
    estimator: &RowEstimator<'_, M>,
) -> Vec<PageLayout> {
    let bottom = geometry.usable_bottom();
    let wrap_width = geometry.description_text_width();

    let mut pages = Vec::new();
    let mut page = PageLayout::new(0);
    let mut cursor = Cursor::start(geometry);

    for (step_index, step) in steps.iter().enumerate() {
        let estimate = estimator.estimate(step, wrap_width);

        if !page.is_empty() && !cursor.fits(estimate.height, bottom) {
            cursor = cursor.next_page(geometry);
            pages.push(std::mem::replace(&mut page, PageLayout::new(cursor.page_index)));
        }

        if estimate.height > geometry.usable_height() {
            log::warn!(
                "step {} needs {:.1}pt but a page only has {:.1}pt; it will overflow",
                step_index + 1,
                estimate.height,
                geometry.usable_height()
            );
        }

        let (top, next) = cursor.advance(estimate.height);
        page.rows.push(RowPlacement {
            step_index,
            top,
            height: estimate.height,
            symbol: resolve_symbol(step, step_index),
            lines: estimate.lines,
        });
        cursor = next;
    }

    if !page.is_empty() {
        pages.push(page);
    }

    log::debug!("paginated {} steps onto {} pages", steps.len(), pages.len());
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::FontFace;

    /// One point per character; keeps row heights easy to predict.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str, _font: FontFace, _size: f32) -> f32 {
            text.chars().count() as f32
        }
    }

    /// Geometry with 100pt of row space and 10pt lines, no padding.
    fn small_geometry() -> PageGeometry {
        PageGeometry {
            page_height: 200.0,
            margin: 0.0,
            title_height: 40.0,
            meta_height: 20.0,
            legend_height: 20.0,
            table_header_height: 10.0,
            footer_height: 10.0,
            base_row_height: 10.0,
            line_height: 10.0,
            padding: 0.0,
            ..PageGeometry::default()
        }
    }

    /// A step whose row is `lines` lines tall (title + key points).
    fn step_with_lines(lines: usize) -> StepRecord {
        let description = vec!["x"; lines - 1].join("\n");
        StepRecord::new("t").with_description(description)
    }

    #[test]
    fn test_cursor_threading() {
        let g = small_geometry();
        let cursor = Cursor::start(&g);
        assert_eq!(cursor.y, 90.0);

        let (top, next) = cursor.advance(25.0);
        assert_eq!(top, 90.0);
        assert_eq!(next.y, 115.0);
        assert_eq!(cursor.y, 90.0);

        let fresh = next.next_page(&g);
        assert_eq!(fresh.page_index, 1);
        assert_eq!(fresh.y, 90.0);
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        let g = small_geometry();
        let est = RowEstimator::with_measure(&g, Monospace);
        // usable height is 100: 6 lines + 4 lines fill it exactly
        let steps = vec![step_with_lines(6), step_with_lines(4)];
        let pages = paginate_with(&steps, &g, &est);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].bottom(), Some(g.usable_bottom()));
    }

    #[test]
    fn test_near_miss_opens_new_page() {
        let g = PageGeometry {
            padding: 0.002,
            ..small_geometry()
        };
        let est = RowEstimator::with_measure(&g, Monospace);
        // 60.004 + 40.004 overshoots the 100pt of row space by 0.008pt
        let steps = vec![step_with_lines(6), step_with_lines(4)];
        let pages = paginate_with(&steps, &g, &est);

        assert_eq!(pages.len(), 2);
        for page in &pages {
            assert!(page.bottom().unwrap() <= g.usable_bottom());
        }
    }

    #[test]
    fn test_overflow_opens_new_page() {
        let g = small_geometry();
        let est = RowEstimator::with_measure(&g, Monospace);
        let steps = vec![step_with_lines(6), step_with_lines(5)];
        let pages = paginate_with(&steps, &g, &est);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].page_index, 1);
        assert_eq!(pages[1].rows[0].step_index, 1);
        assert_eq!(pages[1].rows[0].top, g.content_top());
    }

    #[test]
    fn test_oversized_row_gets_own_page() {
        let g = small_geometry();
        let est = RowEstimator::with_measure(&g, Monospace);
        let steps = vec![step_with_lines(2), step_with_lines(30), step_with_lines(2)];
        let pages = paginate_with(&steps, &g, &est);

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].rows.len(), 1);
        assert_eq!(pages[1].rows[0].height, 300.0);
        assert_eq!(pages[2].rows[0].step_index, 2);
    }

    #[test]
    fn test_oversized_first_row_terminates() {
        let g = small_geometry();
        let est = RowEstimator::with_measure(&g, Monospace);
        let steps = vec![step_with_lines(50), step_with_lines(50)];
        let pages = paginate_with(&steps, &g, &est);
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.rows.len() == 1));
    }

    #[test]
    fn test_empty_input() {
        let g = small_geometry();
        assert!(paginate(&[], &g).is_empty());
    }

    #[test]
    fn test_rows_stack_without_gaps() {
        let g = small_geometry();
        let est = RowEstimator::with_measure(&g, Monospace);
        let steps: Vec<_> = (0..5).map(|_| step_with_lines(2)).collect();
        let pages = paginate_with(&steps, &g, &est);
        assert_eq!(pages.len(), 1);
        for pair in pages[0].rows.windows(2) {
            assert_eq!(pair[0].bottom(), pair[1].top);
        }
    }
}
