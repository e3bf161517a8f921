//! Step record normalization and export preconditions.

use crate::error::{Error, Result};
use crate::model::{Sop, StepRecord};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes raw step input before layout.
///
/// Drops steps without a title, trims and NFC-normalizes text, and strips
/// the author's own list markers from description lines (the layout numbers
/// key points itself).
pub struct StepNormalizer {
    list_marker: Regex,
}

impl StepNormalizer {
    /// Create a normalizer.
    pub fn new() -> Self {
        Self {
            list_marker: Regex::new(r"^(?:\(?\d{1,3}[.)]|[-*•▪–])\s+").unwrap(),
        }
    }

    /// Keep the steps with a non-blank title, in their original order.
    pub fn normalize(&self, steps: &[StepRecord]) -> Vec<StepRecord> {
        let kept: Vec<StepRecord> = steps
            .iter()
            .filter(|step| step.has_title())
            .map(|step| self.normalize_step(step))
            .collect();

        if kept.len() < steps.len() {
            log::debug!(
                "dropped {} step(s) without a title",
                steps.len() - kept.len()
            );
        }

        kept
    }

    fn normalize_step(&self, step: &StepRecord) -> StepRecord {
        let description = step
            .description
            .lines()
            .map(|line| self.list_marker.replace(line.trim(), "").trim().nfc().collect::<String>())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        StepRecord {
            title: clean(&step.title),
            description,
            symbol: step.symbol,
            reason_why: step.reason().map(clean),
            image: step
                .image
                .clone()
                .filter(|image| !image.source.trim().is_empty()),
        }
    }
}

impl Default for StepNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn clean(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .nfc()
        .collect()
}

/// Filter a raw step list down to the steps that will be laid out.
pub fn normalize_steps(steps: &[StepRecord]) -> Vec<StepRecord> {
    StepNormalizer::new().normalize(steps)
}

/// Check export preconditions and return the normalized steps.
///
/// # Errors
/// * `Error::MissingTitle` if the SOP title is blank
/// * `Error::NoSteps` if no step has a title
pub fn validate(sop: &Sop) -> Result<Vec<StepRecord>> {
    if !sop.metadata.has_title() {
        return Err(Error::MissingTitle);
    }

    let steps = normalize_steps(&sop.steps);
    if steps.is_empty() {
        return Err(Error::NoSteps);
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageRef, SymbolType};

    #[test]
    fn test_drops_blank_titles_preserving_order() {
        let steps = vec![
            StepRecord::new("First"),
            StepRecord::new("   "),
            StepRecord::new("Second"),
            StepRecord::new(""),
            StepRecord::new("Third"),
        ];
        let kept = normalize_steps(&steps);
        let titles: Vec<_> = kept.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_strips_list_markers() {
        let step = StepRecord::new("Prep").with_description("1. Clean bench\n2) Lay out parts\n- Check kit\n\n  • Sign sheet  ");
        let kept = normalize_steps(&[step]);
        assert_eq!(
            kept[0].key_points(),
            vec!["Clean bench", "Lay out parts", "Check kit", "Sign sheet"]
        );
    }

    #[test]
    fn test_keeps_leading_numbers_that_are_not_markers() {
        let step = StepRecord::new("Cut").with_description("5 mm gap from edge");
        let kept = normalize_steps(&[step]);
        assert_eq!(kept[0].description, "5 mm gap from edge");
    }

    #[test]
    fn test_trims_text_and_keeps_annotations() {
        let step = StepRecord::new("  Tighten \t bolts ")
            .with_symbol(SymbolType::Hazard)
            .with_reason("  ");
        let kept = normalize_steps(&[step]);
        assert_eq!(kept[0].title, "Tighten bolts");
        assert_eq!(kept[0].symbol, Some(SymbolType::Hazard));
        assert_eq!(kept[0].reason_why, None);
    }

    #[test]
    fn test_blank_image_source_dropped() {
        let steps = vec![
            StepRecord::new("Blank").with_image(ImageRef::new("  ")),
            StepRecord::new("Real").with_image(ImageRef::new("a.png")),
        ];
        let kept = normalize_steps(&steps);
        assert!(kept[0].image.is_none());
        assert_eq!(kept[1].image.as_ref().map(|i| i.source.as_str()), Some("a.png"));
    }

    #[test]
    fn test_nfc_normalization() {
        // "e" + combining acute accent
        let step = StepRecord::new("Cafe\u{0301}");
        let kept = normalize_steps(&[step]);
        assert_eq!(kept[0].title, "Caf\u{e9}");
    }

    #[test]
    fn test_validate_missing_title() {
        let sop = Sop::new(" ").with_step(StepRecord::new("A"));
        assert!(matches!(validate(&sop), Err(Error::MissingTitle)));
    }

    #[test]
    fn test_validate_no_steps() {
        let sop = Sop::new("Assembly A").with_step(StepRecord::new(" "));
        assert!(matches!(validate(&sop), Err(Error::NoSteps)));

        let empty = Sop::new("Assembly A");
        assert!(matches!(validate(&empty), Err(Error::NoSteps)));
    }
}
