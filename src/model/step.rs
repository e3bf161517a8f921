//! Step-level types.

use super::{ImageRef, SymbolType};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the SOP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Step title (steps with a blank title are dropped before layout)
    #[serde(default)]
    pub title: String,

    /// Free text; each line becomes a key point
    #[serde(default)]
    pub description: String,

    /// Explicit annotation symbol
    #[serde(
        default,
        rename = "symbolType",
        alias = "symbol",
        skip_serializing_if = "Option::is_none"
    )]
    pub symbol: Option<SymbolType>,

    /// Why the step matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_why: Option<String>,

    /// Optional step image
    #[serde(
        default,
        rename = "imageRef",
        alias = "image",
        alias = "imageUrl",
        deserialize_with = "non_blank_image",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<ImageRef>,
}

/// An empty or whitespace-only reference means "no image".
fn non_blank_image<'de, D>(deserializer: D) -> Result<Option<ImageRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|source| !source.trim().is_empty())
        .map(ImageRef::new))
}

impl StepRecord {
    /// Create a step with a title and no description.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set an explicit symbol.
    pub fn with_symbol(mut self, symbol: SymbolType) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Set the reason text.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason_why = Some(reason.into());
        self
    }

    /// Attach an image reference.
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    /// Check if the title is present and not just whitespace.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Non-empty description lines, trimmed, in order.
    ///
    /// Returns an empty list for a blank description; the row estimator
    /// substitutes its own placeholder in that case.
    pub fn key_points(&self) -> Vec<&str> {
        self.description
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Reason text if present and not blank.
    pub fn reason(&self) -> Option<&str> {
        self.reason_why
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_builder() {
        let step = StepRecord::new("Fit bracket")
            .with_description("Align holes\nInsert bolts")
            .with_symbol(SymbolType::Hazard)
            .with_reason("Loose brackets fall");

        assert!(step.has_title());
        assert_eq!(step.key_points(), vec!["Align holes", "Insert bolts"]);
        assert_eq!(step.reason(), Some("Loose brackets fall"));
    }

    #[test]
    fn test_key_points_skip_blank_lines() {
        let step = StepRecord::new("x").with_description("\r\n  first \n\n\tsecond\r\n");
        assert_eq!(step.key_points(), vec!["first", "second"]);

        let empty = StepRecord::new("x");
        assert!(empty.key_points().is_empty());
    }

    #[test]
    fn test_blank_reason() {
        let step = StepRecord::new("x").with_reason("   ");
        assert_eq!(step.reason(), None);
    }

    #[test]
    fn test_step_json_field_names() {
        let json = r#"{
            "title": "Check torque",
            "description": "Set wrench to 12 Nm",
            "symbolType": "tip",
            "reasonWhy": "Over-torque strips threads",
            "imageRef": "https://example.com/torque.jpg"
        }"#;
        let step: StepRecord = serde_json::from_str(json).unwrap();
        assert_eq!(step.symbol, Some(SymbolType::Tip));
        assert_eq!(step.reason(), Some("Over-torque strips threads"));
        assert_eq!(
            step.image.as_ref().map(|i| i.source.as_str()),
            Some("https://example.com/torque.jpg")
        );
    }

    #[test]
    fn test_blank_image_ref_is_no_image() {
        for json in [
            r#"{"title": "a", "imageRef": ""}"#,
            r#"{"title": "a", "imageRef": "   "}"#,
            r#"{"title": "a", "imageRef": null}"#,
            r#"{"title": "a"}"#,
        ] {
            let step: StepRecord = serde_json::from_str(json).unwrap();
            assert!(step.image.is_none(), "{}", json);
        }
    }
}
