//! JSON export of the plan and drawing commands.

use super::{ExportFormat, ExportOptions, JsonFormat, RenderBackend};
use crate::error::{Error, Result};
use crate::render::RenderedDocument;

/// Serializes the layout plan, command list and statistics.
///
/// Image bytes are not included; image commands carry their reference and
/// detected format only.
#[derive(Debug, Clone, Default)]
pub struct JsonBackend {
    _private: (),
}

impl JsonBackend {
    /// Create a new JSON backend.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

/// Convert a rendered document to a JSON string.
pub fn to_json(doc: &RenderedDocument, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

impl RenderBackend for JsonBackend {
    fn name(&self) -> &str {
        "json"
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn render(&self, doc: &RenderedDocument, options: &ExportOptions) -> Result<Vec<u8>> {
        to_json(doc, options.json_format).map(String::into_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan, PageGeometry};
    use crate::model::{Sop, StepRecord};
    use crate::render::render;

    fn rendered() -> RenderedDocument {
        let sop = Sop::new("Torque check").with_step(StepRecord::new("Set wrench"));
        render(plan(&sop, &PageGeometry::default()).unwrap())
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&rendered(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\": \"Torque check\""));
        assert!(json.contains("\"op\": \"begin_page\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&rendered(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_json_backend_output_parses() {
        let options = ExportOptions::new().with_format(ExportFormat::Json);
        let bytes = JsonBackend::new().render(&rendered(), &options).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["stats"]["page_count"], 1);
        assert_eq!(value["plan"]["pages"][0]["rows"][0]["step_index"], 0);
    }
}
