//! Export options and configuration.

use crate::error::{Error, Result};
use crate::layout::PageGeometry;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default number of image fetches allowed in flight at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Options for exporting an SOP.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Output format
    pub format: ExportFormat,

    /// Page geometry used for layout and drawing
    pub geometry: PageGeometry,

    /// Case of the filename suffix
    pub filename_style: FilenameStyle,

    /// Maximum concurrent image fetches
    pub max_in_flight: usize,

    /// JSON layout (JSON output only)
    pub json_format: JsonFormat,

    /// Compress PDF content streams
    pub compress: bool,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Use a paper preset.
    pub fn with_paper(mut self, paper: Paper) -> Self {
        self.geometry = paper.geometry();
        self
    }

    /// Set the filename suffix style.
    pub fn with_filename_style(mut self, style: FilenameStyle) -> Self {
        self.filename_style = style;
        self
    }

    /// Set the image fetch concurrency limit (at least 1).
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = limit.max(1);
        self
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Enable or disable PDF stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            geometry: PageGeometry::default(),
            filename_style: FilenameStyle::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            json_format: JsonFormat::default(),
            compress: true,
        }
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Paginated PDF document
    #[default]
    Pdf,

    /// Print-ready HTML markup
    Html,

    /// Plan and drawing commands as JSON
    Json,
}

impl ExportFormat {
    /// All formats.
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Html, ExportFormat::Json];

    /// Backend name.
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        self.name()
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Html => "text/html; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "html" | "htm" | "print" => Ok(ExportFormat::Html),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::UnknownBackend(other.to_string())),
        }
    }
}

/// Case of the `_sop` filename suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameStyle {
    /// `title_sop.pdf`
    #[default]
    Lower,
    /// `title_SOP.pdf`
    Upper,
}

impl FilenameStyle {
    /// The suffix placed before the extension.
    pub fn suffix(&self) -> &'static str {
        match self {
            FilenameStyle::Lower => "_sop",
            FilenameStyle::Upper => "_SOP",
        }
    }
}

/// JSON output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Paper size presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Paper {
    /// A4, long edge horizontal
    #[default]
    A4Landscape,
    /// A4, long edge vertical
    A4Portrait,
    /// US Letter, long edge horizontal
    LetterLandscape,
}

impl Paper {
    /// Geometry for this paper size.
    pub fn geometry(&self) -> PageGeometry {
        match self {
            Paper::A4Landscape => PageGeometry::a4_landscape(),
            Paper::A4Portrait => PageGeometry::a4_portrait(),
            Paper::LetterLandscape => PageGeometry::letter_landscape(),
        }
    }
}

impl FromStr for Paper {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "a4" | "a4landscape" => Ok(Paper::A4Landscape),
            "a4portrait" => Ok(Paper::A4Portrait),
            "letter" | "letterlandscape" => Ok(Paper::LetterLandscape),
            _ => Err(Error::Other(format!("Unknown paper size: {}", s))),
        }
    }
}
