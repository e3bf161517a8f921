//! Export backends with a registry keyed by output format.
//!
//! Every backend consumes the same [`RenderedDocument`], so PDF, HTML and
//! JSON output always agree on what is drawn where.
//!
//! # Example
//!
//! ```no_run
//! use sopdoc::export::{BackendRegistry, ExportFormat, ExportOptions};
//! use sopdoc::{layout, render, Sop, StepRecord};
//!
//! fn main() -> sopdoc::Result<()> {
//!     let sop = Sop::new("Line check").with_step(StepRecord::new("Inspect belt"));
//!     let options = ExportOptions::new().with_format(ExportFormat::Html);
//!     let plan = layout::plan(&sop, &options.geometry)?;
//!
//!     let registry = BackendRegistry::with_defaults();
//!     let result = registry.export(&render::render(plan), &options)?;
//!     println!("{}", result.filename);
//!     Ok(())
//! }
//! ```

mod html;
mod json;
mod options;
mod pdf;

pub use html::HtmlBackend;
pub use json::JsonBackend;
pub use options::{
    ExportFormat, ExportOptions, FilenameStyle, JsonFormat, Paper, DEFAULT_MAX_IN_FLIGHT,
};
pub use pdf::PdfBackend;

use crate::error::{Error, Result};
use crate::render::{RenderStats, RenderedDocument};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of an export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Encoded document
    pub bytes: Vec<u8>,

    /// Suggested filename
    pub filename: String,

    /// Output format
    pub format: ExportFormat,

    /// MIME type of the output
    pub mime_type: &'static str,

    /// Document title
    pub title: String,

    /// Emission statistics
    pub stats: RenderStats,
}

impl ExportResult {
    /// Get output length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the output is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Single confirmation line for the author.
    ///
    /// Image-bearing documents mention how many images were replaced by
    /// placeholders.
    pub fn notice(&self) -> String {
        let mut notice = format!(
            "Exported \"{}\" as {} ({} page{})",
            self.title,
            self.filename,
            self.stats.page_count,
            if self.stats.page_count == 1 { "" } else { "s" }
        );

        let referenced = self.stats.images_embedded + self.stats.images_failed;
        if self.stats.images_failed > 0 {
            notice.push_str(&format!(
                "; {} of {} image{} could not be loaded and {} shown as placeholder{}",
                self.stats.images_failed,
                referenced,
                if referenced == 1 { "" } else { "s" },
                if self.stats.images_failed == 1 { "is" } else { "are" },
                if self.stats.images_failed == 1 { "" } else { "s" },
            ));
        } else if referenced > 0 {
            notice.push_str(&format!(
                "; {} image{} embedded",
                referenced,
                if referenced == 1 { "" } else { "s" }
            ));
        }
        notice
    }
}

/// Trait for export backends.
///
/// Implement this trait to add a new output format.
pub trait RenderBackend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// The format this backend produces.
    fn format(&self) -> ExportFormat;

    /// Encode a rendered document.
    fn render(&self, doc: &RenderedDocument, options: &ExportOptions) -> Result<Vec<u8>>;
}

/// Registry for export backends.
pub struct BackendRegistry {
    backends: HashMap<ExportFormat, Arc<dyn RenderBackend>>,
    by_name: HashMap<String, Arc<dyn RenderBackend>>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the PDF, HTML and JSON backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfBackend::new()));
        registry.register(Arc::new(HtmlBackend::new()));
        registry.register(Arc::new(JsonBackend::new()));
        registry
    }

    /// Register a backend, replacing any backend for the same format.
    pub fn register(&mut self, backend: Arc<dyn RenderBackend>) {
        self.by_name
            .insert(backend.name().to_lowercase(), backend.clone());
        self.backends.insert(backend.format(), backend);
    }

    /// Get the backend for a format.
    pub fn get(&self, format: ExportFormat) -> Option<Arc<dyn RenderBackend>> {
        self.backends.get(&format).cloned()
    }

    /// Get a backend by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn RenderBackend>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a format has a backend.
    pub fn supports(&self, format: ExportFormat) -> bool {
        self.backends.contains_key(&format)
    }

    /// Encode a rendered document with the backend for `options.format`.
    pub fn export(&self, doc: &RenderedDocument, options: &ExportOptions) -> Result<ExportResult> {
        let backend = self
            .get(options.format)
            .ok_or_else(|| Error::UnknownBackend(options.format.to_string()))?;

        let bytes = backend.render(doc, options)?;
        let filename = export_filename(doc.title(), options.filename_style, options.format);

        log::info!(
            "exported '{}' with {} backend: {} pages, {} bytes",
            doc.title(),
            backend.name(),
            doc.stats.page_count,
            bytes.len()
        );

        Ok(ExportResult {
            bytes,
            filename,
            format: options.format,
            mime_type: options.format.mime_type(),
            title: doc.title().to_string(),
            stats: doc.stats.clone(),
        })
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Filename derived from the SOP title.
///
/// Every character that is not an ASCII letter or digit becomes `_`, the
/// result is lowercased and suffixed with `_sop` or `_SOP`.
pub fn export_filename(title: &str, style: FilenameStyle, format: ExportFormat) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    format!("{}{}.{}", stem, style.suffix(), format.extension())
}
