//! # sopdoc
//!
//! Layout and export engine for Standard Operating Procedure documents.
//!
//! An SOP is a title block plus an ordered list of steps. This library lays
//! the steps out as a paginated table (number, title and key points, image,
//! symbol, reason) and exports the result as PDF, print-ready HTML or JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sopdoc::{load_sop, Exporter};
//!
//! fn main() -> sopdoc::Result<()> {
//!     let sop = load_sop("line_check.json")?;
//!
//!     let result = Exporter::new()
//!         .with_image_dir("./photos")
//!         .export(&sop)?;
//!     std::fs::write(&result.filename, &result.bytes)?;
//!     println!("{}", result.notice());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Normalize**: drop untitled steps, clean up key points
//! 2. **Estimate**: measure each row with Helvetica metrics
//! 3. **Paginate**: place rows top to bottom, breaking pages on overflow
//! 4. **Emit**: translate pages into backend-agnostic drawing commands
//! 5. **Export**: encode the commands with the PDF, HTML or JSON backend
//!
//! Image references are resolved before step 4 through an
//! [`ImageResolver`]; images that cannot be loaded become placeholders.

pub mod detect;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod render;
pub mod resolve;

// Re-export commonly used types
pub use detect::{detect_image_format, ImageFormat};
pub use error::{Error, Result};
pub use export::{
    export_filename, BackendRegistry, ExportFormat, ExportOptions, ExportResult, FilenameStyle,
    JsonFormat, Paper, RenderBackend,
};
pub use layout::{plan, DocumentPlan, PageGeometry, PageLayout, RowPlacement};
pub use model::{ImageRef, Sop, SopMetadata, StepRecord, SymbolType};
pub use render::{RenderCommand, RenderStats, RenderedDocument};
pub use resolve::{FsImageResolver, ImageResolver, MemoryImageResolver, NoImages};

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parse an SOP from JSON.
///
/// # Example
///
/// ```
/// let sop = sopdoc::parse_sop(r#"{
///     "metadata": { "title": "Line check" },
///     "steps": [{ "title": "Stop the line", "symbolType": "hazard" }]
/// }"#).unwrap();
/// assert_eq!(sop.steps.len(), 1);
/// ```
pub fn parse_sop(json: &str) -> Result<Sop> {
    Ok(serde_json::from_str(json)?)
}

/// Parse an SOP from a reader.
pub fn parse_sop_reader<R: Read>(reader: R) -> Result<Sop> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load an SOP from a JSON file.
pub fn load_sop<P: AsRef<Path>>(path: P) -> Result<Sop> {
    let file = std::fs::File::open(path)?;
    parse_sop_reader(std::io::BufReader::new(file))
}

/// Export an SOP with the given options.
///
/// Image references are not fetched; unresolved images become
/// placeholders. Use [`Exporter`] or [`export_with_images`] to load them.
///
/// # Errors
/// `MissingTitle`, `NoSteps` and `InvalidGeometry` before any layout work;
/// backend errors afterwards.
pub fn export(sop: &Sop, options: &ExportOptions) -> Result<ExportResult> {
    let plan = layout::plan(sop, &options.geometry)?;
    BackendRegistry::with_defaults().export(&render::render(plan), options)
}

/// Resolve images through `resolver`, then export.
pub fn export_with_images<R: ImageResolver + ?Sized>(
    sop: &Sop,
    resolver: &R,
    options: &ExportOptions,
) -> Result<ExportResult> {
    options.geometry.validate()?;
    layout::validate(sop)?;
    let resolved = resolve::resolve_sop(sop, resolver, options.max_in_flight)?;
    export(&resolved, options)
}

/// Export an SOP to PDF with default options.
pub fn export_pdf(sop: &Sop) -> Result<ExportResult> {
    export(sop, &ExportOptions::new().with_format(ExportFormat::Pdf))
}

/// Export an SOP to print-ready HTML with default options.
pub fn export_html(sop: &Sop) -> Result<ExportResult> {
    export(sop, &ExportOptions::new().with_format(ExportFormat::Html))
}

/// Write an export result to `target`.
///
/// When `target` is an existing directory the result's filename is used
/// inside it. The bytes go to a temporary file in the same directory that
/// is renamed into place, so a failed write never leaves a partial file.
pub fn write_result<P: AsRef<Path>>(result: &ExportResult, target: P) -> Result<PathBuf> {
    let target = target.as_ref();
    let path = if target.is_dir() {
        target.join(&result.filename)
    } else {
        target.to_path_buf()
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(&dir)?;
    file.write_all(&result.bytes)?;
    file.flush()?;
    file.persist(&path).map_err(|e| Error::Io(e.error))?;

    log::debug!("wrote {} bytes to {}", result.len(), path.display());
    Ok(path)
}

/// Export an SOP and write it to `target` (a file path or a directory).
pub fn export_to_file<P: AsRef<Path>>(
    sop: &Sop,
    options: &ExportOptions,
    target: P,
) -> Result<(ExportResult, PathBuf)> {
    let result = export(sop, options)?;
    let path = write_result(&result, target)?;
    Ok((result, path))
}

/// Builder for exporting SOP documents.
///
/// # Example
///
/// ```no_run
/// use sopdoc::{Exporter, Paper, Sop, StepRecord};
///
/// let sop = Sop::new("Line check").with_step(StepRecord::new("Stop the line"));
/// let result = Exporter::new()
///     .html()
///     .with_paper(Paper::A4Portrait)
///     .upper_suffix()
///     .without_images()
///     .export(&sop)?;
/// assert_eq!(result.filename, "line_check_SOP.html");
/// # Ok::<(), sopdoc::Error>(())
/// ```
pub struct Exporter {
    options: ExportOptions,
    resolver: Option<Arc<dyn ImageResolver>>,
    registry: BackendRegistry,
}

impl Exporter {
    /// Create a new exporter (PDF, A4 landscape, no image loading).
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
            resolver: None,
            registry: BackendRegistry::with_defaults(),
        }
    }

    /// Replace all options.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.options = self.options.with_format(format);
        self
    }

    /// Export to PDF.
    pub fn pdf(self) -> Self {
        self.with_format(ExportFormat::Pdf)
    }

    /// Export to print-ready HTML.
    pub fn html(self) -> Self {
        self.with_format(ExportFormat::Html)
    }

    /// Export to JSON.
    pub fn json(self) -> Self {
        self.with_format(ExportFormat::Json)
    }

    /// Use a paper preset.
    pub fn with_paper(mut self, paper: Paper) -> Self {
        self.options = self.options.with_paper(paper);
        self
    }

    /// Set a custom page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.options = self.options.with_geometry(geometry);
        self
    }

    /// Use the `_SOP` filename suffix.
    pub fn upper_suffix(mut self) -> Self {
        self.options = self.options.with_filename_style(FilenameStyle::Upper);
        self
    }

    /// Set the image fetch concurrency limit.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.options = self.options.with_max_in_flight(limit);
        self
    }

    /// Load images through a custom resolver.
    pub fn with_resolver(mut self, resolver: impl ImageResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Load images from a directory (and `file://` URLs).
    pub fn with_image_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.with_resolver(FsImageResolver::new(dir))
    }

    /// Skip image loading; every image becomes a placeholder.
    pub fn without_images(self) -> Self {
        self.with_resolver(NoImages)
    }

    /// Register an additional or replacement backend.
    pub fn with_backend(mut self, backend: Arc<dyn RenderBackend>) -> Self {
        self.registry.register(backend);
        self
    }

    /// Get the export options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Lay out an SOP without exporting it.
    pub fn plan(&self, sop: &Sop) -> Result<DocumentPlan> {
        layout::plan(sop, &self.options.geometry)
    }

    /// Resolve images, lay out and encode an SOP.
    pub fn export(&self, sop: &Sop) -> Result<ExportResult> {
        // Refuse invalid input before fetching anything.
        self.options.geometry.validate()?;
        layout::validate(sop)?;

        let resolved;
        let sop = match &self.resolver {
            Some(resolver) => {
                resolved =
                    resolve::resolve_sop(sop, resolver.as_ref(), self.options.max_in_flight)?;
                &resolved
            }
            None => sop,
        };

        let plan = layout::plan(sop, &self.options.geometry)?;
        self.registry.export(&render::render(plan), &self.options)
    }

    /// Export and write to `target` (a file path or a directory).
    pub fn export_to_file<P: AsRef<Path>>(
        &self,
        sop: &Sop,
        target: P,
    ) -> Result<(ExportResult, PathBuf)> {
        let result = self.export(sop)?;
        let path = write_result(&result, target)?;
        Ok((result, path))
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
