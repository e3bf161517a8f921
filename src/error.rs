//! Error types for sopdoc library.

use std::io;
use thiserror::Error;

/// Result type alias for sopdoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while laying out or exporting an SOP.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The SOP JSON could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The SOP has no title.
    #[error("SOP title is required")]
    MissingTitle,

    /// No step survived normalization.
    #[error("At least one step with a title is required")]
    NoSteps,

    /// The page geometry leaves no room for content.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// An image reference could not be resolved.
    #[error("Could not resolve image '{reference}': {reason}")]
    ImageResolve {
        /// The reference that failed
        reference: String,
        /// Why it failed
        reason: String,
    },

    /// Image bytes could not be decoded.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// Error while building the PDF document.
    #[error("PDF generation error: {0}")]
    Pdf(String),

    /// Error during rendering (PDF, HTML, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// No backend is registered under this name.
    #[error("Unknown export backend: {0}")]
    UnknownBackend(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the export was refused before any layout work began.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingTitle | Error::NoSteps | Error::InvalidGeometry(_)
        )
    }

    /// Single notification line suitable for showing to the author.
    pub fn user_message(&self) -> String {
        match self {
            Error::MissingTitle => "SOP title is required".to_string(),
            Error::NoSteps => "At least one step is required".to_string(),
            other => format!("Export failed: {}", other),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingTitle;
        assert_eq!(err.to_string(), "SOP title is required");

        let err = Error::ImageResolve {
            reference: "a.png".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Could not resolve image 'a.png': not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_precondition_classification() {
        assert!(Error::MissingTitle.is_precondition());
        assert!(Error::NoSteps.is_precondition());
        assert!(Error::InvalidGeometry("x".into()).is_precondition());
        assert!(!Error::Render("boom".into()).is_precondition());
    }

    #[test]
    fn test_user_message() {
        assert_eq!(Error::NoSteps.user_message(), "At least one step is required");
        assert_eq!(
            Error::Render("draw failed".into()).user_message(),
            "Export failed: Rendering error: draw failed"
        );
    }
}
