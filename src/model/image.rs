//! Step image references and their resolution state.

use crate::detect::{detect_image_format, ImageFormat};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// An opaque image handle attached to a step.
///
/// Serialized as the bare reference string; the resolution state is
/// runtime-only and always starts out [`ImageState::Unresolved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ImageRef {
    /// URL, path, or any key understood by the image resolver
    pub source: String,

    /// Resolution state
    pub state: ImageState,
}

impl ImageRef {
    /// Create an unresolved reference.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            state: ImageState::Unresolved,
        }
    }

    /// Create a reference with an already-resolved buffer.
    ///
    /// The buffer is validated; unrecognized data yields a failed reference.
    pub fn resolved(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mut image = Self::new(source);
        image.attach(bytes);
        image
    }

    /// Create a reference explicitly marked as failed.
    pub fn failed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            state: ImageState::Failed(reason.into()),
        }
    }

    /// Attach fetched bytes, validating the image format.
    pub fn attach(&mut self, bytes: Vec<u8>) {
        self.state = match detect_image_format(&bytes) {
            Ok(format) => ImageState::Resolved(ImageData::new(bytes, format)),
            Err(e) => ImageState::Failed(e.to_string()),
        };
    }

    /// Mark this reference as failed.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.state = ImageState::Failed(reason.into());
    }

    /// The resolved data, if any.
    pub fn data(&self) -> Option<&ImageData> {
        match &self.state {
            ImageState::Resolved(data) => Some(data),
            _ => None,
        }
    }

    /// Check if the image is ready to draw.
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ImageState::Resolved(_))
    }

    /// Check if resolution has not been attempted yet.
    pub fn is_unresolved(&self) -> bool {
        matches!(self.state, ImageState::Unresolved)
    }
}

impl From<String> for ImageRef {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.source
    }
}

/// Where an image reference stands in the resolution pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageState {
    /// Not fetched yet
    #[default]
    Unresolved,
    /// Fetched and recognized
    Resolved(ImageData),
    /// Fetch or validation failed
    Failed(String),
}

/// A resolved, format-checked image buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Raw encoded bytes (shared, never copied per command)
    pub bytes: Arc<[u8]>,

    /// Detected format
    pub format: ImageFormat,
}

impl ImageData {
    /// Wrap encoded bytes of a known format.
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            bytes: Arc::from(bytes),
            format,
        }
    }

    /// Size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// MIME type of the encoded data.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}
