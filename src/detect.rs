//! Image format detection from magic bytes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Raster formats accepted for step images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG / JFIF
    Jpeg,
    /// Portable Network Graphics
    Png,
    /// GIF87a / GIF89a
    Gif,
    /// WebP (RIFF container)
    Webp,
    /// Windows bitmap
    Bmp,
}

impl ImageFormat {
    /// MIME type for data URIs and HTTP responses.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Bmp => "bmp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Detect the image format of a resolved buffer.
///
/// # Returns
/// * `Ok(ImageFormat)` for a recognized raster format
/// * `Err(Error::ImageDecode)` if the bytes are not a supported image
pub fn detect_image_format(data: &[u8]) -> Result<ImageFormat> {
    if data.starts_with(JPEG_MAGIC) {
        return Ok(ImageFormat::Jpeg);
    }
    if data.starts_with(PNG_MAGIC) {
        return Ok(ImageFormat::Png);
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Ok(ImageFormat::Gif);
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(ImageFormat::Webp);
    }
    // "BM" alone is too weak; require room for the 14-byte file header.
    if data.len() >= 14 && data.starts_with(b"BM") {
        return Ok(ImageFormat::Bmp);
    }

    Err(Error::ImageDecode(format!(
        "unrecognized image data ({} bytes)",
        data.len()
    )))
}

/// Check if bytes look like a supported image.
pub fn is_image_bytes(data: &[u8]) -> bool {
    detect_image_format(data).is_ok()
}
