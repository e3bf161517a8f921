//! Backend-agnostic drawing commands.

use crate::detect::ImageFormat;
use crate::layout::FontFace;
use crate::model::{Color, ImageData};
use serde::Serialize;

/// Fraction of the font size between the top of a text line and its baseline.
pub const ASCENT: f32 = 0.8;

/// Placeholder text drawn where a step image cannot be shown.
pub const IMAGE_PLACEHOLDER_TEXT: &str = "Image not available";

/// One drawing instruction. Coordinates are points from the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Start a new page; every following command belongs to it.
    BeginPage {
        /// 0-based page index
        index: usize,
        /// Page width
        width: f32,
        /// Page height
        height: f32,
    },

    /// A rectangle (a circle when `radius` is half the side).
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        style: RectStyle,
    },

    /// One line of text; `y` is the top of the line.
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
        /// Cell width the text must stay within, if constrained
        #[serde(skip_serializing_if = "Option::is_none")]
        wrap_width: Option<f32>,
    },

    /// A resolved image scaled to fit the box.
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: EmbeddedImage,
    },
}

impl RenderCommand {
    /// Check if this command starts a page.
    pub fn is_page_start(&self) -> bool {
        matches!(self, RenderCommand::BeginPage { .. })
    }

    /// Text content, for text commands.
    pub fn text(&self) -> Option<&str> {
        match self {
            RenderCommand::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Fill and stroke of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectStyle {
    /// Fill color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,

    /// Stroke color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,

    /// Stroke width
    pub line_width: f32,

    /// Corner radius
    pub radius: f32,
}

impl RectStyle {
    /// Outline only.
    pub fn stroked(color: Color, line_width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            line_width,
            radius: 0.0,
        }
    }

    /// Fill only.
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            line_width: 0.0,
            radius: 0.0,
        }
    }

    /// Fill with an outline.
    pub fn filled_stroked(fill: Color, stroke: Color, line_width: f32) -> Self {
        Self {
            fill: Some(fill),
            stroke: Some(stroke),
            line_width,
            radius: 0.0,
        }
    }

    /// Round the corners.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

/// Font, size and color of a text line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub font: FontFace,
    pub size: f32,
    pub color: Color,
}

impl TextStyle {
    /// Regular black text.
    pub fn regular(size: f32) -> Self {
        Self {
            font: FontFace::Regular,
            size,
            color: Color::BLACK,
        }
    }

    /// Bold black text.
    pub fn bold(size: f32) -> Self {
        Self {
            font: FontFace::Bold,
            size,
            color: Color::BLACK,
        }
    }

    /// Change the color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Distance from the line top to the baseline.
    pub fn ascent(&self) -> f32 {
        self.size * ASCENT
    }
}

/// Image payload of an image command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedImage {
    /// Original reference
    pub reference: String,

    /// Detected format
    pub format: ImageFormat,

    /// Encoded bytes
    #[serde(skip)]
    pub data: ImageData,

    /// Draw the placeholder if the backend cannot decode the data
    pub placeholder_on_missing: bool,
}

/// Split a flat command list into per-page slices (without the `BeginPage`).
pub fn split_pages(commands: &[RenderCommand]) -> Vec<(&RenderCommand, &[RenderCommand])> {
    let starts: Vec<usize> = commands
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_page_start())
        .map(|(i, _)| i)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(commands.len());
            (&commands[start], &commands[start + 1..end])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize) -> RenderCommand {
        RenderCommand::BeginPage {
            index,
            width: 100.0,
            height: 100.0,
        }
    }

    fn text(s: &str) -> RenderCommand {
        RenderCommand::Text {
            x: 0.0,
            y: 0.0,
            text: s.to_string(),
            style: TextStyle::regular(10.0),
            wrap_width: None,
        }
    }

    #[test]
    fn test_split_pages() {
        let commands = vec![page(0), text("a"), text("b"), page(1), page(2), text("c")];
        let pages = split_pages(&commands);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].1.len(), 2);
        assert!(pages[1].1.is_empty());
        assert_eq!(pages[2].1[0].text(), Some("c"));
    }

    #[test]
    fn test_split_pages_ignores_leading_commands() {
        let commands = vec![text("orphan"), page(0), text("a")];
        let pages = split_pages(&commands);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].1.len(), 1);
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_string(&text("hi")).unwrap();
        assert!(json.contains("\"op\":\"text\""));
        assert!(!json.contains("wrap_width"));
    }

    #[test]
    fn test_text_style_ascent() {
        assert!((TextStyle::bold(10.0).ascent() - 8.0).abs() < 1e-5);
    }
}
