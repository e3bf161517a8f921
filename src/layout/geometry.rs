//! Page geometry configuration.
//!
//! All measurements are in PDF points (1/72 inch), with `y` growing
//! downwards from the top edge of the page.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Page size, fixed block heights, table columns and text metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page width
    pub page_width: f32,

    /// Page height
    pub page_height: f32,

    /// Margin on all four sides
    pub margin: f32,

    /// Title bar height
    pub title_height: f32,

    /// Metadata grid height
    pub meta_height: f32,

    /// Symbol legend strip height
    pub legend_height: f32,

    /// Table column header height
    pub table_header_height: f32,

    /// Footer strip height
    pub footer_height: f32,

    /// Step number column width
    pub number_column: f32,

    /// Image column width
    pub image_column: f32,

    /// Symbol column width
    pub symbol_column: f32,

    /// Reason column width
    pub reason_column: f32,

    /// Minimum row height
    pub base_row_height: f32,

    /// Height of one line of body text
    pub line_height: f32,

    /// Inner cell padding
    pub padding: f32,

    /// Reserved image block width
    pub image_width: f32,

    /// Reserved image block height
    pub image_height: f32,

    /// Body text size
    pub font_size: f32,

    /// Step title text size
    pub step_title_font_size: f32,

    /// Document title text size
    pub title_font_size: f32,

    /// Small label text size
    pub label_font_size: f32,

    /// Symbol glyph size
    pub symbol_size: f32,
}

/// Horizontal extent of one table column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Left edge
    pub x: f32,
    /// Width
    pub width: f32,
}

impl Span {
    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Table columns, left to right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Columns {
    pub number: Span,
    pub description: Span,
    pub image: Span,
    pub symbol: Span,
    pub reason: Span,
}

impl Columns {
    /// Columns in drawing order.
    pub fn all(&self) -> [Span; 5] {
        [
            self.number,
            self.description,
            self.image,
            self.symbol,
            self.reason,
        ]
    }
}

impl PageGeometry {
    /// Create geometry with defaults (A4 landscape).
    pub fn new() -> Self {
        Self::default()
    }

    /// A4 landscape (842 x 595 pt).
    pub fn a4_landscape() -> Self {
        Self::default()
    }

    /// A4 portrait (595 x 842 pt) with narrower fixed columns.
    pub fn a4_portrait() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            number_column: 24.0,
            image_column: 120.0,
            symbol_column: 40.0,
            reason_column: 120.0,
            image_width: 110.0,
            image_height: 80.0,
            ..Self::default()
        }
    }

    /// US Letter landscape (792 x 612 pt).
    pub fn letter_landscape() -> Self {
        Self {
            page_width: 792.0,
            page_height: 612.0,
            reason_column: 150.0,
            ..Self::default()
        }
    }

    /// Set the page size.
    pub fn with_page_size(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Set the margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Set the fixed column widths (description takes the remainder).
    pub fn with_columns(mut self, number: f32, image: f32, symbol: f32, reason: f32) -> Self {
        self.number_column = number;
        self.image_column = image;
        self.symbol_column = symbol;
        self.reason_column = reason;
        self
    }

    /// Set the reserved image block.
    pub fn with_image_block(mut self, width: f32, height: f32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set body text size and line height.
    pub fn with_text(mut self, font_size: f32, line_height: f32) -> Self {
        self.font_size = font_size;
        self.line_height = line_height;
        self
    }

    /// Set the minimum row height.
    pub fn with_base_row_height(mut self, height: f32) -> Self {
        self.base_row_height = height;
        self
    }

    /// Set the inner cell padding.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Width between the side margins.
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Height of the block repeated at the top of every page.
    pub fn header_height(&self) -> f32 {
        self.title_height + self.meta_height + self.legend_height + self.table_header_height
    }

    /// Where the first row of every page starts.
    pub fn content_top(&self) -> f32 {
        self.margin + self.header_height()
    }

    /// Lowest y a row may reach.
    pub fn usable_bottom(&self) -> f32 {
        self.page_height - self.margin - self.footer_height
    }

    /// Vertical space available to rows on one page.
    pub fn usable_height(&self) -> f32 {
        self.usable_bottom() - self.content_top()
    }

    /// Width of the description column.
    pub fn description_width(&self) -> f32 {
        self.content_width()
            - self.number_column
            - self.image_column
            - self.symbol_column
            - self.reason_column
    }

    /// Wrap width for step titles and key points.
    pub fn description_text_width(&self) -> f32 {
        self.description_width() - 2.0 * self.padding
    }

    /// Wrap width for reason text.
    pub fn reason_text_width(&self) -> f32 {
        self.reason_column - 2.0 * self.padding
    }

    /// Image block size, clamped to the image column.
    pub fn image_block(&self) -> (f32, f32) {
        let max_width = (self.image_column - 2.0 * self.padding).max(0.0);
        (self.image_width.min(max_width), self.image_height)
    }

    /// Column spans, left to right.
    pub fn columns(&self) -> Columns {
        let mut x = self.margin;
        let mut next = |width: f32| {
            let span = Span { x, width };
            x += width;
            span
        };

        Columns {
            number: next(self.number_column),
            description: next(self.description_width()),
            image: next(self.image_column),
            symbol: next(self.symbol_column),
            reason: next(self.reason_column),
        }
    }

    /// Check that the geometry leaves room for content.
    pub fn validate(&self) -> Result<()> {
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(Error::InvalidGeometry("page size must be positive".into()));
        }
        if self.font_size <= 0.0 || self.line_height <= 0.0 {
            return Err(Error::InvalidGeometry(
                "font size and line height must be positive".into(),
            ));
        }
        if self.description_text_width() <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "fixed columns leave {:.1}pt for descriptions",
                self.description_width()
            )));
        }
        if self.reason_text_width() <= 0.0 {
            return Err(Error::InvalidGeometry("reason column is too narrow".into()));
        }
        if self.usable_height() < self.base_row_height {
            return Err(Error::InvalidGeometry(format!(
                "only {:.1}pt of row space per page",
                self.usable_height()
            )));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 842.0,
            page_height: 595.0,
            margin: 24.0,
            title_height: 26.0,
            meta_height: 30.0,
            legend_height: 16.0,
            table_header_height: 18.0,
            footer_height: 16.0,
            number_column: 28.0,
            image_column: 150.0,
            symbol_column: 46.0,
            reason_column: 170.0,
            base_row_height: 36.0,
            line_height: 11.0,
            padding: 5.0,
            image_width: 140.0,
            image_height: 96.0,
            font_size: 8.5,
            step_title_font_size: 9.5,
            title_font_size: 14.0,
            label_font_size: 6.5,
            symbol_size: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let g = PageGeometry::default();
        assert_eq!(g.content_width(), 794.0);
        assert_eq!(g.content_top(), 114.0);
        assert_eq!(g.usable_bottom(), 555.0);
        assert_eq!(g.description_width(), 400.0);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_columns_tile_content_width() {
        let g = PageGeometry::a4_portrait();
        let cols = g.columns();
        assert_eq!(cols.number.x, g.margin);
        assert_eq!(cols.reason.right(), g.page_width - g.margin);
        for pair in cols.all().windows(2) {
            assert_eq!(pair[0].right(), pair[1].x);
        }
    }

    #[test]
    fn test_image_block_clamped() {
        let g = PageGeometry::default().with_image_block(400.0, 50.0);
        assert_eq!(g.image_block(), (140.0, 50.0));
    }

    #[test]
    fn test_validate_rejects_crowded_columns() {
        let g = PageGeometry::default().with_columns(200.0, 300.0, 100.0, 200.0);
        assert!(matches!(g.validate(), Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn test_validate_rejects_short_page() {
        let g = PageGeometry::default().with_page_size(842.0, 150.0);
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let g: PageGeometry = serde_json::from_str(r#"{"margin": 36.0}"#).unwrap();
        assert_eq!(g.margin, 36.0);
        assert_eq!(g.page_width, 842.0);
    }
}
