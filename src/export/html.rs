//! Print-ready HTML export.
//!
//! Each page becomes an absolutely positioned `<section>` sized in points,
//! so the browser's print dialog reproduces the PDF layout.

use super::{ExportFormat, ExportOptions, RenderBackend};
use crate::error::Result;
use crate::layout::FontFace;
use crate::model::Color;
use crate::render::{EmbeddedImage, RectStyle, RenderCommand, RenderedDocument, TextStyle};
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use std::fmt::Write;

/// Print markup backend.
#[derive(Debug, Clone, Default)]
pub struct HtmlBackend {
    _private: (),
}

impl HtmlBackend {
    /// Create a new HTML backend.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl RenderBackend for HtmlBackend {
    fn name(&self) -> &str {
        "html"
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(&self, doc: &RenderedDocument, _options: &ExportOptions) -> Result<Vec<u8>> {
        Ok(to_html(doc).into_bytes())
    }
}

/// Convert a rendered document to a standalone HTML page.
pub fn to_html(doc: &RenderedDocument) -> String {
    let (width, height) = (doc.page_width(), doc.page_height());
    let mut out = String::with_capacity(doc.commands.len() * 96);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_html(doc.title()));
    out.push_str("<style>\n");
    let _ = writeln!(out, "@page {{ size: {}pt {}pt; margin: 0; }}", fmt(width), fmt(height));
    out.push_str("html, body { margin: 0; padding: 0; background: #777; }\n");
    out.push_str("body { font-family: Helvetica, Arial, sans-serif; }\n");
    let _ = writeln!(
        out,
        ".page {{ position: relative; overflow: hidden; background: #fff; width: {}pt; height: {}pt; margin: 12pt auto; page-break-after: always; break-after: page; }}",
        fmt(width),
        fmt(height)
    );
    out.push_str(".page:last-child { page-break-after: auto; break-after: auto; }\n");
    out.push_str(".page > * { position: absolute; box-sizing: border-box; }\n");
    out.push_str(".t { white-space: pre; line-height: 1; }\n");
    out.push_str(".t.w { overflow: hidden; text-overflow: ellipsis; }\n");
    out.push_str("img { object-fit: contain; }\n");
    out.push_str("@media print { body { background: none; } .page { margin: 0; } }\n");
    out.push_str("</style>\n</head>\n<body>\n");

    for (begin, commands) in doc.pages() {
        if let RenderCommand::BeginPage { index, .. } = begin {
            let _ = writeln!(out, "<section class=\"page\" data-page=\"{}\">", index + 1);
        }
        for command in commands {
            write_command(&mut out, command);
        }
        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn write_command(out: &mut String, command: &RenderCommand) {
    match command {
        RenderCommand::BeginPage { .. } => {}
        RenderCommand::Rect { x, y, w, h, style } => write_rect(out, *x, *y, *w, *h, style),
        RenderCommand::Text {
            x,
            y,
            text,
            style,
            wrap_width,
        } => write_text(out, *x, *y, text, style, *wrap_width),
        RenderCommand::Image { x, y, w, h, image } => write_image(out, *x, *y, *w, *h, image),
    }
}

fn write_rect(out: &mut String, x: f32, y: f32, w: f32, h: f32, style: &RectStyle) {
    let mut css = position(x, y, Some(w), Some(h));
    if let Some(fill) = style.fill {
        let _ = write!(css, "background:{};", fill.to_hex());
    }
    if let Some(stroke) = style.stroke {
        let _ = write!(css, "border:{}pt solid {};", fmt(style.line_width), stroke.to_hex());
    }
    if style.radius > 0.0 {
        let _ = write!(css, "border-radius:{}pt;", fmt(style.radius));
    }
    let _ = writeln!(out, "<div style=\"{}\"></div>", css);
}

fn write_text(
    out: &mut String,
    x: f32,
    y: f32,
    text: &str,
    style: &TextStyle,
    wrap_width: Option<f32>,
) {
    let mut css = position(x, y, wrap_width, None);
    let _ = write!(css, "font-size:{}pt;", fmt(style.size));
    if style.font == FontFace::Bold {
        css.push_str("font-weight:bold;");
    }
    if style.color != Color::BLACK {
        let _ = write!(css, "color:{};", style.color.to_hex());
    }
    let class = if wrap_width.is_some() { "t w" } else { "t" };
    let _ = writeln!(
        out,
        "<div class=\"{}\" style=\"{}\">{}</div>",
        class,
        css,
        escape_html(text)
    );
}

fn write_image(out: &mut String, x: f32, y: f32, w: f32, h: f32, image: &EmbeddedImage) {
    let css = position(x, y, Some(w), Some(h));
    let _ = writeln!(
        out,
        "<img style=\"{}\" alt=\"{}\" src=\"data:{};base64,{}\">",
        css,
        escape_html(&image.reference),
        image.data.mime_type(),
        B64.encode(&image.data.bytes)
    );
}

fn position(x: f32, y: f32, w: Option<f32>, h: Option<f32>) -> String {
    let mut css = format!("left:{}pt;top:{}pt;", fmt(x), fmt(y));
    if let Some(w) = w {
        let _ = write!(css, "width:{}pt;", fmt(w));
    }
    if let Some(h) = h {
        let _ = write!(css, "height:{}pt;", fmt(h));
    }
    css
}

/// Format a coordinate with at most two decimals and no trailing zeros.
fn fmt(value: f32) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan, PageGeometry};
    use crate::model::{ImageRef, Sop, StepRecord};
    use crate::render::{render, IMAGE_PLACEHOLDER_TEXT};

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn html_for(sop: &Sop) -> String {
        to_html(&render(plan(sop, &PageGeometry::default()).unwrap()))
    }

    #[test]
    fn test_fmt() {
        assert_eq!(fmt(12.0), "12");
        assert_eq!(fmt(12.5), "12.5");
        assert_eq!(fmt(0.333), "0.33");
        assert_eq!(fmt(-0.001), "0");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_html_structure() {
        let sop = Sop::new("Belt <inspection>").with_step(StepRecord::new("Stop line"));
        let html = html_for(&sop);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("@page { size: 842pt 595pt; margin: 0; }"));
        assert!(html.contains("<title>Belt &lt;inspection&gt;</title>"));
        assert_eq!(html.matches("<section class=\"page\"").count(), 1);
        assert!(html.contains("Page 1 of 1"));
    }

    #[test]
    fn test_html_embeds_images_as_data_uri() {
        let sop = Sop::new("Photo").with_step(
            StepRecord::new("Look").with_image(ImageRef::resolved("a.png", PNG_HEADER.to_vec())),
        );
        let html = html_for(&sop);
        assert!(html.contains("src=\"data:image/png;base64,iVBORw0KGgo=\""));
        assert!(!html.contains(IMAGE_PLACEHOLDER_TEXT));
    }

    #[test]
    fn test_html_placeholder_for_failed_image() {
        let sop = Sop::new("Photo")
            .with_step(StepRecord::new("Look").with_image(ImageRef::failed("a.png", "timeout")));
        let html = html_for(&sop);
        assert!(html.contains(IMAGE_PLACEHOLDER_TEXT));
        assert!(!html.contains("<img"));
    }
}
