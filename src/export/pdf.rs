//! PDF export backend built on lopdf.
//!
//! Text uses the standard Helvetica faces with WinAnsi encoding plus
//! ZapfDingbats for the checkmark glyph, so no font files are embedded.
//! Images are decoded once per distinct reference and content, converted to RGB and stored as
//! Flate-compressed image XObjects.

use super::{ExportFormat, ExportOptions, RenderBackend};
use crate::error::{Error, Result};
use crate::layout::{FontFace, HelveticaMetrics, TextMeasure};
use crate::model::Color;
use crate::render::{
    EmbeddedImage, RectStyle, RenderCommand, RenderedDocument, TextStyle, IMAGE_PLACEHOLDER_TEXT,
};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

/// Control-point distance for a quarter circle drawn with one cubic Bézier.
const KAPPA: f32 = 0.552_284_8;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const FONT_SYMBOL: &str = "F3";

/// ZapfDingbats code for the heavy checkmark (U+2714 / U+2713).
const DINGBAT_CHECK: u8 = 0x34;

/// PDF backend.
#[derive(Debug, Clone, Default)]
pub struct PdfBackend {
    _private: (),
}

impl PdfBackend {
    /// Create a new PDF backend.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl RenderBackend for PdfBackend {
    fn name(&self) -> &str {
        "pdf"
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, doc: &RenderedDocument, options: &ExportOptions) -> Result<Vec<u8>> {
        to_pdf(doc, options.compress)
    }
}

/// Decoded image ready to be written as an XObject.
struct PreparedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Identity of an embedded image: its reference plus its encoded bytes.
///
/// Two steps may share a reference but carry different data, so the
/// reference alone does not identify an XObject.
type ImageKey<'a> = (&'a str, &'a [u8]);

fn image_key(image: &EmbeddedImage) -> ImageKey<'_> {
    (image.reference.as_str(), &image.data.bytes[..])
}

/// An image XObject registered in the document.
#[derive(Clone, Copy)]
struct ImageObject {
    id: ObjectId,
    width: u32,
    height: u32,
}

/// Build PDF bytes for a rendered document.
pub fn to_pdf(doc: &RenderedDocument, compress: bool) -> Result<Vec<u8>> {
    let mut pdf = Document::with_version("1.5");
    let id_pages = pdf.new_object_id();

    let fonts = dictionary! {
        FONT_REGULAR => pdf.add_object(standard_font("Helvetica", true)),
        FONT_BOLD => pdf.add_object(standard_font("Helvetica-Bold", true)),
        FONT_SYMBOL => pdf.add_object(standard_font("ZapfDingbats", false)),
    };
    let id_fonts = pdf.add_object(fonts);

    let images = embed_images(&mut pdf, &doc.commands);
    let label_size = doc.plan.geometry.label_font_size;

    let mut kids: Vec<Object> = Vec::new();
    for (begin, commands) in doc.pages() {
        let (width, height) = match begin {
            RenderCommand::BeginPage { width, height, .. } => (*width, *height),
            _ => (doc.page_width(), doc.page_height()),
        };

        let mut page = PageWriter::new(height, label_size);
        for command in commands {
            page.command(command, &images);
        }

        let content = Content {
            operations: page.ops,
        };
        let encoded = content
            .encode()
            .map_err(|e| Error::Pdf(format!("content stream: {}", e)))?;
        let id_content = pdf.add_object(Stream::new(dictionary! {}, encoded));

        let mut resources = dictionary! {
            "Font" => id_fonts,
        };
        if !page.xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(page.xobjects));
        }
        let id_resources = pdf.add_object(resources);

        let id_page = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => id_pages,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), width.into(), height.into()],
            "Contents" => id_content,
            "Resources" => id_resources,
        });
        kids.push(id_page.into());
    }

    let page_count = kids.len() as i64;
    pdf.set_object(
        id_pages,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        },
    );

    let id_catalog = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => id_pages,
    });
    pdf.trailer.set("Root", id_catalog);

    let id_info = pdf.add_object(info_dictionary(doc));
    pdf.trailer.set("Info", id_info);

    if compress {
        pdf.compress();
    }

    let mut buffer = Vec::new();
    pdf.save_to(&mut buffer)
        .map_err(|e| Error::Pdf(format!("write failed: {}", e)))?;
    Ok(buffer)
}

fn standard_font(base: &str, win_ansi: bool) -> Dictionary {
    let mut font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
    };
    if win_ansi {
        font.set("Encoding", "WinAnsiEncoding");
    }
    font
}

fn info_dictionary(doc: &RenderedDocument) -> Dictionary {
    let meta = &doc.plan.metadata;
    let mut info = dictionary! {
        "Title" => text_string(&meta.title),
        "Producer" => text_string(concat!("sopdoc ", env!("CARGO_PKG_VERSION"))),
        "Subject" => text_string(&format!("Standard operating procedure, version {}", meta.version)),
    };
    if let Some(author) = &meta.author {
        info.set("Author", text_string(author));
    }
    if let Some(date) = meta.created_date {
        info.set("CreationDate", text_string(&date.format("D:%Y%m%d").to_string()));
    }
    info
}

fn text_string(text: &str) -> Object {
    Object::String(encode_win_ansi(text), StringFormat::Literal)
}

/// Decode every distinct image in parallel and add the successes as XObjects.
///
/// Images that fail to decode are left out; their commands fall back to a
/// placeholder.
fn embed_images<'a>(
    pdf: &mut Document,
    commands: &'a [RenderCommand],
) -> HashMap<ImageKey<'a>, ImageObject> {
    let mut seen = HashSet::new();
    let unique: Vec<&EmbeddedImage> = commands
        .iter()
        .filter_map(|c| match c {
            RenderCommand::Image { image, .. } => Some(image),
            _ => None,
        })
        .filter(|image| seen.insert(image_key(image)))
        .collect();

    let prepared: Vec<(&EmbeddedImage, Result<PreparedImage>)> = unique
        .par_iter()
        .map(|image| (*image, prepare_image(image)))
        .collect();

    let mut objects = HashMap::new();
    for (image, result) in prepared {
        match result {
            Ok(prepared) => {
                let stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => prepared.width as i64,
                        "Height" => prepared.height as i64,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => Object::Integer(8),
                        "Filter" => "FlateDecode",
                    },
                    prepared.data,
                )
                .with_compression(false);
                let id = pdf.add_object(stream);
                objects.insert(
                    image_key(image),
                    ImageObject {
                        id,
                        width: prepared.width,
                        height: prepared.height,
                    },
                );
            }
            Err(e) => {
                log::warn!("image '{}' could not be embedded: {}", image.reference, e);
            }
        }
    }
    objects
}

fn prepare_image(image: &EmbeddedImage) -> Result<PreparedImage> {
    let rgb = image::load_from_memory(&image.data.bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::ImageDecode("image has no pixels".into()));
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rgb.as_raw())?;
    let data = encoder.finish()?;

    Ok(PreparedImage {
        width,
        height,
        data,
    })
}

/// Accumulates the content stream and XObject references of one page.
struct PageWriter {
    page_height: f32,
    label_size: f32,
    ops: Vec<Operation>,
    xobjects: Dictionary,
}

impl PageWriter {
    fn new(page_height: f32, label_size: f32) -> Self {
        Self {
            page_height,
            label_size,
            ops: Vec::new(),
            xobjects: Dictionary::new(),
        }
    }

    /// Flip a top-down offset to PDF user space.
    fn flip(&self, y: f32) -> f32 {
        self.page_height - y
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    fn command(&mut self, command: &RenderCommand, images: &HashMap<ImageKey<'_>, ImageObject>) {
        match command {
            RenderCommand::BeginPage { .. } => {}
            RenderCommand::Rect { x, y, w, h, style } => self.rect(*x, *y, *w, *h, style),
            RenderCommand::Text { x, y, text, style, .. } => self.text(*x, *y, text, style),
            RenderCommand::Image { x, y, w, h, image } => {
                match images.get(&image_key(image)) {
                    Some(object) => self.image(*x, *y, *w, *h, *object),
                    None if image.placeholder_on_missing => self.placeholder(*x, *y, *w, *h),
                    None => {}
                }
            }
        }
    }

    fn set_fill(&mut self, color: Color) {
        self.op("rg", vec![color.r.into(), color.g.into(), color.b.into()]);
    }

    fn set_stroke(&mut self, color: Color) {
        self.op("RG", vec![color.r.into(), color.g.into(), color.b.into()]);
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, style: &RectStyle) {
        let paint = match (style.fill, style.stroke) {
            (Some(_), Some(_)) => "B",
            (Some(_), None) => "f",
            (None, Some(_)) => "S",
            (None, None) => return,
        };

        self.op("q", vec![]);
        if let Some(fill) = style.fill {
            self.set_fill(fill);
        }
        if let Some(stroke) = style.stroke {
            self.set_stroke(stroke);
            self.op("w", vec![style.line_width.into()]);
        }

        let bottom = self.flip(y + h);
        if style.radius > 0.0 {
            self.rounded_path(x, bottom, w, h, style.radius);
        } else {
            self.op("re", vec![x.into(), bottom.into(), w.into(), h.into()]);
        }

        self.op(paint, vec![]);
        self.op("Q", vec![]);
    }

    /// Rounded rectangle path; a square with `radius = side / 2` is a circle.
    fn rounded_path(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32) {
        let r = radius.min(w / 2.0).min(h / 2.0);
        let k = r * KAPPA;
        let (x0, y0, x1, y1) = (x, y, x + w, y + h);

        self.op("m", vec![(x0 + r).into(), y0.into()]);
        self.op("l", vec![(x1 - r).into(), y0.into()]);
        self.curve((x1 - r + k, y0), (x1, y0 + r - k), (x1, y0 + r));
        self.op("l", vec![x1.into(), (y1 - r).into()]);
        self.curve((x1, y1 - r + k), (x1 - r + k, y1), (x1 - r, y1));
        self.op("l", vec![(x0 + r).into(), y1.into()]);
        self.curve((x0 + r - k, y1), (x0, y1 - r + k), (x0, y1 - r));
        self.op("l", vec![x0.into(), (y0 + r).into()]);
        self.curve((x0, y0 + r - k), (x0 + r - k, y0), (x0 + r, y0));
        self.op("h", vec![]);
    }

    fn curve(&mut self, c1: (f32, f32), c2: (f32, f32), end: (f32, f32)) {
        self.op(
            "c",
            vec![
                c1.0.into(),
                c1.1.into(),
                c2.0.into(),
                c2.1.into(),
                end.0.into(),
                end.1.into(),
            ],
        );
    }

    fn text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle) {
        let (font, bytes) = match style.font {
            FontFace::Regular => (FONT_REGULAR, encode_win_ansi(text)),
            FontFace::Bold => (FONT_BOLD, encode_win_ansi(text)),
            FontFace::Symbol => (FONT_SYMBOL, encode_dingbats(text)),
        };
        let baseline = self.flip(y + style.ascent());

        self.op("BT", vec![]);
        self.op("Tf", vec![font.into(), style.size.into()]);
        self.set_fill(style.color);
        self.op("Td", vec![x.into(), baseline.into()]);
        self.op("Tj", vec![Object::String(bytes, StringFormat::Literal)]);
        self.op("ET", vec![]);
    }

    fn image(&mut self, x: f32, y: f32, w: f32, h: f32, object: ImageObject) {
        // Fit inside the box keeping the aspect ratio, centered.
        let scale = (w / object.width as f32).min(h / object.height as f32);
        let (dw, dh) = (object.width as f32 * scale, object.height as f32 * scale);
        let dx = x + (w - dw) / 2.0;
        let dy = y + (h - dh) / 2.0;

        let bottom = self.flip(dy + dh);

        let name = format!("Im{}", object.id.0);
        self.xobjects.set(name.as_bytes().to_vec(), object.id);

        self.op("q", vec![]);
        self.op(
            "cm",
            vec![
                dw.into(),
                Object::Integer(0),
                Object::Integer(0),
                dh.into(),
                dx.into(),
                bottom.into(),
            ],
        );
        self.op("Do", vec![Object::Name(name.into_bytes())]);
        self.op("Q", vec![]);
    }

    fn placeholder(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.rect(
            x,
            y,
            w,
            h,
            &RectStyle::filled_stroked(Color::PLACEHOLDER_FILL, Color::MUTED, 0.6),
        );
        let style = TextStyle::regular(self.label_size).with_color(Color::MUTED);
        let text_width = HelveticaMetrics.text_width(IMAGE_PLACEHOLDER_TEXT, style.font, style.size);
        let tx = x + ((w - text_width) / 2.0).max(0.0);
        let ty = y + ((h - style.size) / 2.0).max(0.0);
        self.text(tx, ty, IMAGE_PLACEHOLDER_TEXT, &style);
    }
}

/// Encode text for a WinAnsiEncoding font; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u8,
            '\u{20ac}' => 0x80,
            '\u{201a}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201e}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02c6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8a,
            '\u{2039}' => 0x8b,
            '\u{0152}' => 0x8c,
            '\u{017d}' => 0x8e,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02dc}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9a,
            '\u{203a}' => 0x9b,
            '\u{0153}' => 0x9c,
            '\u{017e}' => 0x9e,
            '\u{0178}' => 0x9f,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

fn encode_dingbats(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2713}' | '\u{2714}' => DINGBAT_CHECK,
            ' ' => b' ',
            _ => DINGBAT_CHECK,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan, PageGeometry};
    use crate::model::{ImageRef, Sop, StepRecord};
    use crate::render::render;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn image_objects(bytes: &[u8]) -> usize {
        let parsed = Document::load_mem(bytes).unwrap();
        parsed
            .objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Image")
                    .unwrap_or(false),
                _ => false,
            })
            .count()
    }

    /// Every string drawn with `Tj`, across all pages.
    fn shown_strings(bytes: &[u8]) -> Vec<Vec<u8>> {
        let parsed = Document::load_mem(bytes).unwrap();
        let mut strings = Vec::new();
        for (_, page_id) in parsed.get_pages() {
            let content = Content::decode(&parsed.get_page_content(page_id).unwrap()).unwrap();
            for operation in content.operations {
                if operation.operator == "Tj" {
                    if let Some(Object::String(text, _)) = operation.operands.first() {
                        strings.push(text.clone());
                    }
                }
            }
        }
        strings
    }

    fn rendered(sop: &Sop) -> RenderedDocument {
        render(plan(sop, &PageGeometry::default()).unwrap())
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Abc"), b"Abc".to_vec());
        assert_eq!(encode_win_ansi("é"), vec![0xe9]);
        assert_eq!(encode_win_ansi("\u{2019}\u{2013}\u{20ac}"), vec![0x92, 0x96, 0x80]);
        assert_eq!(encode_win_ansi("日"), b"?".to_vec());
    }

    #[test]
    fn test_encode_dingbats() {
        assert_eq!(encode_dingbats("\u{2713}"), vec![DINGBAT_CHECK]);
    }

    #[test]
    fn test_pdf_header_and_pages() {
        let steps: Vec<_> = (0..60)
            .map(|i| StepRecord::new(format!("Step {}", i)).with_description("one\ntwo\nthree"))
            .collect();
        let mut sop = Sop::new("Long procedure");
        sop.steps = steps;

        let doc = rendered(&sop);
        let bytes = to_pdf(&doc, false).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let parsed = Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), doc.plan.page_count());
    }

    #[test]
    fn test_pdf_embeds_decodable_image() {
        let sop = Sop::new("Photo")
            .with_step(StepRecord::new("Look").with_image(ImageRef::resolved("a.png", tiny_png())));
        let bytes = to_pdf(&rendered(&sop), false).unwrap();
        assert_eq!(image_objects(&bytes), 1);
        assert!(!shown_strings(&bytes).contains(&IMAGE_PLACEHOLDER_TEXT.as_bytes().to_vec()));
    }

    #[test]
    fn test_pdf_shared_image_embedded_once() {
        let png = tiny_png();
        let sop = Sop::new("Photo")
            .with_step(StepRecord::new("a").with_image(ImageRef::resolved("same.png", png.clone())))
            .with_step(StepRecord::new("b").with_image(ImageRef::resolved("same.png", png)));
        let bytes = to_pdf(&rendered(&sop), true).unwrap();
        assert_eq!(image_objects(&bytes), 1);
    }

    #[test]
    fn test_pdf_same_reference_different_bytes_embeds_both() {
        let red = tiny_png();
        let blue = {
            let img = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 10, 200]));
            let mut bytes = Vec::new();
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
                .unwrap();
            bytes
        };
        assert_ne!(red, blue);

        let sop = Sop::new("Photo")
            .with_step(StepRecord::new("a").with_image(ImageRef::resolved("photo.png", red)))
            .with_step(StepRecord::new("b").with_image(ImageRef::resolved("photo.png", blue)));
        let bytes = to_pdf(&rendered(&sop), true).unwrap();
        assert_eq!(image_objects(&bytes), 2);
    }

    #[test]
    fn test_pdf_undecodable_image_becomes_placeholder() {
        // Valid PNG signature, garbage body: passes detection, fails decoding.
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(b"garbage");
        let sop = Sop::new("Photo")
            .with_step(StepRecord::new("Look").with_image(ImageRef::resolved("a.png", bytes)))
            .with_step(StepRecord::new("Next"));

        let pdf = to_pdf(&rendered(&sop), false).unwrap();
        assert_eq!(image_objects(&pdf), 0);
        let strings = shown_strings(&pdf);
        assert!(strings.contains(&IMAGE_PLACEHOLDER_TEXT.as_bytes().to_vec()));
        assert!(strings.contains(&b"Next".to_vec()));
    }

    #[test]
    fn test_compressed_output_loads() {
        let sop = Sop::new("Small").with_step(StepRecord::new("Only step"));
        let bytes = to_pdf(&rendered(&sop), true).unwrap();
        assert!(Document::load_mem(&bytes).is_ok());
    }
}
