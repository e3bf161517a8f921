//! Translation of a document plan into drawing commands.

use super::command::{
    EmbeddedImage, RectStyle, RenderCommand, TextStyle, IMAGE_PLACEHOLDER_TEXT,
};
use super::RenderStats;
use crate::layout::{
    wrap_text, DocumentPlan, FontFace, HelveticaMetrics, PageGeometry, PageLayout, RowPlacement,
    TextMeasure,
};
use crate::model::{Color, Glyph, ImageState, StepRecord, SymbolType};

const GRID_LINE: f32 = 0.6;
const TABLE_HEADERS: [&str; 5] = ["No.", "Step / Key points", "Image", "Symbol", "Reason why"];

/// Emit the commands for a plan using Helvetica metrics.
pub fn emit(plan: &DocumentPlan) -> Vec<RenderCommand> {
    Emitter::new(plan).emit()
}

/// Walks a plan page by page and records drawing commands.
pub struct Emitter<'a, M: TextMeasure = HelveticaMetrics> {
    plan: &'a DocumentPlan,
    measure: M,
    commands: Vec<RenderCommand>,
    stats: RenderStats,
}

impl<'a> Emitter<'a, HelveticaMetrics> {
    /// Create an emitter using Helvetica metrics.
    pub fn new(plan: &'a DocumentPlan) -> Self {
        Self::with_measure(plan, HelveticaMetrics)
    }
}

impl<'a, M: TextMeasure> Emitter<'a, M> {
    /// Create an emitter with custom text metrics.
    pub fn with_measure(plan: &'a DocumentPlan, measure: M) -> Self {
        Self {
            plan,
            measure,
            commands: Vec::new(),
            stats: RenderStats::new(),
        }
    }

    /// Emit all pages.
    pub fn emit(self) -> Vec<RenderCommand> {
        self.emit_with_stats().0
    }

    /// Emit all pages and report what was drawn.
    pub fn emit_with_stats(mut self) -> (Vec<RenderCommand>, RenderStats) {
        let page_count = self.plan.page_count();
        self.stats.step_count = self.plan.step_count() as u32;

        for page in &self.plan.pages {
            self.emit_page(page, page_count);
        }

        self.stats.command_count = self.commands.len() as u32;
        (self.commands, self.stats)
    }

    fn geometry(&self) -> &'a PageGeometry {
        &self.plan.geometry
    }

    fn emit_page(&mut self, page: &PageLayout, page_count: usize) {
        let g = self.geometry();
        self.stats.add_page();
        self.commands.push(RenderCommand::BeginPage {
            index: page.page_index,
            width: g.page_width,
            height: g.page_height,
        });

        self.emit_title_bar();
        self.emit_metadata_grid();
        self.emit_legend();
        self.emit_table_header();

        for row in &page.rows {
            if let Some(step) = self.plan.step(row) {
                self.emit_row(row, step);
            }
        }

        self.emit_footer(page.page_index, page_count);
    }

    fn emit_title_bar(&mut self) {
        let g = self.geometry();
        let (x, y, w, h) = (g.margin, g.margin, g.content_width(), g.title_height);
        self.rect(
            x,
            y,
            w,
            h,
            RectStyle::filled_stroked(Color::HEADER_FILL, Color::GRID, GRID_LINE),
        );

        let label = "STANDARD OPERATING PROCEDURE";
        let label_style = TextStyle::bold(g.label_font_size).with_color(Color::MUTED);
        let label_width = self.width(label, &label_style);
        self.text(
            x + w - g.padding - label_width,
            y + (h - g.label_font_size) / 2.0,
            label.to_string(),
            label_style,
            None,
        );

        let style = TextStyle::bold(g.title_font_size);
        let max_width = w - 3.0 * g.padding - label_width;
        let title = self.fit_line(&self.plan.metadata.title, max_width, &style);
        self.text(
            x + g.padding,
            y + (h - g.title_font_size) / 2.0,
            title,
            style,
            Some(max_width),
        );
    }

    fn emit_metadata_grid(&mut self) {
        let g = self.geometry();
        let fields = self.plan.metadata.display_fields();
        let y = g.margin + g.title_height;
        let cell_width = g.content_width() / fields.len() as f32;
        let label_style = TextStyle::regular(g.label_font_size).with_color(Color::MUTED);
        let value_style = TextStyle::regular(g.font_size);

        for (i, (label, value)) in fields.into_iter().enumerate() {
            let x = g.margin + i as f32 * cell_width;
            self.rect(x, y, cell_width, g.meta_height, RectStyle::stroked(Color::GRID, GRID_LINE));
            self.text(x + g.padding, y + g.padding / 2.0, label.to_string(), label_style, None);

            if !value.is_empty() {
                let max_width = cell_width - 2.0 * g.padding;
                let value = self.fit_line(&value, max_width, &value_style);
                self.text(
                    x + g.padding,
                    y + g.padding / 2.0 + g.label_font_size + 4.0,
                    value,
                    value_style,
                    Some(max_width),
                );
            }
        }
    }

    fn emit_legend(&mut self) {
        let g = self.geometry();
        let y = g.margin + g.title_height + g.meta_height;
        let glyph_size = (g.legend_height * 0.6).min(g.symbol_size);
        let glyph_y = y + (g.legend_height - glyph_size) / 2.0;
        let text_y = y + (g.legend_height - g.label_font_size) / 2.0;

        let heading_style = TextStyle::bold(g.label_font_size);
        let label_style = TextStyle::regular(g.label_font_size);

        let mut x = g.margin + g.padding;
        self.text(x, text_y, "Legend:".to_string(), heading_style, None);
        x += self.width("Legend:", &heading_style) + 8.0;

        for symbol in SymbolType::ALL {
            self.glyph(symbol.glyph(), x, glyph_y, glyph_size);
            x += glyph_size + 3.0;
            self.text(x, text_y, symbol.label().to_string(), label_style, None);
            x += self.width(symbol.label(), &label_style) + 12.0;
        }
    }

    fn emit_table_header(&mut self) {
        let g = self.geometry();
        let y = g.margin + g.title_height + g.meta_height + g.legend_height;
        let style = TextStyle::bold(g.font_size);

        for (span, label) in g.columns().all().iter().zip(TABLE_HEADERS) {
            self.rect(
                span.x,
                y,
                span.width,
                g.table_header_height,
                RectStyle::filled_stroked(Color::HEADER_FILL, Color::GRID, GRID_LINE),
            );
            let max_width = span.width - 2.0 * g.padding;
            let label = self.fit_line(label, max_width, &style);
            self.text(
                span.x + g.padding,
                y + (g.table_header_height - g.font_size) / 2.0,
                label,
                style,
                Some(max_width),
            );
        }
    }

    fn emit_row(&mut self, row: &RowPlacement, step: &StepRecord) {
        let g = self.geometry();
        let cols = g.columns();
        let top = row.top;

        for span in cols.all() {
            self.rect(span.x, top, span.width, row.height, RectStyle::stroked(Color::GRID, GRID_LINE));
        }

        self.text(
            cols.number.x + g.padding,
            top + g.padding,
            (row.step_index + 1).to_string(),
            TextStyle::bold(g.step_title_font_size),
            None,
        );

        // Description column: bold title lines, then numbered key points.
        let text_x = cols.description.x + g.padding;
        let mut line_y = top + g.padding;
        for line in &row.lines.title {
            self.text(text_x, line_y, line.clone(), TextStyle::bold(g.step_title_font_size), None);
            line_y += g.line_height;
        }
        let point_style = if row.lines.placeholder {
            TextStyle::regular(g.font_size).with_color(Color::MUTED)
        } else {
            TextStyle::regular(g.font_size)
        };
        for line in row.lines.key_points.iter().flatten() {
            self.text(text_x, line_y, line.clone(), point_style, None);
            line_y += g.line_height;
        }

        self.emit_row_image(row, step);

        let glyph_x = cols.symbol.x + (cols.symbol.width - g.symbol_size) / 2.0;
        self.glyph(row.symbol.glyph, glyph_x, top + g.padding, g.symbol_size);

        let mut reason_y = top + g.padding;
        for line in &row.lines.reason {
            self.text(
                cols.reason.x + g.padding,
                reason_y,
                line.clone(),
                TextStyle::regular(g.font_size),
                None,
            );
            reason_y += g.line_height;
        }
    }

    fn emit_row_image(&mut self, row: &RowPlacement, step: &StepRecord) {
        let g = self.geometry();
        let column = g.columns().image;
        let (w, block_h) = g.image_block();
        let x = column.x + (column.width - w) / 2.0;
        let y = row.top + g.padding;

        let Some(image) = &step.image else {
            // No reference: the row reserved no image block, so shrink to fit.
            self.stats.add_missing_image();
            let h = block_h.min(row.height - 2.0 * g.padding);
            self.placeholder(x, y, w, h);
            return;
        };

        match &image.state {
            ImageState::Resolved(data) => {
                self.stats.add_embedded_image();
                self.commands.push(RenderCommand::Image {
                    x,
                    y,
                    w,
                    h: block_h,
                    image: EmbeddedImage {
                        reference: image.source.clone(),
                        format: data.format,
                        data: data.clone(),
                        placeholder_on_missing: true,
                    },
                });
            }
            ImageState::Failed(reason) => {
                log::warn!(
                    "step {}: image '{}' unavailable ({}); drawing placeholder",
                    row.step_index + 1,
                    image.source,
                    reason
                );
                self.stats.add_failed_image();
                self.placeholder(x, y, w, block_h);
            }
            ImageState::Unresolved => {
                log::warn!(
                    "step {}: image '{}' was never resolved; drawing placeholder",
                    row.step_index + 1,
                    image.source
                );
                self.stats.add_failed_image();
                self.placeholder(x, y, w, block_h);
            }
        }
    }

    fn emit_footer(&mut self, page_index: usize, page_count: usize) {
        let g = self.geometry();
        let style = TextStyle::regular(g.label_font_size).with_color(Color::MUTED);
        let y = g.page_height - g.margin - g.footer_height
            + (g.footer_height - g.label_font_size) / 2.0;

        let page_label = format!("Page {} of {}", page_index + 1, page_count);
        let page_width = self.width(&page_label, &style);
        let right = g.page_width - g.margin;

        let meta = &self.plan.metadata;
        let left_width = g.content_width() - page_width - g.padding;
        let left = self.fit_line(&format!("{} - v{}", meta.title, meta.version), left_width, &style);

        self.text(g.margin, y, left, style, Some(left_width));
        self.text(right - page_width, y, page_label, style, None);
    }

    fn placeholder(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let g = self.geometry();
        self.rect(
            x,
            y,
            w,
            h,
            RectStyle::filled_stroked(Color::PLACEHOLDER_FILL, Color::MUTED, GRID_LINE),
        );

        let style = TextStyle::regular(g.label_font_size).with_color(Color::MUTED);
        let text_width = self.width(IMAGE_PLACEHOLDER_TEXT, &style);
        let text_x = x + ((w - text_width) / 2.0).max(0.0);
        let text_y = y + ((h - g.label_font_size) / 2.0).max(0.0);
        let wrap = if text_width > w { Some(w) } else { None };
        self.text(text_x, text_y, IMAGE_PLACEHOLDER_TEXT.to_string(), style, wrap);
    }

    fn glyph(&mut self, glyph: Glyph, x: f32, y: f32, size: f32) {
        match glyph {
            Glyph::FilledCircle(color) => {
                self.rect(x, y, size, size, RectStyle::filled(color).with_radius(size / 2.0));
            }
            Glyph::Checkmark(color) => {
                let style = TextStyle {
                    font: FontFace::Symbol,
                    size,
                    color,
                };
                self.text(x, y, "\u{2713}".to_string(), style, None);
            }
            Glyph::SquarePlus(color) => {
                self.rect(x, y, size, size, RectStyle::filled(color));
                let style = TextStyle::bold(size).with_color(Color::WHITE);
                let plus_width = self.width("+", &style);
                // Helvetica's plus sits low in the em box; lift it slightly.
                self.text(x + (size - plus_width) / 2.0, y - size * 0.05, "+".to_string(), style, None);
            }
        }
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, style: RectStyle) {
        self.commands.push(RenderCommand::Rect { x, y, w, h, style });
    }

    fn text(&mut self, x: f32, y: f32, text: String, style: TextStyle, wrap_width: Option<f32>) {
        if text.is_empty() {
            return;
        }
        self.commands.push(RenderCommand::Text {
            x,
            y,
            text,
            style,
            wrap_width,
        });
    }

    fn width(&self, text: &str, style: &TextStyle) -> f32 {
        self.measure.text_width(text, style.font, style.size)
    }

    /// First wrapped line of `text`, with "..." when the rest is cut.
    ///
    /// A word wider than `max_width` is cut by characters, so the result
    /// never exceeds `max_width` unless even "..." alone does.
    fn fit_line(&self, text: &str, max_width: f32, style: &TextStyle) -> String {
        let lines = wrap_text(text, max_width, &self.measure, style.font, style.size);
        let Some(first) = lines.first() else {
            return String::new();
        };
        if lines.len() == 1 && self.width(first, style) <= max_width {
            return first.clone();
        }

        let mut line = first.clone();
        while !line.is_empty() && self.width(&format!("{}...", line), style) > max_width {
            match line.rfind(' ') {
                Some(pos) => line.truncate(pos),
                None => {
                    line.pop();
                }
            }
        }
        format!("{}...", line.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::plan;
    use crate::model::{ImageRef, Sop, StepRecord};

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn texts(commands: &[RenderCommand]) -> Vec<&str> {
        commands.iter().filter_map(RenderCommand::text).collect()
    }

    fn sample_plan(steps: Vec<StepRecord>) -> DocumentPlan {
        let mut sop = Sop::new("Assembly A");
        sop.steps = steps;
        plan(&sop, &PageGeometry::default()).unwrap()
    }

    #[test]
    fn test_every_page_repeats_header() {
        let steps: Vec<_> = (0..40)
            .map(|i| StepRecord::new(format!("Step {}", i)).with_description("a\nb\nc\nd"))
            .collect();
        let plan = sample_plan(steps);
        assert!(plan.page_count() > 1);

        let commands = emit(&plan);
        let pages = super::super::split_pages(&commands);
        assert_eq!(pages.len(), plan.page_count());
        for (_, page) in pages {
            let page_texts = texts(page);
            assert!(page_texts.contains(&"Assembly A"));
            assert!(page_texts.contains(&"Legend:"));
            assert!(page_texts.contains(&"Reason why"));
        }
    }

    #[test]
    fn test_footer_page_numbers() {
        let plan = sample_plan(vec![StepRecord::new("Only")]);
        let commands = emit(&plan);
        assert!(texts(&commands).contains(&"Page 1 of 1"));
    }

    #[test]
    fn test_reason_is_rendered() {
        let plan = sample_plan(vec![StepRecord::new("Seal").with_reason("Prevents leaks")]);
        let commands = emit(&plan);
        assert!(texts(&commands).contains(&"Prevents leaks"));
        assert!(!texts(&commands).contains(&"Ensure quality"));
    }

    #[test]
    fn test_failed_image_draws_placeholder() {
        let plan = sample_plan(vec![
            StepRecord::new("Broken").with_image(ImageRef::failed("x.png", "404")),
            StepRecord::new("Fine").with_image(ImageRef::resolved("y.png", PNG_HEADER.to_vec())),
        ]);
        let (commands, stats) = Emitter::new(&plan).emit_with_stats();

        assert_eq!(stats.images_failed, 1);
        assert_eq!(stats.images_embedded, 1);
        assert!(texts(&commands).contains(&IMAGE_PLACEHOLDER_TEXT));
        assert!(texts(&commands).contains(&"Fine"));
        assert_eq!(
            commands
                .iter()
                .filter(|c| matches!(c, RenderCommand::Image { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_unresolved_image_is_not_fetched() {
        let plan = sample_plan(vec![StepRecord::new("Pending").with_image(ImageRef::new("z.png"))]);
        let (commands, stats) = Emitter::new(&plan).emit_with_stats();
        assert_eq!(stats.images_failed, 1);
        assert!(!commands.iter().any(|c| matches!(c, RenderCommand::Image { .. })));
    }

    #[test]
    fn test_missing_image_placeholder_fits_row() {
        let plan = sample_plan(vec![StepRecord::new("No photo")]);
        let row = &plan.pages[0].rows[0];
        let commands = emit(&plan);
        let g = &plan.geometry;

        let placeholder = commands
            .iter()
            .find(|c| matches!(c, RenderCommand::Rect { style, .. } if style.fill == Some(Color::PLACEHOLDER_FILL)))
            .unwrap();
        if let RenderCommand::Rect { y, h, .. } = placeholder {
            assert!(y + h <= row.bottom() - g.padding + 1e-3);
        }
    }

    #[test]
    fn test_glyph_commands_per_symbol() {
        let plan = sample_plan(vec![
            StepRecord::new("a").with_symbol(SymbolType::Tip),
            StepRecord::new("b").with_symbol(SymbolType::Hazard),
        ]);
        let commands = emit(&plan);
        let page_texts = texts(&commands);
        // Legend draws each glyph once, rows once more.
        assert_eq!(page_texts.iter().filter(|t| **t == "\u{2713}").count(), 2);
        assert_eq!(page_texts.iter().filter(|t| **t == "+").count(), 2);
    }

    #[test]
    fn test_long_title_is_truncated() {
        let mut sop = Sop::new(vec!["Extremely long title"; 40].join(" "));
        sop.add_step(StepRecord::new("x"));
        let plan = plan(&sop, &PageGeometry::default()).unwrap();
        let commands = emit(&plan);
        let title = texts(&commands)
            .into_iter()
            .find(|t| t.starts_with("Extremely"))
            .unwrap();
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_fit_line_cuts_single_long_word() {
        let plan = sample_plan(vec![StepRecord::new("x")]);
        let emitter = Emitter::new(&plan);
        let style = TextStyle::regular(10.0);
        let word = "W".repeat(200);

        let fitted = emitter.fit_line(&word, 100.0, &style);
        assert!(fitted.ends_with("..."));
        assert!(fitted.len() > 3);
        assert!(emitter.width(&fitted, &style) <= 100.0);

        let fitted = emitter.fit_line(&format!("{} tail", word), 100.0, &style);
        assert!(fitted.ends_with("..."));
        assert!(emitter.width(&fitted, &style) <= 100.0);
    }

    #[test]
    fn test_long_single_word_title_stays_in_bar() {
        let sop = Sop::new("Q".repeat(400)).with_step(StepRecord::new("x"));
        let plan = plan(&sop, &PageGeometry::default()).unwrap();
        let commands = emit(&plan);
        let title = texts(&commands)
            .into_iter()
            .find(|t| t.starts_with("QQQ"))
            .unwrap();
        assert!(title.ends_with("..."));
        assert!(title.len() < 400);
    }
}
