//! Row height estimation.

use super::metrics::{wrap_text, FontFace, HelveticaMetrics, TextMeasure};
use super::PageGeometry;
use crate::model::StepRecord;
use serde::{Deserialize, Serialize};

/// Key point shown for steps with an empty description.
pub const PLACEHOLDER_KEY_POINT: &str = "No details provided.";

/// Wrapped text of one row, ready to draw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowLines {
    /// Step title lines (bold)
    pub title: Vec<String>,

    /// Wrapped lines per key point; the first line carries the `n.` prefix
    pub key_points: Vec<Vec<String>>,

    /// Whether `key_points` holds only the placeholder
    pub placeholder: bool,

    /// Reason column lines
    pub reason: Vec<String>,
}

impl RowLines {
    /// Number of lines in the description column.
    pub fn description_line_count(&self) -> usize {
        self.title.len() + self.key_points.iter().map(Vec::len).sum::<usize>()
    }
}

/// Height of a row and the text wrapping that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowEstimate {
    /// Rendered row height
    pub height: f32,

    /// Wrapped text
    pub lines: RowLines,
}

/// Computes how tall a step's row will be.
pub struct RowEstimator<'a, M: TextMeasure = HelveticaMetrics> {
    geometry: &'a PageGeometry,
    measure: M,
}

impl<'a> RowEstimator<'a, HelveticaMetrics> {
    /// Create an estimator using Helvetica metrics.
    pub fn new(geometry: &'a PageGeometry) -> Self {
        Self::with_measure(geometry, HelveticaMetrics)
    }
}

impl<'a, M: TextMeasure> RowEstimator<'a, M> {
    /// Create an estimator with custom text metrics.
    pub fn with_measure(geometry: &'a PageGeometry, measure: M) -> Self {
        Self { geometry, measure }
    }

    /// The text metrics in use.
    pub fn measure(&self) -> &M {
        &self.measure
    }

    /// Estimate the row for `step` with descriptions wrapped at `max_text_width`.
    ///
    /// The height is the largest of the base row height, the description
    /// text, the reason text and (when the step has an image reference) the
    /// image block, so it never shrinks as text is added.
    pub fn estimate(&self, step: &StepRecord, max_text_width: f32) -> RowEstimate {
        let g = self.geometry;
        let lines = self.wrap_row(step, max_text_width);

        let text_height =
            lines.description_line_count() as f32 * g.line_height + 2.0 * g.padding;
        let reason_height = lines.reason.len() as f32 * g.line_height + 2.0 * g.padding;
        let image_height = if step.image.is_some() {
            g.image_block().1 + 2.0 * g.padding
        } else {
            0.0
        };

        let height = g
            .base_row_height
            .max(text_height)
            .max(reason_height)
            .max(image_height);

        RowEstimate { height, lines }
    }

    /// Height only.
    pub fn estimate_height(&self, step: &StepRecord, max_text_width: f32) -> f32 {
        self.estimate(step, max_text_width).height
    }

    fn wrap_row(&self, step: &StepRecord, max_text_width: f32) -> RowLines {
        let g = self.geometry;

        let title = wrap_text(
            &step.title,
            max_text_width,
            &self.measure,
            FontFace::Bold,
            g.step_title_font_size,
        );

        let points = step.key_points();
        let placeholder = points.is_empty();
        let key_points = if placeholder {
            vec![vec![PLACEHOLDER_KEY_POINT.to_string()]]
        } else {
            points
                .iter()
                .enumerate()
                .map(|(i, point)| {
                    wrap_text(
                        &format!("{}. {}", i + 1, point),
                        max_text_width,
                        &self.measure,
                        FontFace::Regular,
                        g.font_size,
                    )
                })
                .collect()
        };

        let reason = step
            .reason()
            .map(|r| {
                wrap_text(
                    r,
                    g.reason_text_width(),
                    &self.measure,
                    FontFace::Regular,
                    g.font_size,
                )
            })
            .unwrap_or_default();

        RowLines {
            title,
            key_points,
            placeholder,
            reason,
        }
    }
}
