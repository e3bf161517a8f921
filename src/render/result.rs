//! Rendered document with statistics.

use super::command::{split_pages, RenderCommand};
use crate::layout::DocumentPlan;
use serde::{Deserialize, Serialize};

/// A plan together with the drawing commands emitted for it.
///
/// This is the input every export backend consumes.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    /// The layout the commands were emitted from
    pub plan: DocumentPlan,

    /// Drawing commands, page by page
    pub commands: Vec<RenderCommand>,

    /// Emission statistics
    pub stats: RenderStats,
}

impl RenderedDocument {
    /// Create a new rendered document.
    pub fn new(plan: DocumentPlan, commands: Vec<RenderCommand>, stats: RenderStats) -> Self {
        Self {
            plan,
            commands,
            stats,
        }
    }

    /// Page width in points.
    pub fn page_width(&self) -> f32 {
        self.plan.geometry.page_width
    }

    /// Page height in points.
    pub fn page_height(&self) -> f32 {
        self.plan.geometry.page_height
    }

    /// Commands grouped by page.
    pub fn pages(&self) -> Vec<(&RenderCommand, &[RenderCommand])> {
        split_pages(&self.commands)
    }

    /// Document title.
    pub fn title(&self) -> &str {
        &self.plan.metadata.title
    }
}

/// Statistics collected while emitting commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Number of pages emitted
    pub page_count: u32,

    /// Number of step rows drawn
    pub step_count: u32,

    /// Total number of drawing commands
    pub command_count: u32,

    /// Images embedded from resolved data
    pub images_embedded: u32,

    /// Image references that could not be shown
    pub images_failed: u32,

    /// Rows without an image reference
    pub images_missing: u32,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment page count.
    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    /// Increment embedded image count.
    pub fn add_embedded_image(&mut self) {
        self.images_embedded += 1;
    }

    /// Increment failed image count.
    pub fn add_failed_image(&mut self) {
        self.images_failed += 1;
    }

    /// Increment missing image count.
    pub fn add_missing_image(&mut self) {
        self.images_missing += 1;
    }

    /// Number of image placeholders drawn.
    pub fn placeholder_count(&self) -> u32 {
        self.images_failed + self.images_missing
    }

    /// Whether some referenced image could not be shown.
    pub fn has_failed_images(&self) -> bool {
        self.images_failed > 0
    }
}
