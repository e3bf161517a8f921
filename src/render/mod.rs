//! Render command emission.
//!
//! The emitter walks a [`DocumentPlan`](crate::layout::DocumentPlan) and
//! produces a flat, backend-agnostic list of drawing commands. Export
//! backends only ever see these commands.

mod command;
mod emitter;
mod result;

pub use command::{
    split_pages, EmbeddedImage, RectStyle, RenderCommand, TextStyle, ASCENT,
    IMAGE_PLACEHOLDER_TEXT,
};
pub use emitter::{emit, Emitter};
pub use result::{RenderStats, RenderedDocument};

use crate::layout::DocumentPlan;

/// Emit commands for a plan and bundle them for the export backends.
pub fn render(plan: DocumentPlan) -> RenderedDocument {
    let (commands, stats) = Emitter::new(&plan).emit_with_stats();
    log::debug!(
        "emitted {} commands over {} pages ({} placeholders)",
        stats.command_count,
        stats.page_count,
        stats.placeholder_count()
    );
    RenderedDocument::new(plan, commands, stats)
}
