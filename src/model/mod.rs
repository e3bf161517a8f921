//! Document model types for SOP content.
//!
//! This module defines the caller-owned input of the layout engine: the
//! SOP metadata block and its ordered steps. The engine treats these as
//! read-only; every export builds its own layout from them.

mod image;
mod sop;
mod step;
mod symbol;

pub use image::{ImageData, ImageRef, ImageState};
pub use sop::{Sop, SopMetadata};
pub use step::StepRecord;
pub use symbol::{Color, Glyph, SymbolType};
