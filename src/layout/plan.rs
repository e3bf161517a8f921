//! Complete layout of one export.

use super::normalize::validate;
use super::paginate::{paginate, PageLayout, RowPlacement};
use super::PageGeometry;
use crate::error::Result;
use crate::model::{Sop, SopMetadata, StepRecord};
use serde::Serialize;

/// Everything the emitter needs: metadata, normalized steps, geometry and pages.
///
/// Built fresh for every export; identical inputs give identical plans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPlan {
    /// Title block metadata
    pub metadata: SopMetadata,

    /// Steps after normalization, in document order
    pub steps: Vec<StepRecord>,

    /// Geometry the pages were laid out with
    pub geometry: PageGeometry,

    /// Pages in order
    pub pages: Vec<PageLayout>,
}

impl DocumentPlan {
    /// Get the number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get the number of laid-out steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// All placements in document order.
    pub fn placements(&self) -> impl Iterator<Item = &RowPlacement> {
        self.pages.iter().flat_map(|p| p.rows.iter())
    }

    /// The page index and placement of a step.
    pub fn placement_of(&self, step_index: usize) -> Option<(usize, &RowPlacement)> {
        self.pages.iter().find_map(|page| {
            page.rows
                .iter()
                .find(|row| row.step_index == step_index)
                .map(|row| (page.page_index, row))
        })
    }

    /// The step drawn by a placement.
    pub fn step(&self, placement: &RowPlacement) -> Option<&StepRecord> {
        self.steps.get(placement.step_index)
    }
}

/// Validate, normalize and paginate an SOP.
///
/// # Errors
/// Precondition errors (`MissingTitle`, `NoSteps`, `InvalidGeometry`) are
/// returned before any layout work.
pub fn plan(sop: &Sop, geometry: &PageGeometry) -> Result<DocumentPlan> {
    geometry.validate()?;
    let steps = validate(sop)?;
    let pages = paginate(&steps, geometry);

    Ok(DocumentPlan {
        metadata: sop.metadata.clone(),
        steps,
        geometry: geometry.clone(),
        pages,
    })
}
