//! Document layout engine.
//!
//! Turns an ordered list of steps into a paginated grid of rows:
//! normalization, row height estimation, symbol assignment and pagination.
//! Everything here is pure and synchronous; image bytes are never fetched.

mod estimate;
mod geometry;
mod metrics;
mod normalize;
mod paginate;
mod plan;
mod symbol;

pub use estimate::{RowEstimate, RowEstimator, RowLines, PLACEHOLDER_KEY_POINT};
pub use geometry::{Columns, PageGeometry, Span};
pub use metrics::{wrap_text, FontFace, HelveticaMetrics, TextMeasure};
pub use normalize::{normalize_steps, validate, StepNormalizer};
pub use paginate::{paginate, paginate_with, Cursor, PageLayout, RowPlacement};
pub use plan::{plan, DocumentPlan};
pub use symbol::{resolve_symbol, ResolvedSymbol, FALLBACK_CYCLE};
