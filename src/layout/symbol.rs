//! Symbol assignment for step rows.

use crate::model::{Glyph, StepRecord, SymbolType};
use serde::{Deserialize, Serialize};

/// Fallback cycle for steps without an explicit symbol.
///
/// `Hazard` is deliberately absent: it only appears when set by the author.
pub const FALLBACK_CYCLE: [SymbolType; 3] = [
    SymbolType::Quality,
    SymbolType::Correctness,
    SymbolType::Tip,
];

/// The symbol a row displays and the glyph drawn for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    /// Symbol category
    pub symbol: SymbolType,

    /// Glyph drawn in the symbol column
    pub glyph: Glyph,

    /// Whether the author chose the symbol (false for the fallback cycle)
    pub explicit: bool,
}

/// Resolve the symbol for the step at `index` (0-based, after normalization).
pub fn resolve_symbol(step: &StepRecord, index: usize) -> ResolvedSymbol {
    match step.symbol {
        Some(symbol) => ResolvedSymbol {
            symbol,
            glyph: symbol.glyph(),
            explicit: true,
        },
        None => {
            let symbol = FALLBACK_CYCLE[index % FALLBACK_CYCLE.len()];
            ResolvedSymbol {
                symbol,
                glyph: symbol.glyph(),
                explicit: false,
            }
        }
    }
}
