//! Step annotation symbols and their glyphs.

use serde::{Deserialize, Serialize};

/// Annotation category shown in the symbol column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    /// Quality-critical step
    Quality,
    /// Correctness check
    Correctness,
    /// Helpful tip
    Tip,
    /// Safety hazard (never assigned implicitly)
    Hazard,
}

impl SymbolType {
    /// All symbols in legend order.
    pub const ALL: [SymbolType; 4] = [
        SymbolType::Quality,
        SymbolType::Correctness,
        SymbolType::Tip,
        SymbolType::Hazard,
    ];

    /// Legend label.
    pub fn label(&self) -> &'static str {
        match self {
            SymbolType::Quality => "Quality",
            SymbolType::Correctness => "Correctness",
            SymbolType::Tip => "Tip",
            SymbolType::Hazard => "Hazard",
        }
    }

    /// The fixed glyph drawn for this symbol.
    pub fn glyph(&self) -> Glyph {
        match self {
            SymbolType::Quality => Glyph::FilledCircle(Color::ACCENT_A),
            SymbolType::Correctness => Glyph::FilledCircle(Color::ACCENT_B),
            SymbolType::Tip => Glyph::Checkmark(Color::TIP_GREEN),
            SymbolType::Hazard => Glyph::SquarePlus(Color::HAZARD_RED),
        }
    }

    /// Parse a symbol name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quality" => Some(SymbolType::Quality),
            "correctness" => Some(SymbolType::Correctness),
            "tip" => Some(SymbolType::Tip),
            "hazard" => Some(SymbolType::Hazard),
            _ => None,
        }
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label().to_ascii_lowercase())
    }
}

/// Shape drawn for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "color", rename_all = "snake_case")]
pub enum Glyph {
    /// Filled circle
    FilledCircle(Color),
    /// Checkmark glyph
    Checkmark(Color),
    /// Filled square with a white plus
    SquarePlus(Color),
}

impl Glyph {
    /// Primary color of the glyph.
    pub fn color(&self) -> Color {
        match self {
            Glyph::FilledCircle(c) | Glyph::Checkmark(c) | Glyph::SquarePlus(c) => *c,
        }
    }
}

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const GRID: Color = Color::rgb(0.35, 0.35, 0.35);
    pub const MUTED: Color = Color::rgb(0.45, 0.45, 0.45);
    pub const HEADER_FILL: Color = Color::rgb(0.88, 0.91, 0.96);
    pub const PLACEHOLDER_FILL: Color = Color::rgb(0.94, 0.94, 0.94);
    pub const ACCENT_A: Color = Color::rgb(0.13, 0.38, 0.78);
    pub const ACCENT_B: Color = Color::rgb(0.95, 0.6, 0.07);
    pub const TIP_GREEN: Color = Color::rgb(0.1, 0.6, 0.25);
    pub const HAZARD_RED: Color = Color::rgb(0.82, 0.12, 0.12);

    /// Create a color from float components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation (`#rrggbb`).
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}
