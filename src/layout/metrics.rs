//! Text measurement and greedy word wrapping.

use serde::{Deserialize, Serialize};

/// Font faces available to the layout and every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFace {
    /// Body text
    #[default]
    Regular,
    /// Titles and labels
    Bold,
    /// Dingbat glyphs (checkmark)
    Symbol,
}

/// Measures the advance width of a run of text.
pub trait TextMeasure {
    /// Width of `text` in points at `size` points.
    fn text_width(&self, text: &str, font: FontFace, size: f32) -> f32;
}

/// Advance widths of the standard Helvetica faces (1/1000 em).
///
/// These match the base-14 fonts the PDF backend references, so wrapped
/// lines fit their cells without embedding font programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

// ASCII 0x20..=0x7E
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

impl HelveticaMetrics {
    fn char_width(c: char, font: FontFace) -> u16 {
        let code = c as u32;
        match font {
            FontFace::Symbol => 760,
            FontFace::Regular if (0x20..=0x7E).contains(&code) => {
                HELVETICA[(code - 0x20) as usize]
            }
            FontFace::Bold if (0x20..=0x7E).contains(&code) => {
                HELVETICA_BOLD[(code - 0x20) as usize]
            }
            FontFace::Regular => 556,
            FontFace::Bold => 611,
        }
    }
}

impl TextMeasure for HelveticaMetrics {
    fn text_width(&self, text: &str, font: FontFace, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| u32::from(Self::char_width(c, font)))
            .sum();
        units as f32 * size / 1000.0
    }
}

/// Greedily pack words into lines no wider than `max_width`.
///
/// Words are never split: a word wider than `max_width` occupies a line of
/// its own. Whitespace runs collapse to single spaces. Blank input yields
/// no lines.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: f32,
    measure: &M,
    font: FontFace,
    size: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate_width = measure.text_width(&current, font, size)
            + measure.text_width(" ", font, size)
            + measure.text_width(word, font, size);

        if candidate_width <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is exactly one point wide at any size.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str, _font: FontFace, _size: f32) -> f32 {
            text.chars().count() as f32
        }
    }

    #[test]
    fn test_helvetica_widths() {
        let m = HelveticaMetrics;
        // "Hi" = H(722) + i(222) at 10pt
        assert!((m.text_width("Hi", FontFace::Regular, 10.0) - 9.44).abs() < 1e-4);
        assert!(m.text_width("Hi", FontFace::Bold, 10.0) > m.text_width("Hi", FontFace::Regular, 10.0));
        assert_eq!(m.text_width("", FontFace::Regular, 10.0), 0.0);
    }

    #[test]
    fn test_wrap_greedy() {
        let lines = wrap_text("aaa bbb ccc dd", 7.0, &Monospace, FontFace::Regular, 1.0);
        assert_eq!(lines, vec!["aaa bbb", "ccc dd"]);
    }

    #[test]
    fn test_wrap_exact_fit() {
        let lines = wrap_text("abc def", 7.0, &Monospace, FontFace::Regular, 1.0);
        assert_eq!(lines, vec!["abc def"]);
    }

    #[test]
    fn test_wrap_never_splits_words() {
        let lines = wrap_text("a verylongword b", 4.0, &Monospace, FontFace::Regular, 1.0);
        assert_eq!(lines, vec!["a", "verylongword", "b"]);
    }

    #[test]
    fn test_wrap_blank() {
        assert!(wrap_text("  \t ", 10.0, &Monospace, FontFace::Regular, 1.0).is_empty());
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        let lines = wrap_text("a    b\tc", 100.0, &Monospace, FontFace::Regular, 1.0);
        assert_eq!(lines, vec!["a b c"]);
    }
}
