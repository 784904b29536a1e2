//! Advance widths of the built-in Helvetica faces.
//!
//! Values are the AFM widths (1/1000 em) of the printable ASCII range. Text is
//! measured after [`pdf_safe`] folding, so the measured string is exactly the
//! one written to the page.

use super::pdf::pdf_safe;

/// Millimetres per typographic point.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

// ' and ` take the wider of their WinAnsi and Standard encoding glyphs.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,      // 'p'..'~'
];

/// Advance of one character in 1/1000 em. Control characters have none.
pub fn glyph_width(ch: char, bold: bool) -> u16 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    match ch {
        ' '..='~' => table[ch as usize - 32],
        c if c.is_ascii_control() => 0,
        // Anything left after folding is drawn as '?'
        _ => table['?' as usize - 32],
    }
}

/// Width of `text` set in Helvetica (or Helvetica-Bold) at `size_pt`, in millimetres.
pub fn text_width_mm(text: &str, size_pt: f32, bold: bool) -> f32 {
    let units: u32 = pdf_safe(text)
        .chars()
        .map(|ch| glyph_width(ch, bold) as u32)
        .sum();
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_advances() {
        assert_eq!(glyph_width('M', false), 833);
        assert_eq!(glyph_width('W', false), 944);
        assert_eq!(glyph_width('i', false), 222);
        assert_eq!(glyph_width('i', true), 278);
        assert_eq!(glyph_width(' ', true), 278);
        assert_eq!(glyph_width('~', false), 584);
        assert_eq!(glyph_width('@', false), 1015);
    }

    #[test]
    fn test_text_width() {
        let m = text_width_mm("MMMMMMMMMMMM", 12.0, false);
        assert!((m - 12.0 * 0.833 * 12.0 * PT_TO_MM).abs() < 1e-3);
        assert!(text_width_mm("abc", 12.0, true) > text_width_mm("abc", 12.0, false));
        assert_eq!(text_width_mm("", 12.0, false), 0.0);
    }

    #[test]
    fn test_measures_folded_text() {
        assert_eq!(text_width_mm("→", 10.0, false), text_width_mm("->", 10.0, false));
        assert_eq!(text_width_mm("é", 10.0, false), text_width_mm("e", 10.0, false));
        assert_eq!(text_width_mm("日", 10.0, false), text_width_mm("?", 10.0, false));
    }
}
