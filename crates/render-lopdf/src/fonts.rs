use lopdf::{Dictionary, dictionary};

/// Advance widths (1/1000 em) for printable ASCII, from the Adobe core font metrics.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, // ' ' .. ')'
    389, 584, 278, 333, 278, 278, 556, 556, 556, 556, // '*' .. '3'
    556, 556, 556, 556, 556, 556, 278, 278, 584, 584, // '4' .. '='
    584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, // '>' .. 'G'
    722, 278, 500, 667, 556, 833, 722, 778, 667, 778, // 'H' .. 'Q'
    722, 667, 611, 722, 667, 944, 667, 667, 611, 278, // 'R' .. '['
    278, 278, 469, 556, 333, 556, 556, 500, 556, 556, // '\\' .. 'e'
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 'f' .. 'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, // 'p' .. 'y'
    500, 334, 260, 334, 584, // 'z' .. '~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, // ' ' .. ')'
    389, 584, 278, 333, 278, 278, 556, 556, 556, 556, // '*' .. '3'
    556, 556, 556, 556, 556, 556, 333, 333, 584, 584, // '4' .. '='
    584, 611, 975, 722, 722, 722, 722, 667, 611, 778, // '>' .. 'G'
    722, 278, 556, 722, 611, 833, 722, 778, 667, 778, // 'H' .. 'Q'
    722, 667, 611, 722, 667, 944, 667, 667, 611, 333, // 'R' .. '['
    278, 333, 584, 556, 333, 556, 611, 556, 611, 556, // '\\' .. 'e'
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 'f' .. 'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, // 'p' .. 'y'
    500, 389, 280, 389, 584, // 'z' .. '~'
];

/// Glyphs outside printable ASCII are measured with the width of a digit.
const FALLBACK_WIDTH: u16 = 556;

/// The standard Type1 fonts a statement uses. They are never embedded, so every
/// conforming viewer already has them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    pub const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Name of the font inside the page resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    fn glyph_width(self, c: char) -> u16 {
        match c as u32 {
            code @ 32..=126 => self.widths()[(code - 32) as usize],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of a single line of text in points.
    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.glyph_width(c) as u32).sum();
        units as f32 * font_size / 1000.0
    }

    pub(crate) fn dictionary(self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }
}

/// Maps text onto single-byte WinAnsi codes; characters outside Latin-1 become `?`.
pub fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if c as u32 <= 255 { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_known_strings() {
        // "Page 1": P(667) a(556) g(556) e(556) space(278) 1(556) = 3169
        let width = StandardFont::Helvetica.text_width("Page 1", 10.0);
        assert!((width - 31.69).abs() < 1e-3);
    }

    #[test]
    fn bold_is_wider_than_regular() {
        let text = "BANK STATEMENT";
        assert!(
            StandardFont::HelveticaBold.text_width(text, 18.0)
                > StandardFont::Helvetica.text_width(text, 18.0)
        );
    }

    #[test]
    fn non_ascii_uses_fallback_width() {
        assert_eq!(StandardFont::Helvetica.text_width("é", 1000.0), 556.0);
        assert_eq!(to_win_ansi("é€"), vec![0xE9, b'?']);
    }
}
