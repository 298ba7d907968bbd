//! Metrics of the standard Type 1 fonts, for simple fonts that ship without `/Widths`.
//!
//! Widths cover the printable ASCII range (codes 32 to 126 in WinAnsi order) and come from the
//! Adobe Core 14 AFM files. Oblique and italic sans variants share the upright widths.

/// Advance widths in 1/1000 em for codes 32..=126, plus vertical extents.
#[derive(Debug)]
pub struct StandardFont {
    widths: &'static [u16; 95],
    /// Used for codes outside the printable ASCII range.
    default_width: f64,
    pub ascent: f64,
    pub descent: f64,
}

const FIRST_CODE: u32 = 32;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC_WIDTHS: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC_WIDTHS: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

const COURIER_WIDTHS: [u16; 95] = [600; 95];

static HELVETICA: StandardFont = StandardFont {
    widths: &HELVETICA_WIDTHS,
    default_width: 556.0,
    ascent: 0.718,
    descent: -0.207,
};

static HELVETICA_BOLD: StandardFont = StandardFont {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 556.0,
    ascent: 0.718,
    descent: -0.207,
};

static TIMES_ROMAN: StandardFont = StandardFont {
    widths: &TIMES_ROMAN_WIDTHS,
    default_width: 500.0,
    ascent: 0.683,
    descent: -0.217,
};

static TIMES_BOLD: StandardFont = StandardFont {
    widths: &TIMES_BOLD_WIDTHS,
    default_width: 500.0,
    ascent: 0.676,
    descent: -0.205,
};

static TIMES_ITALIC: StandardFont = StandardFont {
    widths: &TIMES_ITALIC_WIDTHS,
    default_width: 500.0,
    ascent: 0.683,
    descent: -0.205,
};

static TIMES_BOLD_ITALIC: StandardFont = StandardFont {
    widths: &TIMES_BOLD_ITALIC_WIDTHS,
    default_width: 500.0,
    ascent: 0.699,
    descent: -0.205,
};

static COURIER: StandardFont = StandardFont {
    widths: &COURIER_WIDTHS,
    default_width: 600.0,
    ascent: 0.629,
    descent: -0.157,
};

impl StandardFont {
    /// Finds the metrics for a `/BaseFont` name. Subset tags (`ABCDEF+`) and the common
    /// metric-compatible substitutes (Arial, Times New Roman, Courier New) are accepted.
    pub fn lookup(base_font: &str) -> Option<&'static StandardFont> {
        let name = strip_subset_tag(base_font);
        let compact: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let (family, style) = match compact.split_once(['-', ',']) {
            Some((family, style)) => (family, style),
            None => (compact.as_str(), ""),
        };
        let bold = style.contains("bold");
        let italic = style.contains("italic") || style.contains("oblique");

        let font = match family {
            "helvetica" | "arial" | "arialmt" => {
                if bold {
                    &HELVETICA_BOLD
                } else {
                    &HELVETICA
                }
            }
            "times" | "timesnewroman" | "timesnewromanps" | "timesnewromanpsmt" => {
                match (bold, italic) {
                    (true, true) => &TIMES_BOLD_ITALIC,
                    (true, false) => &TIMES_BOLD,
                    (false, true) => &TIMES_ITALIC,
                    (false, false) => &TIMES_ROMAN,
                }
            }
            "courier" | "couriernew" | "couriernewpsmt" | "couriernewps" => &COURIER,
            _ => return None,
        };
        Some(font)
    }

    /// Advance in 1/1000 em for a single-byte code.
    pub fn width(&self, code: u32) -> f64 {
        code.checked_sub(FIRST_CODE)
            .and_then(|i| self.widths.get(i as usize))
            .map(|w| f64::from(*w))
            .unwrap_or(self.default_width)
    }
}

fn strip_subset_tag(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}
