use crate::core::geometry::BBox;

/// Page box in points, origin at the top-left corner, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            width,
            height,
        }
    }

    pub fn rect(&self) -> BBox {
        BBox::new(self.x0, self.y0, self.x0 + self.width, self.y0 + self.height)
    }

    /// Right-hand limit of the left margin band.
    pub fn margin_cutoff_x(&self, margin_fraction: f64) -> f64 {
        self.x0 + margin_fraction * self.width
    }

    /// Lower limit of the header band; anything whose top edge is above it is header.
    pub fn header_cutoff_y(&self, header_margin_pt: f64) -> f64 {
        self.y0 + header_margin_pt
    }
}

/// A whitespace-delimited word with its box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextToken {
    pub text: String,
    pub bbox: BBox,
}

impl TextToken {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// One shown character code after decoding, in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f64,
    /// Index of the text-showing operation that produced the glyph.
    pub run: usize,
}

impl Glyph {
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bbox: Option<BBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub spans: Vec<Span>,
    pub bbox: Option<BBox>,
}

impl Line {
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub lines: Vec<Line>,
    pub bbox: Option<BBox>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationKind {
    Highlight,
    Underline,
    Squiggly,
    StrikeOut,
    Other(String),
}

impl AnnotationKind {
    /// Maps a PDF `/Subtype` name, ignoring case.
    pub fn from_subtype(subtype: &str) -> Self {
        match subtype.to_ascii_lowercase().as_str() {
            "highlight" => AnnotationKind::Highlight,
            "underline" => AnnotationKind::Underline,
            "squiggly" => AnnotationKind::Squiggly,
            "strikeout" => AnnotationKind::StrikeOut,
            _ => AnnotationKind::Other(subtype.to_string()),
        }
    }

    pub fn is_markup(&self) -> bool {
        !matches!(self, AnnotationKind::Other(_))
    }

    pub fn name(&self) -> &str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Underline => "underline",
            AnnotationKind::Squiggly => "squiggly",
            AnnotationKind::StrikeOut => "strikeout",
            AnnotationKind::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub rect: BBox,
    pub comment: Option<String>,
}

/// Everything the report needs from one page. Built per page and dropped afterwards.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_idx: usize,
    pub geometry: PageGeometry,
    pub words: Vec<TextToken>,
    pub blocks: Vec<Block>,
    pub glyphs: Vec<Glyph>,
    pub annotations: Vec<Annotation>,
    /// Set when the page's content stream could not be interpreted.
    pub content_error: Option<String>,
}

impl PageContent {
    pub fn new(page_idx: usize, geometry: PageGeometry) -> Self {
        Self {
            page_idx,
            geometry,
            words: Vec::new(),
            blocks: Vec::new(),
            glyphs: Vec::new(),
            annotations: Vec::new(),
            content_error: None,
        }
    }

    pub fn page_number(&self) -> usize {
        self.page_idx + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_subtypes_case_insensitively() {
        assert_eq!(AnnotationKind::from_subtype("Highlight"), AnnotationKind::Highlight);
        assert_eq!(AnnotationKind::from_subtype("StrikeOut"), AnnotationKind::StrikeOut);
        assert_eq!(AnnotationKind::from_subtype("squiggly"), AnnotationKind::Squiggly);
        assert_eq!(
            AnnotationKind::from_subtype("Popup"),
            AnnotationKind::Other("Popup".to_string())
        );
        assert!(!AnnotationKind::from_subtype("Link").is_markup());
        assert!(AnnotationKind::from_subtype("UNDERLINE").is_markup());
    }

    #[test]
    fn derives_cutoffs_from_geometry() {
        let page = PageGeometry {
            x0: 10.0,
            y0: 20.0,
            width: 600.0,
            height: 800.0,
        };
        assert!((page.margin_cutoff_x(0.15) - 100.0).abs() < 1e-9);
        assert_eq!(page.header_cutoff_y(30.0), 50.0);
        assert_eq!(page.rect(), BBox::new(10.0, 20.0, 610.0, 820.0));
    }
}
