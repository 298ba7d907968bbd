use crate::core::error::ExtractError;
use crate::core::geometry::BBox;
use crate::core::model::{Glyph, PageContent};
use crate::parser::layout_builder::LayoutBuilder;

impl PageContent {
    /// Text whose glyphs are centered inside `clip`, one output line per visual line.
    ///
    /// The clip is cut to the page rectangle first; a clip entirely off the page yields an empty
    /// string. Pages whose content could not be interpreted report that failure here.
    pub fn text_in(&self, clip: &BBox) -> Result<String, ExtractError> {
        if let Some(message) = &self.content_error {
            return Err(ExtractError::Content(message.clone()));
        }
        extract_region_text(&self.glyphs, &self.geometry.rect(), clip)
    }
}

pub fn extract_region_text(
    glyphs: &[Glyph],
    page_rect: &BBox,
    clip: &BBox,
) -> Result<String, ExtractError> {
    if !clip.is_finite() {
        return Err(ExtractError::InvalidRegion);
    }
    let Some(region) = clip.intersection(page_rect) else {
        return Ok(String::new());
    };

    let inside = glyphs.iter().filter(|glyph| {
        let (x, y) = glyph.bbox.center();
        region.contains_point(x, y)
    });

    let builder = LayoutBuilder::new();
    let lines: Vec<String> = builder
        .group_lines(inside)
        .iter()
        .map(|line| builder.line_text(line))
        .collect();
    Ok(lines.join("\n"))
}
