use serde::Serialize;

use crate::core::geometry::{union_all, BBox};
use crate::core::model::{Block, Line, PageGeometry};
use crate::lines::LineConfig;

/// A reconstructed visual line. `index` is its 1-based rank on the page, not a printed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyLine {
    pub index: usize,
    pub rect: BBox,
    pub text: String,
}

fn line_rect(line: &Line) -> Option<BBox> {
    line.bbox
        .or_else(|| union_all(line.spans.iter().filter_map(|span| span.bbox.as_ref())))
}

/// Rebuilds the page's body lines below the header band, ranked top to bottom then left to
/// right. Blocks are flattened, so side-by-side columns interleave line by line.
pub fn index_body_lines(
    blocks: &[Block],
    geometry: &PageGeometry,
    config: &LineConfig,
) -> Vec<BodyLine> {
    let header_y = geometry.header_cutoff_y(config.header_margin_points());

    let mut raw: Vec<(BBox, String)> = blocks
        .iter()
        .flat_map(|block| block.lines.iter())
        .filter_map(|line| {
            let text = line.text().trim().to_string();
            if text.is_empty() {
                return None;
            }
            line_rect(line).map(|rect| (rect, text))
        })
        .collect();

    raw.sort_by(|(a, _), (b, _)| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));

    raw.into_iter()
        .filter(|(rect, _)| rect.y0 >= header_y)
        .enumerate()
        .map(|(i, (rect, text))| BodyLine {
            index: i + 1,
            rect,
            text,
        })
        .collect()
}
