use crate::core::geometry::{union_all, BBox};
use crate::core::model::{Block, Glyph, Line, Span, TextToken};

/// Words and block structure recovered from a page's glyphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub words: Vec<TextToken>,
    pub blocks: Vec<Block>,
}

/// Groups positioned glyphs into lines, spans, words and blocks. Thresholds are in em of the
/// glyphs involved.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    space_gap: f64,
    line_tolerance: f64,
    line_gap: f64,
    block_gap: f64,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self {
            space_gap: 0.15,
            line_tolerance: 0.5,
            line_gap: 3.0,
            block_gap: 1.0,
        }
    }
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self, glyphs: &[Glyph]) -> PageLayout {
        let lines = self.group_lines(glyphs);

        let mut words = Vec::new();
        for line in &lines {
            self.collect_words(line, &mut words);
        }

        let mut blocks: Vec<Block> = Vec::new();
        let mut previous: Option<BBox> = None;
        for glyph_line in &lines {
            let bbox = union_all(glyph_line.iter().map(|g| &g.bbox));
            let line = Line {
                spans: self.spans(glyph_line),
                bbox,
            };
            let starts_block = match (previous, bbox) {
                (Some(prev), Some(current)) => self.breaks_block(&prev, &current),
                _ => true,
            };
            match blocks.last_mut() {
                Some(block) if !starts_block => {
                    block.bbox = match (block.bbox, bbox) {
                        (Some(a), Some(b)) => Some(a.union(&b)),
                        (a, b) => a.or(b),
                    };
                    block.lines.push(line);
                }
                _ => blocks.push(Block {
                    lines: vec![line],
                    bbox,
                }),
            }
            previous = bbox.or(previous);
        }

        PageLayout { words, blocks }
    }

    /// Splits glyphs, in drawing order, into visual lines. A glyph joins the current line when
    /// its vertical center is close to the previous glyph's and it neither jumps back left nor
    /// leaves a column-sized gap.
    pub fn group_lines<'g, I>(&self, glyphs: I) -> Vec<Vec<&'g Glyph>>
    where
        I: IntoIterator<Item = &'g Glyph>,
    {
        let mut lines: Vec<Vec<&'g Glyph>> = Vec::new();
        for glyph in glyphs {
            let joins = lines
                .last()
                .and_then(|line| line.last())
                .is_some_and(|prev| self.same_line(prev, glyph));
            match lines.last_mut() {
                Some(line) if joins => line.push(glyph),
                _ => lines.push(vec![glyph]),
            }
        }
        lines
    }

    /// Text of one grouped line, with spaces inserted where the layout leaves a visible gap.
    pub fn line_text(&self, line: &[&Glyph]) -> String {
        let mut text = String::new();
        for (i, glyph) in line.iter().enumerate() {
            if i > 0 && self.needs_space(line[i - 1], glyph) {
                text.push(' ');
            }
            text.push_str(&glyph.text);
        }
        text
    }

    fn same_line(&self, prev: &Glyph, next: &Glyph) -> bool {
        let size = prev.font_size.max(next.font_size);
        let drift = (prev.bbox.vertical_center() - next.bbox.vertical_center()).abs();
        let gap = next.bbox.x0 - prev.bbox.x1;
        drift <= self.line_tolerance * size && gap >= -size && gap <= self.line_gap * size
    }

    fn gap_exceeded(&self, prev: &Glyph, next: &Glyph) -> bool {
        next.bbox.x0 - prev.bbox.x1 > self.space_gap * prev.font_size.max(next.font_size)
    }

    fn needs_space(&self, prev: &Glyph, next: &Glyph) -> bool {
        !prev.is_whitespace() && !next.is_whitespace() && self.gap_exceeded(prev, next)
    }

    fn breaks_block(&self, prev: &BBox, current: &BBox) -> bool {
        let height = prev.height().max(current.height());
        current.y0 - prev.y1 > self.block_gap * height || current.y0 < prev.y0 - height
    }

    fn spans(&self, line: &[&Glyph]) -> Vec<Span> {
        let mut spans: Vec<(usize, String, Vec<BBox>)> = Vec::new();
        for (i, glyph) in line.iter().enumerate() {
            let space = i > 0 && self.needs_space(line[i - 1], glyph);
            match spans.last_mut() {
                Some((run, text, boxes)) if *run == glyph.run => {
                    if space {
                        text.push(' ');
                    }
                    text.push_str(&glyph.text);
                    boxes.push(glyph.bbox);
                }
                _ => {
                    let mut text = String::new();
                    if space {
                        text.push(' ');
                    }
                    text.push_str(&glyph.text);
                    spans.push((glyph.run, text, vec![glyph.bbox]));
                }
            }
        }
        spans
            .into_iter()
            .map(|(_, text, boxes)| Span {
                text,
                bbox: union_all(boxes.iter()),
            })
            .collect()
    }

    fn collect_words(&self, line: &[&Glyph], words: &mut Vec<TextToken>) {
        let mut text = String::new();
        let mut bbox: Option<BBox> = None;
        let mut flush = |text: &mut String, bbox: &mut Option<BBox>| {
            if let Some(b) = bbox.take() {
                if !text.is_empty() {
                    words.push(TextToken::new(std::mem::take(text), b));
                }
            }
            text.clear();
        };

        for (i, glyph) in line.iter().enumerate() {
            if glyph.is_whitespace() {
                flush(&mut text, &mut bbox);
                continue;
            }
            if i > 0 && self.gap_exceeded(line[i - 1], glyph) {
                flush(&mut text, &mut bbox);
            }
            text.push_str(&glyph.text);
            bbox = Some(match bbox {
                Some(b) => b.union(&glyph.bbox),
                None => glyph.bbox,
            });
        }
        flush(&mut text, &mut bbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Glyphs for `text` on a 10pt line starting at `x`, 5pt per character.
    fn run(text: &str, x: f64, top: f64, run: usize) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x0 = x + 5.0 * i as f64;
                Glyph {
                    text: c.to_string(),
                    bbox: BBox::new(x0, top, x0 + 5.0, top + 10.0),
                    font_size: 10.0,
                    run,
                }
            })
            .collect()
    }

    #[test]
    fn splits_words_on_spaces_and_gaps() {
        let mut glyphs = run("12", 20.0, 100.0, 0);
        glyphs.extend(run("Some Claim", 72.0, 100.0, 1));

        let layout = LayoutBuilder::new().build(&glyphs);
        let words: Vec<(&str, BBox)> = layout
            .words
            .iter()
            .map(|w| (w.text.as_str(), w.bbox))
            .collect();
        assert_eq!(
            words,
            vec![
                ("12", BBox::new(20.0, 100.0, 30.0, 110.0)),
                ("Some", BBox::new(72.0, 100.0, 92.0, 110.0)),
                ("Claim", BBox::new(97.0, 100.0, 122.0, 110.0)),
            ]
        );
    }

    #[test]
    fn builds_spans_lines_and_blocks() {
        let mut glyphs = run("first", 72.0, 100.0, 0);
        glyphs.extend(run("line", 102.0, 100.0, 1));
        glyphs.extend(run("second", 72.0, 112.0, 2));
        glyphs.extend(run("far below", 72.0, 300.0, 3));

        let layout = LayoutBuilder::new().build(&glyphs);
        assert_eq!(layout.blocks.len(), 2);

        let first = &layout.blocks[0];
        assert_eq!(first.lines.len(), 2);
        assert_eq!(first.lines[0].spans.len(), 2);
        assert_eq!(first.lines[0].text(), "first line");
        assert_eq!(first.lines[0].bbox, Some(BBox::new(72.0, 100.0, 122.0, 110.0)));
        assert_eq!(first.lines[1].text(), "second");
        assert_eq!(first.bbox, Some(BBox::new(72.0, 100.0, 122.0, 122.0)));

        assert_eq!(layout.blocks[1].lines[0].text(), "far below");
    }

    #[test]
    fn jumping_back_left_starts_a_new_line() {
        let mut glyphs = run("body text", 72.0, 100.0, 0);
        glyphs.extend(run("7", 20.0, 100.0, 1));

        let builder = LayoutBuilder::new();
        let lines = builder.group_lines(&glyphs);
        assert_eq!(lines.len(), 2);
        assert_eq!(builder.line_text(&lines[1]), "7");
    }

    #[test]
    fn wide_gap_splits_side_by_side_columns() {
        use crate::core::model::PageGeometry;
        use crate::lines::{index_body_lines, LineConfig};

        let mut glyphs = run("left col", 72.0, 100.0, 0);
        glyphs.extend(run("right col", 320.0, 100.0, 1));

        let layout = LayoutBuilder::new().build(&glyphs);
        let lines = index_body_lines(
            &layout.blocks,
            &PageGeometry::new(612.0, 792.0),
            &LineConfig::default(),
        );
        let texts: Vec<(usize, &str)> = lines.iter().map(|l| (l.index, l.text.as_str())).collect();
        assert_eq!(texts, vec![(1, "left col"), (2, "right col")]);
    }
}
