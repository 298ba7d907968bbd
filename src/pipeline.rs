use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, trace, warn};

use crate::core::model::PageContent;
use crate::export::text_export::TextExporter;
use crate::export::Exporter;
use crate::lines::{LineConfig, LineSource};
use crate::parser::{DocumentSource, PdfReader};
use crate::report::{format_entry, Report, ReportEntry};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub lines: LineConfig,
}

impl PipelineConfig {
    /// Without an explicit output the report lands next to the input.
    pub fn new(input: PathBuf, output: Option<PathBuf>, lines: LineConfig) -> Self {
        let output = output.unwrap_or_else(|| default_output_path(&input));
        Self {
            input,
            output,
            lines,
        }
    }
}

/// `<dir>/<stem>_annotations.txt` for an input at `<dir>/<stem>.<ext>`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_annotations.txt"))
}

/// Report lines for one page, in annotation order.
pub fn page_entries(page: &PageContent, config: &LineConfig) -> Vec<ReportEntry> {
    if !page.annotations.iter().any(|a| a.kind.is_markup()) {
        return Vec::new();
    }

    let source = LineSource::for_page(page, config);
    let page_number = page.page_number();
    let mut entries = Vec::new();

    for annotation in &page.annotations {
        if !annotation.kind.is_markup() {
            trace!(page = page_number, kind = annotation.kind.name(), "ignoring annotation");
            continue;
        }
        let line = source.resolve(annotation.rect.vertical_center());
        let extracted = page.text_in(&annotation.rect);
        if let Err(err) = &extracted {
            warn!(page = page_number, error = %err, "could not extract annotated text");
        }
        if let Some(text) = format_entry(
            &annotation.kind,
            &extracted,
            annotation.comment.as_deref(),
            page_number,
            line,
        ) {
            entries.push(ReportEntry { page_number, text });
        }
    }
    entries
}

pub fn build_report<S: DocumentSource>(source: &S, config: &LineConfig) -> Result<Report> {
    let mut report = Report::new();
    for page_idx in 0..source.page_count() {
        let page = source
            .load_page(page_idx)
            .with_context(|| format!("failed to load page {}", page_idx + 1))?;
        report.extend_page(page_entries(&page, config));
    }
    Ok(report)
}

pub fn export_report(report: &Report, output: &Path) -> Result<()> {
    TextExporter::new(output.to_path_buf()).export(report)
}

/// Validates the configuration, reads the input, and writes the report.
pub fn run(config: &PipelineConfig) -> Result<Report> {
    config.lines.validate()?;
    let reader = PdfReader::open(&config.input)?;
    let report = build_report(&reader, &config.lines)?;
    export_report(&report, &config.output)?;
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        entries = report.entries.len(),
        "report written"
    );
    Ok(report)
}

/// Which line source a page would use, and how many annotations it carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub page_number: usize,
    pub line_source: LineSourceSummary,
    pub markup_annotations: usize,
    pub other_annotations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineSourceSummary {
    Margin {
        count: usize,
        first: Option<u32>,
        last: Option<u32>,
    },
    Body {
        count: usize,
    },
}

impl PageSummary {
    pub fn for_page(page: &PageContent, config: &LineConfig) -> Self {
        let line_source = match LineSource::for_page(page, config) {
            LineSource::Margin(numbers) => LineSourceSummary::Margin {
                count: numbers.len(),
                first: numbers.iter().map(|n| n.line_number).min(),
                last: numbers.iter().map(|n| n.line_number).max(),
            },
            LineSource::Body(lines) => LineSourceSummary::Body { count: lines.len() },
        };
        let markup = page
            .annotations
            .iter()
            .filter(|a| a.kind.is_markup())
            .count();
        Self {
            page_number: page.page_number(),
            line_source,
            markup_annotations: markup,
            other_annotations: page.annotations.len() - markup,
        }
    }
}

pub fn inspect_document<S: DocumentSource>(
    source: &S,
    config: &LineConfig,
) -> Result<Vec<PageSummary>> {
    (0..source.page_count())
        .map(|page_idx| {
            let page = source
                .load_page(page_idx)
                .with_context(|| format!("failed to load page {}", page_idx + 1))?;
            Ok(PageSummary::for_page(&page, config))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DocumentError;
    use crate::core::geometry::BBox;
    use crate::core::model::{
        Annotation, AnnotationKind, Block, Glyph, Line, PageGeometry, Span, TextToken,
    };
    use pretty_assertions::assert_eq;

    fn glyphs(text: &str, x: f64, top: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x0 = x + 5.0 * i as f64;
                Glyph {
                    text: c.to_string(),
                    bbox: BBox::new(x0, top, x0 + 5.0, top + 10.0),
                    font_size: 10.0,
                    run: 0,
                }
            })
            .collect()
    }

    fn body_line(text: &str, top: f64) -> Block {
        let bbox = BBox::new(72.0, top, 72.0 + 5.0 * text.len() as f64, top + 10.0);
        Block {
            lines: vec![Line {
                spans: vec![Span {
                    text: text.to_string(),
                    bbox: Some(bbox),
                }],
                bbox: Some(bbox),
            }],
            bbox: Some(bbox),
        }
    }

    fn annotation(kind: AnnotationKind, rect: BBox, comment: Option<&str>) -> Annotation {
        Annotation {
            kind,
            rect,
            comment: comment.map(str::to_string),
        }
    }

    fn numbered_page() -> PageContent {
        let mut page = PageContent::new(0, PageGeometry::new(612.0, 792.0));
        page.words = vec![
            TextToken::new("42", BBox::new(20.0, 84.0, 30.0, 94.0)),
            TextToken::new("43", BBox::new(20.0, 104.0, 30.0, 114.0)),
            TextToken::new("Some", BBox::new(72.0, 84.0, 92.0, 94.0)),
        ];
        page.glyphs = glyphs("Some Claim here", 72.0, 84.0);
        page.annotations = vec![
            annotation(
                AnnotationKind::Highlight,
                BBox::new(71.0, 85.0, 123.0, 95.0),
                Some("needs citation"),
            ),
            annotation(
                AnnotationKind::Other("Popup".to_string()),
                BBox::new(0.0, 0.0, 10.0, 10.0),
                None,
            ),
        ];
        page
    }

    #[test]
    fn resolves_against_margin_numbers() {
        let entries = page_entries(&numbered_page(), &LineConfig::default());
        assert_eq!(
            entries,
            vec![ReportEntry {
                page_number: 1,
                text: "Page 1, line 42, \"...Some Claim...\": needs citation".to_string(),
            }]
        );
    }

    #[test]
    fn margin_numbers_win_over_body_lines() {
        let mut page = numbered_page();
        page.blocks = vec![body_line("first", 60.0), body_line("Some Claim here", 84.0)];
        let summary = PageSummary::for_page(&page, &LineConfig::default());
        assert_eq!(
            summary.line_source,
            LineSourceSummary::Margin {
                count: 2,
                first: Some(42),
                last: Some(43),
            }
        );
        let entries = page_entries(&page, &LineConfig::default());
        assert!(entries[0].text.starts_with("Page 1, line 42,"));
    }

    #[test]
    fn falls_back_to_body_lines() {
        let mut page = PageContent::new(1, PageGeometry::new(612.0, 792.0));
        page.blocks = vec![
            body_line("header", 14.0),
            body_line("first line", 84.0),
            body_line("some foo bar", 104.0),
        ];
        page.glyphs = glyphs("some foo bar", 72.0, 104.0);
        page.annotations = vec![annotation(
            AnnotationKind::StrikeOut,
            BBox::new(96.0, 105.0, 133.0, 113.0),
            None,
        )];

        let entries = page_entries(&page, &LineConfig::default());
        assert_eq!(
            entries[0].text,
            "Page 2, line 2: strike out \"...foo bar...\""
        );
    }

    #[test]
    fn extraction_failure_becomes_placeholder() {
        let mut page = numbered_page();
        page.content_error = Some("bad stream".to_string());
        let entries = page_entries(&page, &LineConfig::default());
        assert_eq!(
            entries[0].text,
            "Page 1, line 42, \"...[ERROR extracting text: bad stream]...\": needs citation"
        );
    }

    #[test]
    fn page_without_markup_yields_nothing() {
        let mut page = numbered_page();
        page.annotations.remove(0);
        assert!(page_entries(&page, &LineConfig::default()).is_empty());
    }

    struct Pages(Vec<PageContent>);

    impl DocumentSource for Pages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn load_page(&self, page_idx: usize) -> Result<PageContent, DocumentError> {
            self.0
                .get(page_idx)
                .cloned()
                .ok_or(DocumentError::PageOutOfRange {
                    index: page_idx,
                    count: self.0.len(),
                })
        }
    }

    #[test]
    fn report_follows_page_order() -> Result<()> {
        let mut second = numbered_page();
        second.page_idx = 1;
        let source = Pages(vec![numbered_page(), second]);

        let report = build_report(&source, &LineConfig::default())?;
        let pages: Vec<usize> = report.entries.iter().map(|e| e.page_number).collect();
        assert_eq!(pages, vec![1, 2]);

        let summaries = inspect_document(&source, &LineConfig::default())?;
        assert_eq!(summaries[1].markup_annotations, 1);
        assert_eq!(summaries[1].other_annotations, 1);
        Ok(())
    }

    #[test]
    fn document_without_annotations_is_title_only() -> Result<()> {
        let source = Pages(vec![PageContent::new(0, PageGeometry::new(612.0, 792.0))]);
        let report = build_report(&source, &LineConfig::default())?;
        assert_eq!(report.render(), "Comments to the Author\n\n");
        Ok(())
    }

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("/papers/draft.v2.pdf")),
            PathBuf::from("/papers/draft.v2_annotations.txt")
        );
        assert_eq!(
            default_output_path(Path::new("paper.pdf")),
            PathBuf::from("paper_annotations.txt")
        );
    }
}
