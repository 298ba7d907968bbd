use crate::core::error::ExtractError;
use crate::core::model::AnnotationKind;

/// Flattens line breaks and whitespace runs to single spaces, trims, and swaps `"` for `'`
/// so the text can sit inside the report's double-quoted literals.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('"', "'")
}

/// `"...text..."`, or nothing at all for empty text.
pub fn with_ellipsis(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        String::new()
    } else {
        format!("\"...{text}...\"")
    }
}

/// Text to report for an annotation, with a placeholder in place of a failed extraction.
pub fn covered_text(extracted: &Result<String, ExtractError>) -> String {
    match extracted {
        Ok(text) => text.clone(),
        Err(err) => format!("[ERROR extracting text: {err}]"),
    }
}

/// Formats one report line, or `None` for annotation kinds the report ignores.
pub fn format_entry(
    kind: &AnnotationKind,
    extracted: &Result<String, ExtractError>,
    comment: Option<&str>,
    page_number: usize,
    line: Option<usize>,
) -> Option<String> {
    let quoted = with_ellipsis(&normalize_text(&covered_text(extracted)));
    let comment = normalize_text(comment.unwrap_or_default());
    let line = line.map(|l| l.to_string()).unwrap_or_default();

    let entry = match kind {
        AnnotationKind::StrikeOut if comment.is_empty() => {
            format!("Page {page_number}, line {line}: strike out {quoted}")
        }
        AnnotationKind::StrikeOut => {
            format!("Page {page_number}, line {line}: substitute {quoted} for \"{comment}\"")
        }
        AnnotationKind::Highlight | AnnotationKind::Underline | AnnotationKind::Squiggly => {
            format!("Page {page_number}, line {line}, {quoted}: {comment}")
        }
        AnnotationKind::Other(_) => return None,
    };
    Some(entry)
}
