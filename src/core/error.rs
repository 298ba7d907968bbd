use std::path::PathBuf;

use thiserror::Error;

/// Failures at the document boundary. All of them abort the run.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("PDF file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("malformed page {page}: {message}")]
    Page { page: usize, message: String },
}

/// Failure to read the text under an annotation. Recovered per annotation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractError {
    #[error("region has non-finite coordinates")]
    InvalidRegion,

    #[error("{0}")]
    Content(String),
}

/// Failure to interpret a page's content stream. Recovered per page.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to decode content stream: {0}")]
    Decode(#[from] lopdf::Error),

    #[error("malformed page content: {0}")]
    Malformed(String),
}
