pub mod annotations;
pub mod content;
pub mod font;
pub mod layout_builder;
pub(crate) mod objects;
pub mod pdf_reader;
pub mod standard_fonts;
pub mod text_extractor;

pub use pdf_reader::PdfReader;

use crate::core::error::DocumentError;
use crate::core::model::PageContent;

/// Page-by-page access to a document. Pages are materialized one at a time so callers can drop
/// each page once it has been processed.
pub trait DocumentSource {
    fn page_count(&self) -> usize;

    fn load_page(&self, page_idx: usize) -> Result<PageContent, DocumentError>;
}
