use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::core::error::{ContentError, DocumentError};
use crate::core::geometry::BBox;
use crate::core::model::{PageContent, PageGeometry};
use crate::parser::annotations::page_annotations;
use crate::parser::content::interpret_page;
use crate::parser::layout_builder::LayoutBuilder;
use crate::parser::objects::{inherited, rect, resolve, stream_bytes};
use crate::parser::DocumentSource;

/// An opened PDF with its page ids cached in page order.
#[derive(Debug)]
pub struct PdfReader {
    path: PathBuf,
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(DocumentError::NotFound(path));
        }
        let doc = Document::load(&path).map_err(|source| DocumentError::Load {
            path: path.clone(),
            source,
        })?;
        let reader = Self::from_document(path, doc);
        debug!(path = %reader.path.display(), pages = reader.page_ids.len(), "opened PDF");
        Ok(reader)
    }

    /// Opens an in-memory document. `path` only labels errors and logs.
    pub fn load_mem(bytes: &[u8], path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let doc = Document::load_mem(bytes).map_err(|source| DocumentError::Load {
            path: path.clone(),
            source,
        })?;
        Ok(Self::from_document(path, doc))
    }

    fn from_document(path: PathBuf, doc: Document) -> Self {
        let page_ids = doc.get_pages().into_values().collect();
        Self {
            path,
            doc,
            page_ids,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page_id(&self, page_idx: usize) -> Result<ObjectId, DocumentError> {
        self.page_ids
            .get(page_idx)
            .copied()
            .ok_or(DocumentError::PageOutOfRange {
                index: page_idx,
                count: self.page_ids.len(),
            })
    }

    fn page_dict(&self, page_idx: usize, page_id: ObjectId) -> Result<&Dictionary, DocumentError> {
        self.doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| DocumentError::Page {
                page: page_idx + 1,
                message: format!("page object unreadable: {e}"),
            })
    }

    /// CropBox when the page declares one, else the (possibly inherited) MediaBox.
    fn page_box(&self, page_idx: usize, page_id: ObjectId) -> Result<BBox, DocumentError> {
        let page = self.page_dict(page_idx, page_id)?;
        let crop = page.get(b"CropBox").ok().and_then(|o| rect(&self.doc, o));
        crop.or_else(|| {
            inherited(&self.doc, page_id, b"MediaBox").and_then(|o| rect(&self.doc, o))
        })
        .filter(|b| b.is_finite() && b.width() > 0.0 && b.height() > 0.0)
        .ok_or_else(|| DocumentError::Page {
            page: page_idx + 1,
            message: "missing or degenerate MediaBox".to_string(),
        })
    }

    /// Concatenated content streams of the page. Arrays of streams are joined with a space.
    fn page_content(&self, page: &Dictionary) -> Result<Vec<u8>, ContentError> {
        let Ok(contents) = page.get(b"Contents") else {
            return Ok(Vec::new());
        };
        match resolve(&self.doc, contents) {
            Object::Stream(stream) => Ok(stream_bytes(stream)?),
            Object::Array(parts) => {
                let mut bytes = Vec::new();
                for part in parts {
                    let Object::Stream(stream) = resolve(&self.doc, part) else {
                        return Err(ContentError::Malformed(
                            "/Contents array entry is not a stream".to_string(),
                        ));
                    };
                    if !bytes.is_empty() {
                        bytes.push(b' ');
                    }
                    bytes.extend(stream_bytes(stream)?);
                }
                Ok(bytes)
            }
            Object::Null => Ok(Vec::new()),
            _ => Err(ContentError::Malformed(
                "/Contents is neither a stream nor an array".to_string(),
            )),
        }
    }

    fn resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        match inherited(&self.doc, page_id, b"Resources")? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

impl DocumentSource for PdfReader {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn load_page(&self, page_idx: usize) -> Result<PageContent, DocumentError> {
        let page_id = self.page_id(page_idx)?;
        let page_box = self.page_box(page_idx, page_id)?;
        let page = self.page_dict(page_idx, page_id)?;

        let mut content = PageContent::new(
            page_idx,
            PageGeometry::new(page_box.width(), page_box.height()),
        );

        let glyphs = self.page_content(page).and_then(|bytes| {
            interpret_page(&self.doc, &bytes, self.resources(page_id), &page_box)
        });
        match glyphs {
            Ok(glyphs) => {
                let layout = LayoutBuilder::new().build(&glyphs);
                content.words = layout.words;
                content.blocks = layout.blocks;
                content.glyphs = glyphs;
            }
            Err(err) => {
                warn!(page = page_idx + 1, error = %err, "page content could not be interpreted");
                content.content_error = Some(err.to_string());
            }
        }

        content.annotations = page_annotations(&self.doc, page_id, &page_box);
        debug!(
            page = page_idx + 1,
            glyphs = content.glyphs.len(),
            words = content.words.len(),
            annotations = content.annotations.len(),
            "loaded page"
        );
        Ok(content)
    }
}
