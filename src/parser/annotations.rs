use lopdf::{Document, Object, ObjectId};
use tracing::trace;

use crate::core::geometry::BBox;
use crate::core::model::{Annotation, AnnotationKind};
use crate::parser::objects::{get, get_array, get_name, rect, resolve, text_string};

/// Reads the page's `/Annots` array in document order. Rectangles are mapped into the
/// top-down space of `page_box`. Entries without a subtype or a usable `/Rect` are skipped.
pub fn page_annotations(doc: &Document, page_id: ObjectId, page_box: &BBox) -> Vec<Annotation> {
    let Ok(page) = doc.get_object(page_id).and_then(|o| o.as_dict()) else {
        return Vec::new();
    };
    let Some(entries) = get_array(doc, page, b"Annots") else {
        return Vec::new();
    };

    let mut annotations = Vec::new();
    for entry in entries {
        let Object::Dictionary(dict) = resolve(doc, entry) else {
            trace!("skipping non-dictionary annotation entry");
            continue;
        };
        let Some(subtype) = get_name(doc, dict, b"Subtype") else {
            trace!("skipping annotation without /Subtype");
            continue;
        };
        let Some(raw) = dict.get(b"Rect").ok().and_then(|r| rect(doc, r)) else {
            trace!(subtype = %subtype, "skipping annotation without a usable /Rect");
            continue;
        };
        let comment = match get(doc, dict, b"Contents") {
            Some(Object::String(bytes, _)) => Some(text_string(bytes)),
            _ => None,
        };

        annotations.push(Annotation {
            kind: AnnotationKind::from_subtype(&subtype),
            rect: raw.to_top_down(page_box),
            comment,
        });
    }
    annotations
}
