//! Small helpers for walking lopdf object graphs.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::core::geometry::BBox;

const MAX_REFERENCE_DEPTH: usize = 16;

/// Follows indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return current,
            },
            _ => return current,
        }
    }
    current
}

pub(crate) fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match get(doc, dict, key)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

pub(crate) fn get_array<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Vec<Object>> {
    match get(doc, dict, key)? {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

pub(crate) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    get(doc, dict, key).and_then(number)
}

pub(crate) fn get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match get(doc, dict, key)? {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Reads a four-number rectangle array, corners in any order. Coordinates stay in user space.
pub(crate) fn rect(doc: &Document, obj: &Object) -> Option<BBox> {
    let Object::Array(items) = resolve(doc, obj) else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }
    let values: Vec<f64> = items
        .iter()
        .filter_map(|item| number(resolve(doc, item)))
        .collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => Some(BBox::from_corners(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

/// Looks up `key` on the page, walking up the `/Parent` chain for inheritable attributes.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_REFERENCE_DEPTH {
        let dict = doc.get_object(current).and_then(|o| o.as_dict()).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
    }
    None
}

/// Stream payload, decompressed when a filter is declared.
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, lopdf::Error> {
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content()
    } else {
        Ok(stream.content.clone())
    }
}

/// Decodes a PDF text string: UTF-16BE with BOM, else UTF-8, else Latin-1.
pub(crate) fn text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_text_strings() {
        assert_eq!(text_string(b"plain"), "plain");
        assert_eq!(text_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
        assert_eq!(text_string(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }

    #[test]
    fn reads_rectangles_in_any_corner_order() {
        let doc = Document::with_version("1.5");
        let obj = Object::Array(vec![
            Object::Integer(100),
            Object::Real(20.5),
            Object::Integer(10),
            Object::Integer(5),
        ]);
        assert_eq!(rect(&doc, &obj), Some(BBox::new(10.0, 5.0, 100.0, 20.5)));
        assert_eq!(rect(&doc, &Object::Array(vec![Object::Integer(1)])), None);
    }
}
