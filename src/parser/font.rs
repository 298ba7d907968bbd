//! Just enough font handling to place glyphs and recover their Unicode text.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use tracing::trace;

use crate::parser::objects::{
    get, get_array, get_dict, get_name, get_number, number, resolve, stream_bytes,
};
use crate::parser::standard_fonts::StandardFont;

/// Advance for codes with no declared width, in 1/1000 em.
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;
const DEFAULT_ASCENT: f64 = 0.8;
const DEFAULT_DESCENT: f64 = -0.2;
/// Upper bound on ranges expanded from `/W` arrays and `bfrange` entries.
const MAX_RANGE: u32 = 0xFFFF;

#[derive(Debug, Clone)]
pub struct FontMetrics {
    two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
    /// Built-in metrics for standard fonts declared without `/Widths`.
    standard: Option<&'static StandardFont>,
    /// Glyph space to 1/1000 em; only Type3 fonts differ from 1.
    width_scale: f64,
    /// Glyph box above the baseline, in em.
    pub ascent: f64,
    /// Glyph box below the baseline, in em (negative).
    pub descent: f64,
    to_unicode: Option<ToUnicodeMap>,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: DEFAULT_GLYPH_WIDTH,
            standard: None,
            width_scale: 1.0,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
            to_unicode: None,
        }
    }
}

impl FontMetrics {
    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let mut metrics = Self::default();

        let subtype = get_name(doc, font, b"Subtype");
        if subtype.as_deref() == Some("Type0") {
            metrics.two_byte = true;
            metrics.default_width = DEFAULT_CID_WIDTH;
            let descendant = get_array(doc, font, b"DescendantFonts")
                .and_then(|fonts| fonts.first())
                .and_then(|obj| resolve(doc, obj).as_dict().ok());
            if let Some(cid_font) = descendant {
                if let Some(dw) = get_number(doc, cid_font, b"DW") {
                    metrics.default_width = dw;
                }
                if let Some(w) = get_array(doc, cid_font, b"W") {
                    metrics.cid_widths = parse_cid_widths(doc, w);
                }
                if let Some(descriptor) = get_dict(doc, cid_font, b"FontDescriptor") {
                    metrics.apply_descriptor(doc, descriptor);
                }
            }
        } else {
            if let Some(standard) = get_name(doc, font, b"BaseFont")
                .as_deref()
                .and_then(StandardFont::lookup)
            {
                metrics.standard = Some(standard);
                metrics.ascent = standard.ascent;
                metrics.descent = standard.descent;
            }
            if subtype.as_deref() == Some("Type3") {
                let scale = get_array(doc, font, b"FontMatrix")
                    .and_then(|m| m.first())
                    .and_then(|a| number(resolve(doc, a)))
                    .filter(|a| a.is_finite() && *a != 0.0);
                if let Some(a) = scale {
                    metrics.width_scale = a.abs() * 1000.0;
                }
            }
            metrics.first_char = get_number(doc, font, b"FirstChar")
                .map(|c| c.max(0.0) as u32)
                .unwrap_or(0);
            if let Some(widths) = get_array(doc, font, b"Widths") {
                metrics.widths = widths
                    .iter()
                    .map(|w| number(resolve(doc, w)).unwrap_or(0.0))
                    .collect();
            }
            if let Some(descriptor) = get_dict(doc, font, b"FontDescriptor") {
                metrics.apply_descriptor(doc, descriptor);
            }
        }

        if let Some(Object::Stream(stream)) = get(doc, font, b"ToUnicode") {
            if let Ok(data) = stream_bytes(stream) {
                let map = ToUnicodeMap::parse(&data);
                trace!(entries = map.len(), "parsed ToUnicode CMap");
                if !map.is_empty() {
                    metrics.to_unicode = Some(map);
                }
            }
        }

        metrics
    }

    fn apply_descriptor(&mut self, doc: &Document, descriptor: &Dictionary) {
        if let Some(missing) = get_number(doc, descriptor, b"MissingWidth") {
            if missing > 0.0 {
                self.default_width = missing;
            }
        }
        if let Some(ascent) = get_number(doc, descriptor, b"Ascent") {
            if ascent > 0.0 {
                self.ascent = ascent / 1000.0;
            }
        }
        if let Some(descent) = get_number(doc, descriptor, b"Descent") {
            if descent < 0.0 {
                self.descent = descent / 1000.0;
            }
        }
    }

    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Splits a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
                .collect()
        } else {
            bytes.iter().map(|&b| b as u32).collect()
        }
    }

    /// Horizontal advance in 1/1000 em.
    pub fn width(&self, code: u32) -> f64 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        let declared = code
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0);
        match (declared, self.standard) {
            (Some(w), _) => w * self.width_scale,
            (None, Some(standard)) if self.widths.is_empty() => standard.width(code),
            (None, _) => self.default_width * self.width_scale,
        }
    }

    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|map| map.get(code)) {
            return text.to_string();
        }
        if self.two_byte {
            return char::from_u32(code)
                .filter(|c| !c.is_control())
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string();
        }
        win_ansi(code as u8).to_string()
    }
}

/// WinAnsiEncoding, which matches Latin-1 outside 0x80..=0x9F.
fn win_ansi(byte: u8) -> char {
    match byte {
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x8E => 'Ž',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9E => 'ž',
        0x9F => 'Ÿ',
        b => b as char,
    }
}

/// Parses a `/W` array: `c [w1 w2 ...]` and `c_first c_last w` entries.
fn parse_cid_widths(doc: &Document, entries: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = number(resolve(doc, &entries[i])) else {
            break;
        };
        let first = first.max(0.0) as u32;
        match entries.get(i + 1).map(|obj| resolve(doc, obj)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let Some(code) = first.checked_add(offset as u32) else {
                        break;
                    };
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    number(last),
                    entries.get(i + 2).and_then(|obj| number(resolve(doc, obj))),
                ) else {
                    break;
                };
                let last = last.max(0.0) as u32;
                if last < first || last - first > MAX_RANGE {
                    break;
                }
                for code in first..=last {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Character code to Unicode mapping from a `/ToUnicode` CMap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeMap {
    map: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

impl ToUnicodeMap {
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize_cmap(data);
        let mut map = HashMap::new();
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                CMapToken::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(src)), Some(CMapToken::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        map.insert(code_of(src), utf16_text(dst));
                        i += 2;
                    }
                }
                CMapToken::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(lo)), Some(CMapToken::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let (lo, hi) = (code_of(lo), code_of(hi));
                        i += 2;
                        match tokens.get(i) {
                            Some(CMapToken::Hex(dst)) => {
                                if hi >= lo && hi - lo <= MAX_RANGE {
                                    for (offset, code) in (lo..=hi).enumerate() {
                                        map.insert(code, offset_utf16(dst, offset as u32));
                                    }
                                }
                                i += 1;
                            }
                            Some(CMapToken::ArrayStart) => {
                                i += 1;
                                let mut code = lo;
                                while let Some(CMapToken::Hex(dst)) = tokens.get(i) {
                                    if code <= hi {
                                        map.insert(code, utf16_text(dst));
                                    }
                                    code = code.saturating_add(1);
                                    i += 1;
                                }
                                if tokens.get(i) == Some(&CMapToken::ArrayEnd) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }
        Self { map }
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

/// Destination of the `offset`-th code in a `bfrange`: the last UTF-16 unit is incremented.
fn offset_utf16(bytes: &[u8], offset: u32) -> String {
    let mut units = utf16_units(bytes);
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'<' | b'>' | b'[' | b']' | b'(' | b')' | b'/' | b'%' | b'{' | b'}')
}

fn tokenize_cmap(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        match b {
            _ if b.is_ascii_whitespace() => i += 1,
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' => i += 1,
            b'<' => {
                i += 1;
                let mut digits = Vec::new();
                while i < data.len() && data[i] != b'>' {
                    if data[i].is_ascii_hexdigit() {
                        digits.push(data[i]);
                    }
                    i += 1;
                }
                i += 1;
                if digits.len() % 2 == 1 {
                    digits.push(b'0');
                }
                let bytes = digits
                    .chunks(2)
                    .filter_map(|pair| std::str::from_utf8(pair).ok())
                    .filter_map(|hex| u8::from_str_radix(hex, 16).ok())
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
            }
            b'[' => {
                tokens.push(CMapToken::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::ArrayEnd);
                i += 1;
            }
            b'(' => {
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
            }
            _ => {
                let start = i;
                i += 1;
                while i < data.len() && !data[i].is_ascii_whitespace() && !is_delimiter(data[i]) {
                    i += 1;
                }
                tokens.push(CMapToken::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }
    tokens
}
