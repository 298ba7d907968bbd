//! Content stream interpreter that records where each character lands on the page.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{trace, warn};

use crate::core::error::ContentError;
use crate::core::geometry::BBox;
use crate::core::model::Glyph;
use crate::parser::font::FontMetrics;
use crate::parser::objects::{get, get_array, get_dict, get_name, number, resolve, stream_bytes};

const MAX_FORM_DEPTH: usize = 8;

/// Affine transform `[a b c d e f]` in PDF's row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Maps PDF user space inside `page_box` to top-down page space.
    pub fn flip(page_box: &BBox) -> Self {
        Self::new(1.0, 0.0, 0.0, -1.0, -page_box.x0, page_box.y1)
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        let values: Vec<f64> = operands.iter().filter_map(number).collect();
        match values.as_slice() {
            [a, b, c, d, e, f] => Some(Matrix::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Rc<FontMetrics>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Runs a page's content and returns its glyphs in top-down page space.
pub fn interpret_page<'a>(
    doc: &'a Document,
    content: &[u8],
    resources: Option<&'a Dictionary>,
    page_box: &BBox,
) -> Result<Vec<Glyph>, ContentError> {
    let content = Content::decode(content)?;
    let mut interpreter = Interpreter::new(doc, Matrix::flip(page_box));
    interpreter.run(&content.operations, resources, 0);
    Ok(interpreter.glyphs)
}

struct Interpreter<'a> {
    doc: &'a Document,
    fonts: HashMap<ObjectId, Rc<FontMetrics>>,
    fallback_font: Rc<FontMetrics>,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    run_index: usize,
    glyphs: Vec<Glyph>,
    /// Form XObjects currently being drawn, outermost first.
    forms: Vec<ObjectId>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, ctm: Matrix) -> Self {
        Self {
            doc,
            fonts: HashMap::new(),
            fallback_font: Rc::new(FontMetrics::default()),
            state: GraphicsState::new(ctm),
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            run_index: 0,
            glyphs: Vec::new(),
            forms: Vec::new(),
        }
    }

    fn run(&mut self, operations: &[Operation], resources: Option<&'a Dictionary>, depth: usize) {
        for op in operations {
            self.apply(op, resources, depth);
        }
    }

    fn apply(&mut self, op: &Operation, resources: Option<&'a Dictionary>, depth: usize) {
        let operands = &op.operands;
        let num = |i: usize| operands.get(i).and_then(number).unwrap_or(0.0);

        match op.operator.as_str() {
            "q" => self.saved.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.state.font = self.load_font(resources, name);
                }
                self.state.font_size = num(1);
            }
            "Tc" => self.state.char_spacing = num(0),
            "Tw" => self.state.word_spacing = num(0),
            "Tz" => self.state.horizontal_scale = num(0) / 100.0,
            "TL" => self.state.leading = num(0),
            "Ts" => self.state.rise = num(0),
            "Td" => self.move_line(num(0), num(1)),
            "TD" => {
                self.state.leading = -num(1);
                self.move_line(num(0), num(1));
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
                self.run_index += 1;
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
                self.run_index += 1;
            }
            "\"" => {
                self.state.word_spacing = num(0);
                self.state.char_spacing = num(1);
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
                self.run_index += 1;
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Some(adjust) = number(other) {
                                    let tx = -adjust / 1000.0
                                        * self.state.font_size
                                        * self.state.horizontal_scale;
                                    self.text_matrix =
                                        Matrix::translate(tx, 0.0).then(&self.text_matrix);
                                }
                            }
                        }
                    }
                }
                self.run_index += 1;
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.draw_form(resources, name, depth);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_line(0.0, -leading);
    }

    fn load_font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<Rc<FontMetrics>> {
        let doc = self.doc;
        let fonts = get_dict(doc, resources?, b"Font")?;
        let entry = fonts.get(name).ok()?;
        if let Object::Reference(id) = entry {
            if let Some(cached) = self.fonts.get(id) {
                return Some(Rc::clone(cached));
            }
            let dict = resolve(doc, entry).as_dict().ok()?;
            let metrics = Rc::new(FontMetrics::from_dict(doc, dict));
            self.fonts.insert(*id, Rc::clone(&metrics));
            return Some(metrics);
        }
        let dict = entry.as_dict().ok()?;
        Some(Rc::new(FontMetrics::from_dict(doc, dict)))
    }

    fn show(&mut self, bytes: &[u8]) {
        let font = self
            .state
            .font
            .clone()
            .unwrap_or_else(|| Rc::clone(&self.fallback_font));
        let size = self.state.font_size;
        let scale = self.state.horizontal_scale;

        for code in font.codes(bytes) {
            let advance = font.width(code) / 1000.0;
            let render = Matrix::new(size * scale, 0.0, 0.0, size, 0.0, self.state.rise)
                .then(&self.text_matrix)
                .then(&self.state.ctm);

            let corners = [
                render.apply(0.0, font.descent),
                render.apply(advance, font.descent),
                render.apply(0.0, font.ascent),
                render.apply(advance, font.ascent),
            ];
            let bbox = corners.iter().skip(1).fold(
                BBox::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1),
                |acc, (x, y)| acc.union(&BBox::new(*x, *y, *x, *y)),
            );

            let text = font.decode(code);
            if !text.is_empty() {
                self.glyphs.push(Glyph {
                    text,
                    bbox,
                    font_size: (render.c * render.c + render.d * render.d).sqrt(),
                    run: self.run_index,
                });
            }

            let word_spacing = if code == 32 && !font.is_two_byte() {
                self.state.word_spacing
            } else {
                0.0
            };
            let tx = (advance * size + self.state.char_spacing + word_spacing) * scale;
            self.text_matrix = Matrix::translate(tx, 0.0).then(&self.text_matrix);
        }
    }

    fn draw_form(&mut self, resources: Option<&'a Dictionary>, name: &[u8], depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            warn!(depth, "form XObject nesting too deep, skipping");
            return;
        }
        let doc = self.doc;
        let Some(xobjects) = resources.and_then(|r| get_dict(doc, r, b"XObject")) else {
            return;
        };
        let form_id = match xobjects.get(name) {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        if form_id.is_some_and(|id| self.forms.contains(&id)) {
            warn!(name = %String::from_utf8_lossy(name), "form XObject draws itself, skipping");
            return;
        }
        let Some(Object::Stream(stream)) = get(doc, xobjects, name) else {
            return;
        };
        if get_name(doc, &stream.dict, b"Subtype").as_deref() != Some("Form") {
            return;
        }

        let bytes = match stream_bytes(stream) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%err, "could not read form XObject stream");
                return;
            }
        };
        let content = match Content::decode(&bytes) {
            Ok(content) => content,
            Err(err) => {
                warn!(%err, "could not decode form XObject content");
                return;
            }
        };

        let matrix = get_array(doc, &stream.dict, b"Matrix")
            .and_then(|items| {
                let resolved: Vec<Object> = items.iter().map(|o| resolve(doc, o).clone()).collect();
                Matrix::from_operands(&resolved)
            })
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = get_dict(doc, &stream.dict, b"Resources").or(resources);

        trace!(depth, "entering form XObject");
        let saved_state = self.state.clone();
        let saved_text = (self.text_matrix, self.line_matrix);
        self.state.ctm = matrix.then(&self.state.ctm);
        self.forms.extend(form_id);
        self.run(&content.operations, form_resources, depth + 1);
        if form_id.is_some() {
            self.forms.pop();
        }
        self.state = saved_state;
        (self.text_matrix, self.line_matrix) = saved_text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page_box() -> BBox {
        BBox::new(0.0, 0.0, 612.0, 792.0)
    }

    fn text_of(glyphs: &[Glyph]) -> String {
        glyphs.iter().map(|g| g.text.as_str()).collect()
    }

    #[test]
    fn composes_matrices_in_pdf_order() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translate(10.0, 5.0);
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 7.0));
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 12.0));
        assert_eq!(Matrix::flip(&page_box()).apply(72.0, 700.0), (72.0, 92.0));
    }

    #[test]
    fn places_glyphs_with_default_metrics() {
        let doc = Document::with_version("1.5");
        let glyphs =
            interpret_page(&doc, b"BT /F1 10 Tf 72 700 Td (Hi) Tj ET", None, &page_box()).unwrap();

        assert_eq!(text_of(&glyphs), "Hi");
        assert_eq!(glyphs[0].bbox, BBox::new(72.0, 84.0, 77.0, 94.0));
        assert_eq!(glyphs[1].bbox.x0, 77.0);
        assert_eq!(glyphs[0].font_size, 10.0);
        assert_eq!(glyphs[0].run, glyphs[1].run);
    }

    #[test]
    fn follows_line_moves_and_tj_adjustments() {
        let doc = Document::with_version("1.5");
        let content = b"BT /F1 10 Tf 12 TL 72 700 Td (a) Tj T* [(b) -1000 (c)] TJ ET";
        let glyphs = interpret_page(&doc, content, None, &page_box()).unwrap();

        assert_eq!(text_of(&glyphs), "abc");
        // second line sits 12pt lower
        assert_eq!(glyphs[1].bbox.y0 - glyphs[0].bbox.y0, 12.0);
        // b advances 5pt, the -1000 adjustment a further 10pt
        assert_eq!(glyphs[2].bbox.x0 - glyphs[1].bbox.x0, 15.0);
        assert_ne!(glyphs[0].run, glyphs[1].run);
        assert_eq!(glyphs[1].run, glyphs[2].run);
    }

    #[test]
    fn restores_graphics_state() {
        let doc = Document::with_version("1.5");
        let content = b"q 1 0 0 1 100 0 cm BT /F1 10 Tf 0 700 Td (x) Tj ET Q \
                        BT /F1 10 Tf 0 700 Td (y) Tj ET";
        let glyphs = interpret_page(&doc, content, None, &page_box()).unwrap();
        assert_eq!(glyphs[0].bbox.x0, 100.0);
        assert_eq!(glyphs[1].bbox.x0, 0.0);
    }

    #[test]
    fn skips_forms_that_draw_themselves() {
        use lopdf::{dictionary, Stream};

        let mut doc = Document::with_version("1.5");
        let form_id = doc.new_object_id();
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Fm0" => form_id },
                },
            },
            b"BT /F1 10 Tf 72 700 Td (x) Tj ET /Fm0 Do /Fm0 Do".to_vec(),
        );
        doc.objects.insert(form_id, Object::Stream(form));

        let resources = dictionary! {
            "XObject" => dictionary! { "Fm0" => form_id },
        };
        let glyphs =
            interpret_page(&doc, b"/Fm0 Do /Fm0 Do", Some(&resources), &page_box()).unwrap();
        assert_eq!(text_of(&glyphs), "xx");
    }
}
