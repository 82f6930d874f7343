//! Digital text layer extraction backed by lopdf.
//!
//! Walks each page's content stream, tracking the graphics state (`q`, `Q`,
//! `cm`) and the text matrix, and emits one fragment per text-showing
//! operator. PDF user space has its origin at the bottom-left with y growing
//! upward; fragments are mapped into the page as displayed (after `/Rotate`)
//! with a top-left origin so they line up with OCR word boxes.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect;
use crate::error::{Error, Result};
use crate::model::TextFragment;

use super::source::{DigitalPage, DigitalTextSource};

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Ascender height as a fraction of the font size.
const ASCENT: f32 = 0.8;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.5;

/// TJ adjustments beyond this (thousandths of an em) read as word spaces.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A [`DigitalTextSource`] reading a PDF with lopdf.
pub struct LopdfTextSource {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
}

impl LopdfTextSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        detect::sniff_file(&path)?;
        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Load a PDF held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect::sniff_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        let pages = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages })
    }

    /// Declared PDF version.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages
            .get(index)
            .copied()
            .ok_or(Error::PageOutOfRange(index as u32 + 1, self.pages.len() as u32))
    }

    /// Look up an inheritable page attribute, following `Parent` links.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..16 {
            if let Ok(obj) = dict.get(key) {
                return match obj {
                    Object::Reference(r) => self.doc.get_object(*r).ok(),
                    other => Some(other),
                };
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// MediaBox of a page as (llx, lly, urx, ury).
    fn media_box(&self, page_id: ObjectId) -> Option<[f32; 4]> {
        let arr = self.inherited(page_id, b"MediaBox")?.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        let mut rect = [0.0; 4];
        for (slot, value) in rect.iter_mut().zip(arr) {
            *slot = get_number(value)?;
        }
        Some(rect)
    }

    /// Clockwise display rotation of a page, normalized to 0/90/180/270.
    fn rotation(&self, page_id: ObjectId) -> i64 {
        match self.inherited(page_id, b"Rotate") {
            Some(Object::Integer(r)) => (r.rem_euclid(360) / 90) * 90,
            Some(Object::Real(r)) => ((*r as i64).rem_euclid(360) / 90) * 90,
            _ => 0,
        }
    }

    /// Decompressed content stream bytes of a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without Contents is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        let mut content = Vec::new();
        let refs: Vec<ObjectId> = match contents {
            Object::Reference(r) => vec![*r],
            Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => return Err(Error::PdfParse("Invalid content stream".to_string())),
        };
        for r in refs {
            if let Ok(Object::Stream(s)) = self.doc.get_object(r) {
                let data = s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone());
                content.extend_from_slice(&data);
                content.push(b' ');
            }
        }
        Ok(content)
    }

    /// Positioned glyph runs of a page, in PDF user space.
    fn glyph_runs(&self, page_id: ObjectId) -> Result<Vec<GlyphRun>> {
        let content = self.page_content(page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let fonts: BTreeMap<Vec<u8>, &Dictionary> =
            self.doc.get_page_fonts(page_id).unwrap_or_default();
        let content = lopdf::content::Content::decode(&content)
            .map_err(|e| Error::TextExtract(e.to_string()))?;

        let mut runs = Vec::new();
        let mut state = TextState::default();
        let mut saved: Vec<(Matrix, f32)> = Vec::new();
        let mut encoding = None;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => saved.push((state.ctm, state.font_size)),
                "Q" => {
                    // An unbalanced Q leaves the state alone.
                    if let Some((ctm, font_size)) = saved.pop() {
                        state.ctm = ctm;
                        state.font_size = font_size;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        state.ctm = m.concat(&state.ctm);
                    }
                }
                "BT" => {
                    // Leading is text state and survives BT.
                    state.in_text = true;
                    state.matrix = TextMatrix {
                        leading: state.matrix.leading,
                        ..TextMatrix::default()
                    };
                }
                "ET" => state.in_text = false,
                "Tf" => {
                    if let (Some(Object::Name(name)), Some(size)) =
                        (operands.first(), operands.get(1).and_then(get_number))
                    {
                        encoding = fonts
                            .get(name)
                            .and_then(|f| f.get_font_encoding(&self.doc).ok());
                        state.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(get_number) {
                        state.matrix.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    let tx = operands.first().and_then(get_number).unwrap_or(0.0);
                    let ty = operands.get(1).and_then(get_number).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.matrix.leading = -ty;
                    }
                    state.matrix.translate(tx, ty);
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        state.matrix.set(m.a, m.b, m.c, m.d, m.e, m.f);
                    }
                }
                "T*" => state.matrix.next_line(),
                "Tj" | "TJ" | "'" | "\"" => {
                    if matches!(op.operator.as_str(), "'" | "\"") {
                        state.matrix.next_line();
                    }
                    if !state.in_text {
                        continue;
                    }
                    let decode = |bytes: &[u8]| match &encoding {
                        Some(enc) => LopdfDocument::decode_text(enc, bytes)
                            .unwrap_or_else(|_| decode_text_simple(bytes)),
                        None => decode_text_simple(bytes),
                    };
                    let text = match (op.operator.as_str(), operands.as_slice()) {
                        ("TJ", [Object::Array(items), ..]) => show_array(items, decode),
                        ("\"", [_, _, Object::String(bytes, _), ..]) => decode(bytes),
                        (_, [Object::String(bytes, _), ..]) => decode(bytes),
                        _ => String::new(),
                    };
                    state.show(text, &mut runs);
                }
                _ => {}
            }
        }

        Ok(runs)
    }
}

impl DigitalTextSource for LopdfTextSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_page(&self, index: usize) -> Result<DigitalPage> {
        let page_id = self.page_id(index)?;
        let media_box = self.media_box(page_id).unwrap_or([
            0.0,
            0.0,
            DEFAULT_PAGE_SIZE.0,
            DEFAULT_PAGE_SIZE.1,
        ]);
        let view = PageView::new(media_box, self.rotation(page_id));

        let fragments = self
            .glyph_runs(page_id)?
            .into_iter()
            .map(|run| {
                let glyph_height = run.size.max(1.0);
                let (x, baseline) = view.transform.apply(run.x, run.y);
                TextFragment::digital(
                    run.text,
                    x,
                    baseline - glyph_height * ASCENT,
                    run.width,
                    glyph_height,
                )
            })
            .collect();

        Ok(DigitalPage {
            width: view.width,
            height: view.height,
            fragments,
        })
    }
}

/// Maps PDF user space onto the displayed page: top-left origin, y down,
/// `/Rotate` applied clockwise.
#[derive(Debug, Clone, Copy)]
struct PageView {
    transform: Matrix,
    width: f32,
    height: f32,
}

impl PageView {
    fn new(media_box: [f32; 4], rotation: i64) -> Self {
        let [x0, y0, x1, y1] = media_box;
        let (llx, urx) = (x0.min(x1), x0.max(x1));
        let (lly, ury) = (y0.min(y1), y0.max(y1));
        let (width, height) = (urx - llx, ury - lly);

        let (transform, width, height) = match rotation {
            90 => (Matrix::new(0.0, 1.0, 1.0, 0.0, -lly, -llx), height, width),
            180 => (Matrix::new(-1.0, 0.0, 0.0, 1.0, urx, -lly), width, height),
            270 => (Matrix::new(0.0, -1.0, -1.0, 0.0, ury, urx), height, width),
            _ => (Matrix::new(1.0, 0.0, 0.0, -1.0, -llx, ury), width, height),
        };
        Self {
            transform,
            width,
            height,
        }
    }
}

/// A decoded text run at its baseline origin.
#[derive(Debug, Clone)]
struct GlyphRun {
    text: String,
    x: f32,
    y: f32,
    width: f32,
    size: f32,
}

#[derive(Debug, Clone)]
struct TextState {
    /// Current transformation matrix
    ctm: Matrix,
    matrix: TextMatrix,
    font_size: f32,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            matrix: TextMatrix::default(),
            font_size: 12.0,
            in_text: false,
        }
    }
}

impl TextState {
    /// Record a shown string in user space and advance the pen past it.
    fn show(&mut self, text: String, runs: &mut Vec<GlyphRun>) {
        let advance = text.chars().count() as f32 * self.font_size * GLYPH_ADVANCE;
        let rendering = self.matrix.current().concat(&self.ctm);
        if !text.trim().is_empty() {
            let (x, y) = rendering.apply(0.0, 0.0);
            runs.push(GlyphRun {
                text: text.trim().to_string(),
                x,
                y,
                width: advance * rendering.x_scale(),
                size: self.font_size * rendering.y_scale(),
            });
        }
        self.matrix.e += advance * self.matrix.a;
        self.matrix.f += advance * self.matrix.b;
    }
}

/// Affine transform `[a b c d e f]` applied to row vectors, as in PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The six numeric operands of `cm` or `Tm`.
    fn from_operands(operands: &[Object]) -> Option<Self> {
        match operands {
            [a, b, c, d, e, f, ..] => Some(Self::new(
                get_number(a)?,
                get_number(b)?,
                get_number(c)?,
                get_number(d)?,
                get_number(e)?,
                get_number(f)?,
            )),
            _ => None,
        }
    }

    /// `self` followed by `other`.
    fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn x_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn y_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text matrix plus the leading used by T*, ' and ".
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    /// Start of the current line, which Td and T* move from
    line_e: f32,
    line_f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_e = e;
        self.line_f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 { self.leading } else { 12.0 };
        self.translate(0.0, -leading);
    }

    fn current(&self) -> Matrix {
        Matrix::new(self.a, self.b, self.c, self.d, self.e, self.f)
    }
}

/// Concatenate a TJ array, turning wide negative kerning into spaces.
fn show_array(items: &[Object], decode: impl Fn(&[u8]) -> String) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode(bytes)),
            other => {
                if let Some(n) = get_number(other) {
                    if -n > TJ_SPACE_THRESHOLD && !combined.is_empty() && !combined.ends_with(' ') {
                        combined.push(' ');
                    }
                }
            }
        }
    }
    combined
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode string bytes when the font has no usable encoding: UTF-16BE with
/// BOM, then UTF-8, then Latin-1.
fn decode_text_simple(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
