//! Margin OCR for digital pages whose line numbers are drawn as images.
//!
//! Many transcripts carry a real text layer for the testimony but stamp the
//! line-number column as graphics. Such a page passes the extraction policy
//! yet yields no line numbers. For these pages the body stays digital and
//! only the left-margin numbers (plus header/footer labels, for the printed
//! page number) are taken from OCR of the page image.

use crate::model::TextFragment;

use super::classifier::is_line_number;
use super::options::MarginConfig;
use super::source::{DigitalPage, OcrPage};

/// Column widths tried, as fractions of page width.
pub const MARGIN_CANDIDATES: [f32; 4] = [0.06, 0.08, 0.10, 0.12];

/// Lines on a typical transcript page.
pub const IDEAL_LINE_COUNT: usize = 25;

/// Digital line numbers below which a page gets margin OCR.
pub const MIN_DIGITAL_LINE_NUMBERS: usize = 2;

/// Line numbers found in one margin column.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginScan {
    /// Column width as a fraction of page width
    pub margin: f32,
    /// Line numbers, top to bottom
    pub line_numbers: Vec<TextFragment>,
    /// Count near [`IDEAL_LINE_COUNT`] weighted by mean confidence
    pub score: f32,
}

/// A digital page combined with OCR of its margins.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridPage {
    /// Digital fragments outside the line-number column, plus OCR line numbers
    pub fragments: Vec<TextFragment>,
    /// OCR header and footer words, in page coordinates
    pub labels: Vec<TextFragment>,
    /// Column chosen by the adaptive search
    pub margin: f32,
    /// Number of OCR line numbers merged in
    pub line_numbers: usize,
}

/// Map OCR word boxes from image pixels into page coordinates.
pub fn scale_to_page(ocr: &OcrPage, width: f32, height: f32) -> Vec<TextFragment> {
    let sx = if ocr.width > 0.0 { width / ocr.width } else { 1.0 };
    let sy = if ocr.height > 0.0 { height / ocr.height } else { 1.0 };
    ocr.to_fragments()
        .into_iter()
        .map(|mut f| {
            f.x *= sx;
            f.y *= sy;
            f.width *= sx;
            f.height *= sy;
            f
        })
        .collect()
}

/// Line numbers inside a left column `margin` wide, between the header and
/// footer bands.
pub fn scan_margin(
    words: &[TextFragment],
    width: f32,
    height: f32,
    margins: &MarginConfig,
    margin: f32,
) -> MarginScan {
    let mut line_numbers: Vec<TextFragment> = words
        .iter()
        .filter(|w| {
            let cy = w.center_y();
            w.center_x() < width * margin
                && cy >= height * margins.top
                && cy <= height * margins.bottom
                && is_line_number(w.text.trim())
        })
        .cloned()
        .collect();
    line_numbers.sort_by(|a, b| a.y.total_cmp(&b.y));

    let score = margin_score(&line_numbers);
    MarginScan {
        margin,
        line_numbers,
        score,
    }
}

fn margin_score(line_numbers: &[TextFragment]) -> f32 {
    if line_numbers.is_empty() {
        return 0.0;
    }
    let count = line_numbers.len() as f32;
    let ideal = IDEAL_LINE_COUNT as f32;
    let mean_confidence = line_numbers.iter().map(|f| f.confidence).sum::<f32>() / count;
    let closeness = (1.0 - (count - ideal).abs() / ideal).max(0.0);
    count * closeness * mean_confidence / 100.0
}

/// Try each candidate column no wider than the configured left margin and
/// keep the best-scoring one. The first candidate wins ties.
pub fn adaptive_scan(
    words: &[TextFragment],
    width: f32,
    height: f32,
    margins: &MarginConfig,
) -> MarginScan {
    let mut candidates: Vec<f32> = MARGIN_CANDIDATES
        .iter()
        .copied()
        .filter(|m| *m <= margins.left)
        .collect();
    if candidates.is_empty() {
        candidates.push(margins.left);
    }

    let mut best: Option<MarginScan> = None;
    for margin in candidates {
        let scan = scan_margin(words, width, height, margins, margin);
        log::trace!(
            "margin {:.2}: {} line numbers, score {:.2}",
            margin,
            scan.line_numbers.len(),
            scan.score
        );
        if best.as_ref().map_or(true, |b| scan.score > b.score) {
            best = Some(scan);
        }
    }
    best.unwrap_or(MarginScan {
        margin: margins.left,
        line_numbers: Vec::new(),
        score: 0.0,
    })
}

/// Keep a digital page's body, header and footer text and take its line
/// numbers from OCR.
///
/// Digital text inside the line-number column is dropped; OCR words outside
/// it are ignored except header/footer words, which are returned as labels.
pub fn combine(digital: &DigitalPage, ocr: &OcrPage, margins: &MarginConfig) -> HybridPage {
    let (width, height) = (digital.width, digital.height);
    let words = scale_to_page(ocr, width, height);
    let scan = adaptive_scan(&words, width, height, margins);

    let in_bands = |f: &TextFragment| {
        let cy = f.center_y();
        cy < height * margins.top || cy > height * margins.bottom
    };

    let mut fragments: Vec<TextFragment> = digital
        .fragments
        .iter()
        .filter(|f| in_bands(f) || f.center_x() >= width * margins.left)
        .cloned()
        .collect();
    let line_numbers = scan.line_numbers.len();
    fragments.extend(scan.line_numbers);

    let labels = words.into_iter().filter(|f| in_bands(f)).collect();

    HybridPage {
        fragments,
        labels,
        margin: scan.margin,
        line_numbers,
    }
}
