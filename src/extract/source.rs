//! Collaborator interfaces: digital text layers, rasterizers and OCR engines.
//!
//! The pipeline depends only on these traits. Concrete adapters live in
//! [`super::lopdf_source`] and [`super::external`]; tests substitute mocks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::TextFragment;

/// Digital text of one page, in top-left-origin coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DigitalPage {
    /// Page width
    pub width: f32,
    /// Page height
    pub height: f32,
    /// Positioned fragments
    pub fragments: Vec<TextFragment>,
}

/// Source of a document's native text layer.
pub trait DigitalTextSource {
    /// Number of physical pages.
    fn page_count(&self) -> usize;

    /// Extract one page by 0-based index.
    fn extract_page(&self, index: usize) -> Result<DigitalPage>;
}

/// Axis-aligned box with a top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    /// Recognized text
    pub text: String,
    /// Word confidence (0-100)
    pub confidence: f32,
    /// Word box in image pixels
    pub bbox: BoundingBox,
}

/// Recognition result for one page image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    /// Image width in pixels
    pub width: f32,
    /// Image height in pixels
    pub height: f32,
    /// Page-level confidence (0-100)
    pub confidence: f32,
    /// Recognized words
    pub words: Vec<OcrWord>,
}

impl OcrPage {
    /// Convert word boxes into OCR fragments.
    pub fn to_fragments(&self) -> Vec<TextFragment> {
        self.words
            .iter()
            .filter(|w| !w.text.trim().is_empty())
            .map(|w| {
                TextFragment::ocr(
                    w.text.trim(),
                    w.bbox.x,
                    w.bbox.y,
                    w.bbox.width,
                    w.bbox.height,
                    w.confidence,
                )
            })
            .collect()
    }

    /// Whether recognition produced any usable text.
    pub fn has_text(&self) -> bool {
        self.words.iter().any(|w| !w.text.trim().is_empty())
    }
}

/// An OCR engine with an explicit lifecycle.
///
/// `acquire` is called once per document before the first `recognize`, and
/// `release` exactly once afterwards, also when pages failed.
pub trait OcrEngine: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    /// Prepare the engine (load models, spawn workers, check binaries).
    fn acquire(&self) -> Result<()>;

    /// Recognize one page image.
    fn recognize(&self, image: &Path) -> Result<OcrPage>;

    /// Tear the engine down.
    fn release(&self);
}

/// A rendered page image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// 0-based page index
    pub index: usize,
    /// Image file
    pub path: PathBuf,
}

/// Renders PDF pages to images for OCR.
pub trait Rasterizer: Send + Sync {
    /// Render one page (0-based index) at `dpi`.
    fn render_page(&self, index: usize, dpi: u32) -> Result<RasterImage>;

    /// Delete a rendered image.
    fn cleanup(&self, image: &RasterImage);
}
