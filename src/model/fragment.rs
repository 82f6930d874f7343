//! Positioned text fragments.

use serde::{Deserialize, Serialize};

/// Where a fragment's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMethod {
    /// Native text layer of the PDF
    #[default]
    Digital,
    /// OCR of a rasterized page image
    Ocr,
}

/// A positioned unit of text with a bounding box.
///
/// Coordinates use a top-left origin with y increasing downward, whatever
/// the source. Confidence is on a 0-100 scale and is always 100 for digital
/// text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFragment {
    /// The text content
    pub text: String,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
    /// Recognition confidence (0-100)
    pub confidence: f32,
    /// Source of the text
    pub source_method: SourceMethod,
}

impl TextFragment {
    /// Create a fragment from the digital text layer.
    pub fn digital(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
            confidence: 100.0,
            source_method: SourceMethod::Digital,
        }
    }

    /// Create a fragment from an OCR word box.
    pub fn ocr(
        text: impl Into<String>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        confidence: f32,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
            confidence: confidence.clamp(0.0, 100.0),
            source_method: SourceMethod::Ocr,
        }
    }

    /// Horizontal center of the bounding box.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical center of the bounding box.
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Whether the text carries at least one ASCII letter or digit.
    pub fn is_meaningful(&self) -> bool {
        self.text.chars().any(|c| c.is_ascii_alphanumeric())
    }
}
