//! Page-level types.

use super::TextFragment;
use serde::{Deserialize, Serialize};

/// Region a fragment was assigned to by the spatial classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Running header above the top margin
    Header,
    /// Running footer below the bottom margin
    Footer,
    /// Transcript line number in the left margin
    LineNumber,
    /// Body text between the left and right margins
    Content,
}

/// A fragment tagged with its region and the page it was classified on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedBlock {
    /// The underlying fragment
    #[serde(flatten)]
    pub fragment: TextFragment,
    /// Assigned region
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Width of the page the block was classified on
    pub page_width: f32,
    /// Height of the page the block was classified on
    pub page_height: f32,
}

impl ClassifiedBlock {
    /// Text of the block.
    pub fn text(&self) -> &str {
        &self.fragment.text
    }

    /// Confidence of the block (0-100).
    pub fn confidence(&self) -> f32 {
        self.fragment.confidence
    }
}

/// How a page's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Digital text layer was sufficient
    #[default]
    Digital,
    /// Page was rasterized and recognized
    Ocr,
    /// OCR was needed but failed; partial digital text was kept
    DigitalFallback,
    /// Digital body text with line numbers read by OCR from the margin
    Hybrid,
}

/// Classified content of one physical page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageExtraction {
    /// Physical page number (1-indexed)
    pub page_number: u32,
    /// Page width in source units
    pub width: f32,
    /// Page height in source units
    pub height: f32,
    /// Line-number blocks, position sorted
    pub line_numbers: Vec<ClassifiedBlock>,
    /// Header blocks, position sorted
    pub headers: Vec<ClassifiedBlock>,
    /// Footer blocks, position sorted
    pub footers: Vec<ClassifiedBlock>,
    /// Body blocks, position sorted
    pub main_content: Vec<ClassifiedBlock>,
    /// Page confidence: OCR page score, or 100 for digital pages
    pub confidence: f32,
    /// How the text was obtained
    pub extraction_method: ExtractionMethod,
    /// Fragments that fit no region
    #[serde(default)]
    pub rejected: usize,
}

impl PageExtraction {
    /// Create an empty page.
    pub fn new(page_number: u32, width: f32, height: f32) -> Self {
        Self {
            page_number,
            width,
            height,
            line_numbers: Vec::new(),
            headers: Vec::new(),
            footers: Vec::new(),
            main_content: Vec::new(),
            confidence: 100.0,
            extraction_method: ExtractionMethod::Digital,
            rejected: 0,
        }
    }

    /// Set the extraction method and page confidence.
    pub fn with_method(mut self, method: ExtractionMethod, confidence: f32) -> Self {
        self.extraction_method = method;
        self.confidence = confidence;
        self
    }

    /// All classified blocks on the page, region by region.
    pub fn blocks(&self) -> impl Iterator<Item = &ClassifiedBlock> {
        self.headers
            .iter()
            .chain(self.line_numbers.iter())
            .chain(self.main_content.iter())
            .chain(self.footers.iter())
    }

    /// Number of classified blocks.
    pub fn block_count(&self) -> usize {
        self.headers.len() + self.footers.len() + self.line_numbers.len() + self.main_content.len()
    }

    /// Whether the page has no body text.
    pub fn is_blank(&self) -> bool {
        self.main_content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str, block_type: BlockType) -> ClassifiedBlock {
        ClassifiedBlock {
            fragment: TextFragment::digital(text, 0.0, 0.0, 10.0, 10.0),
            block_type,
            page_width: 612.0,
            page_height: 792.0,
        }
    }

    #[test]
    fn test_block_count() {
        let mut page = PageExtraction::new(1, 612.0, 792.0);
        page.headers.push(block("CAPTION", BlockType::Header));
        page.line_numbers.push(block("1", BlockType::LineNumber));
        page.main_content.push(block("Q. Hello", BlockType::Content));

        assert_eq!(page.block_count(), 3);
        assert_eq!(page.blocks().count(), 3);
        assert!(!page.is_blank());
    }

    #[test]
    fn test_block_json_flattened() {
        let json = serde_json::to_string(&block("7", BlockType::LineNumber)).unwrap();
        assert!(json.contains("\"type\":\"line_number\""));
        assert!(json.contains("\"text\":\"7\""));
        assert!(json.contains("\"pageWidth\":612"));
    }

    #[test]
    fn test_with_method() {
        let page = PageExtraction::new(2, 612.0, 792.0).with_method(ExtractionMethod::Ocr, 87.5);
        assert_eq!(page.extraction_method, ExtractionMethod::Ocr);
        assert_eq!(page.confidence, 87.5);
    }
}
