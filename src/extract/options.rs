//! Extraction options and layout configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::examination::ParserOptions;
use crate::render::PageSelection;

/// Margin fractions that carve a page into regions.
///
/// Horizontal values are fractions of page width, vertical values fractions
/// of page height. Fragments are placed by the center of their bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarginConfig {
    /// Right edge of the line-number column
    pub left: f32,
    /// Right edge of the body text
    pub right: f32,
    /// Bottom edge of the header band
    pub top: f32,
    /// Top edge of the footer band
    pub bottom: f32,
    /// Blocks whose tops differ by at most this much share a row
    pub row_tolerance: f32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            left: 0.12,
            right: 0.88,
            top: 0.10,
            bottom: 0.90,
            row_tolerance: 5.0,
        }
    }
}

impl MarginConfig {
    /// Set the left margin fraction.
    pub fn with_left(mut self, left: f32) -> Self {
        self.left = left;
        self
    }

    /// Set the right margin fraction.
    pub fn with_right(mut self, right: f32) -> Self {
        self.right = right;
        self
    }

    /// Set the top margin fraction.
    pub fn with_top(mut self, top: f32) -> Self {
        self.top = top;
        self
    }

    /// Set the bottom margin fraction.
    pub fn with_bottom(mut self, bottom: f32) -> Self {
        self.bottom = bottom;
        self
    }

    /// Check that the margins describe a non-empty body region.
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !(in_unit(self.left) && in_unit(self.right) && self.left < self.right) {
            return Err(Error::InvalidConfig(format!(
                "horizontal margins must satisfy 0 <= left < right <= 1 (got {} / {})",
                self.left, self.right
            )));
        }
        if !(in_unit(self.top) && in_unit(self.bottom) && self.top < self.bottom) {
            return Err(Error::InvalidConfig(format!(
                "vertical margins must satisfy 0 <= top < bottom <= 1 (got {} / {})",
                self.top, self.bottom
            )));
        }
        if self.row_tolerance < 0.0 {
            return Err(Error::InvalidConfig("row tolerance must be >= 0".to_string()));
        }
        Ok(())
    }
}

/// Geometry settings for classification and line merging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Region margins
    pub margins: MarginConfig,
    /// Line height assumed when fewer than two line numbers are found
    pub default_line_height: f32,
    /// Matching window as a fraction of the line height
    pub tolerance_ratio: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margins: MarginConfig::default(),
            default_line_height: 30.0,
            tolerance_ratio: 0.6,
        }
    }
}

impl LayoutConfig {
    /// Create a layout config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the margins.
    pub fn with_margins(mut self, margins: MarginConfig) -> Self {
        self.margins = margins;
        self
    }

    /// Set the fallback line height.
    pub fn with_default_line_height(mut self, height: f32) -> Self {
        self.default_line_height = height;
        self
    }

    /// Set the tolerance ratio.
    pub fn with_tolerance_ratio(mut self, ratio: f32) -> Self {
        self.tolerance_ratio = ratio;
        self
    }

    /// Load from a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate margins and matching parameters.
    pub fn validate(&self) -> Result<()> {
        self.margins.validate()?;
        if self.default_line_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "default line height must be positive".to_string(),
            ));
        }
        if self.tolerance_ratio <= 0.0 {
            return Err(Error::InvalidConfig(
                "tolerance ratio must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error handling mode for the digital text pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Abort the document when a page's text layer cannot be read
    Strict,
    /// Treat an unreadable page as empty and continue
    #[default]
    Lenient,
}

/// Options for extracting a transcript from a document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Geometry settings
    pub layout: LayoutConfig,

    /// Minimum fragment count before a page is trusted without OCR
    pub min_items: usize,

    /// Whether flagged pages are sent to OCR at all
    pub ocr_enabled: bool,

    /// Whether digital pages without line numbers get margin OCR
    pub hybrid: bool,

    /// Rasterization resolution for OCR
    pub ocr_dpi: u32,

    /// Upper bound on pages being rasterized/recognized at once
    pub ocr_concurrency: usize,

    /// Whether to classify and merge pages in parallel
    pub parallel: bool,

    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Page selection (which physical pages to process)
    pub pages: PageSelection,

    /// Fixed printed-page offset; detected from headers/footers when `None`
    pub printed_page_offset: Option<i32>,

    /// Examination parser settings
    pub parser: ParserOptions,

    /// Label recorded in the transcript metadata
    pub source_label: Option<String>,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout configuration.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the margins.
    pub fn with_margins(mut self, margins: MarginConfig) -> Self {
        self.layout.margins = margins;
        self
    }

    /// Set the minimum fragment count.
    pub fn with_min_items(mut self, min_items: usize) -> Self {
        self.min_items = min_items;
        self
    }

    /// Enable or disable the OCR pass.
    pub fn with_ocr(mut self, enabled: bool) -> Self {
        self.ocr_enabled = enabled;
        self
    }

    /// Enable or disable margin OCR for digital pages without line numbers.
    pub fn with_hybrid(mut self, enabled: bool) -> Self {
        self.hybrid = enabled;
        self
    }

    /// Set the OCR rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.ocr_dpi = dpi;
        self
    }

    /// Set the OCR worker bound (at least one).
    pub fn with_ocr_concurrency(mut self, workers: usize) -> Self {
        self.ocr_concurrency = workers.max(1);
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Abort on unreadable pages.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Fix the printed-page offset instead of detecting it.
    pub fn with_page_offset(mut self, offset: i32) -> Self {
        self.printed_page_offset = Some(offset);
        self
    }

    /// Set examination parser options.
    pub fn with_parser(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }

    /// Set the source label.
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            min_items: 10,
            ocr_enabled: true,
            hybrid: true,
            ocr_dpi: 300,
            ocr_concurrency: 2,
            parallel: true,
            error_mode: ErrorMode::Lenient,
            pages: PageSelection::All,
            printed_page_offset: None,
            parser: ParserOptions::default(),
            source_label: None,
        }
    }
}
