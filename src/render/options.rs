//! Rendering options and configuration.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for rendering a transcript.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Append `[c%]` confidence to every line
    pub include_confidence: bool,

    /// Prefix header/footer blocks with their `[x, y]` position
    pub include_positions: bool,

    /// Render running headers and footers
    pub include_margins: bool,

    /// Render the recovered testimony after the pages (Markdown)
    pub include_testimony: bool,

    /// Pages to render (physical, 1-indexed)
    pub page_selection: PageSelection,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show per-line confidence.
    pub fn with_confidence(mut self, include: bool) -> Self {
        self.include_confidence = include;
        self
    }

    /// Show header/footer positions.
    pub fn with_positions(mut self, include: bool) -> Self {
        self.include_positions = include;
        self
    }

    /// Show or hide running headers and footers.
    pub fn with_margins(mut self, include: bool) -> Self {
        self.include_margins = include;
        self
    }

    /// Show or hide the testimony section.
    pub fn with_testimony(mut self, include: bool) -> Self {
        self.include_testimony = include;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Set specific pages.
    pub fn with_page_list(mut self, pages: Vec<u32>) -> Self {
        self.page_selection = PageSelection::Pages(pages);
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_confidence: false,
            include_positions: false,
            include_margins: true,
            include_testimony: true,
            page_selection: PageSelection::All,
        }
    }
}

/// Page selection for extraction and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |what: &str| Error::InvalidPageRange(format!("{}: {:?}", what, s));

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        // Simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| invalid("invalid start page"))?;
                let end: u32 = end.trim().parse().map_err(|_| invalid("invalid end page"))?;
                if start == 0 || end < start {
                    return Err(invalid("empty range"));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        // Comma-separated list with possible ranges
        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| invalid("invalid page number"))?;
                let end: u32 = end.trim().parse().map_err(|_| invalid("invalid page number"))?;
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| invalid("invalid page number"))?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        if pages.contains(&0) {
            return Err(invalid("pages are numbered from 1"));
        }
        pages.sort();
        Ok(PageSelection::Pages(pages))
    }
}
