//! Reconstructed transcript lines.

use super::LinePosition;
use serde::{Deserialize, Serialize};

/// A line produced by merging a line number with the body text beside it.
///
/// `line_number` is `None` for leftover content that matched no line
/// number; such lines are appended after the numbered lines of their page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructedLine {
    /// Printed line number ("1".."99"), if matched
    pub line_number: Option<String>,
    /// Merged text, blocks joined by single spaces
    pub text: String,
    /// Lowest confidence among the merged blocks
    pub confidence: f32,
}

impl ReconstructedLine {
    /// A numbered transcript line.
    pub fn numbered(line_number: impl Into<String>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            line_number: Some(line_number.into()),
            text: text.into(),
            confidence,
        }
    }

    /// Leftover content with no line number.
    pub fn unnumbered(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            line_number: None,
            text: text.into(),
            confidence,
        }
    }

    /// Numeric value of the line number.
    pub fn line_value(&self) -> Option<u32> {
        self.line_number.as_deref().and_then(|n| n.parse().ok())
    }

    /// Whether this line carries a line number.
    pub fn is_numbered(&self) -> bool {
        self.line_number.is_some()
    }
}

/// A reconstructed line addressed within the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLine {
    /// Page number as printed on the transcript (may be <= 0 for front matter)
    pub printed_page: i32,
    /// Physical page index (0-based)
    pub digital_page_index: usize,
    /// Printed line number, if matched
    pub line_number: Option<String>,
    /// Effective line address: the line number, or for unnumbered lines the
    /// last numbered line before it on the same page (0 if none)
    pub line: u32,
    /// Line text
    pub text: String,
    /// Line confidence (0-100)
    pub confidence: f32,
}

impl GlobalLine {
    /// Page/line address of this line.
    pub fn position(&self) -> LinePosition {
        LinePosition::new(self.printed_page, self.line)
    }

    /// Whether the line has only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
