//! Whole-document transcript.

use super::{DanglingQuestion, GlobalLine, PageExtraction, QaItem, ReconstructedLine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document-level facts about an extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMetadata {
    /// Source file name or label
    pub source: Option<String>,
    /// Physical pages in the document
    pub page_count: u32,
    /// Pages whose text came from the digital layer
    pub digital_pages: u32,
    /// Pages whose text came from OCR
    pub ocr_pages: u32,
    /// Pages that needed OCR but fell back to digital text
    pub fallback_pages: u32,
    /// Digital pages whose line numbers came from margin OCR
    #[serde(default)]
    pub hybrid_pages: u32,
    /// Digital page (1-based) minus printed page
    pub printed_page_offset: i32,
    /// When the extraction ran
    pub extracted_at: DateTime<Utc>,
}

impl Default for TranscriptMetadata {
    fn default() -> Self {
        Self {
            source: None,
            page_count: 0,
            digital_pages: 0,
            ocr_pages: 0,
            fallback_pages: 0,
            hybrid_pages: 0,
            printed_page_offset: 0,
            extracted_at: Utc::now(),
        }
    }
}

/// One page together with the lines reconstructed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptPage {
    /// Classified page content
    pub extraction: PageExtraction,
    /// Lines in emission order
    pub lines: Vec<ReconstructedLine>,
}

/// A fully processed deposition transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    /// Run metadata
    pub metadata: TranscriptMetadata,
    /// Per-page results in physical order
    pub pages: Vec<TranscriptPage>,
    /// Global page/line addressed stream
    pub lines: Vec<GlobalLine>,
    /// Recovered question/answer exchanges
    pub testimony: Vec<QaItem>,
    /// Questions discarded because no answer followed
    pub unanswered_questions: usize,
    /// The discarded questions, when collected
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dangling: Vec<DanglingQuestion>,
}

impl Transcript {
    /// Number of physical pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Plain text of the global stream, one line per line.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
