//! Flatten per-page lines into one page/line addressed stream.

use crate::model::{GlobalLine, TranscriptPage};

/// Printed page number for a 0-based physical page index.
pub fn printed_page(digital_page_index: usize, printed_page_offset: i32) -> i32 {
    digital_page_index as i32 + 1 - printed_page_offset
}

/// Assemble the lines of every page, in physical order, into global lines.
///
/// Unnumbered lines take the address of the last numbered line before them
/// on the same page, or 0 when the page has none yet.
pub fn build_transcript(pages: &[TranscriptPage], printed_page_offset: i32) -> Vec<GlobalLine> {
    let total: usize = pages.iter().map(|p| p.lines.len()).sum();
    let mut out = Vec::with_capacity(total);

    for page in pages {
        let index = page.extraction.page_number.saturating_sub(1) as usize;
        let printed = printed_page(index, printed_page_offset);
        let mut current = 0;

        for line in &page.lines {
            if let Some(value) = line.line_value() {
                current = value;
            }
            out.push(GlobalLine {
                printed_page: printed,
                digital_page_index: index,
                line_number: line.line_number.clone(),
                line: current,
                text: line.text.clone(),
                confidence: line.confidence,
            });
        }
    }

    log::debug!("assembled {} lines from {} pages", out.len(), pages.len());
    out
}
