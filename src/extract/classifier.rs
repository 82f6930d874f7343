//! Spatial classification of positioned fragments into page regions.
//!
//! A fragment is placed by the center of its bounding box, with this
//! precedence: header band, footer band, line-number column, body. A
//! numeric fragment in the line-number column that is not a plausible line
//! number (three or more digits, leading zero) is rejected rather than
//! promoted to body text, so stray page numbers and Bates stamps never
//! become line numbers.

use std::cmp::Ordering;

use crate::model::{BlockType, ClassifiedBlock, PageExtraction, TextFragment};

use super::options::MarginConfig;

/// Outcome of classifying one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Assigned to a region
    Region(BlockType),
    /// Numeric text in the line-number column that is not a line number
    RejectedNumber,
    /// Text outside every region (right gutter, non-numeric left margin)
    OutsideRegions,
    /// Whitespace only
    Empty,
}

/// Buckets fragments into header/footer/line-number/content regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialClassifier {
    margins: MarginConfig,
}

impl SpatialClassifier {
    /// Create a classifier for the given margins.
    pub fn new(margins: MarginConfig) -> Self {
        Self { margins }
    }

    /// Margins in use.
    pub fn margins(&self) -> &MarginConfig {
        &self.margins
    }

    /// Decide where a single fragment belongs on a `width` x `height` page.
    pub fn place(&self, fragment: &TextFragment, width: f32, height: f32) -> Placement {
        let text = fragment.text.trim();
        if text.is_empty() {
            return Placement::Empty;
        }

        let left = width * self.margins.left;
        let right = width * self.margins.right;
        let top = height * self.margins.top;
        let bottom = height * self.margins.bottom;

        let cx = fragment.center_x();
        let cy = fragment.center_y();

        if cy < top {
            Placement::Region(BlockType::Header)
        } else if cy > bottom {
            Placement::Region(BlockType::Footer)
        } else if cx < left && is_line_number(text) {
            Placement::Region(BlockType::LineNumber)
        } else if cx < left && text.chars().all(|c| c.is_ascii_digit()) {
            Placement::RejectedNumber
        } else if cx >= left && cx <= right {
            Placement::Region(BlockType::Content)
        } else {
            Placement::OutsideRegions
        }
    }

    /// Classify every fragment of one page.
    pub fn classify_page(
        &self,
        page_number: u32,
        width: f32,
        height: f32,
        fragments: &[TextFragment],
    ) -> PageExtraction {
        let mut page = PageExtraction::new(page_number, width, height);

        for fragment in fragments {
            let block_type = match self.place(fragment, width, height) {
                Placement::Region(block_type) => block_type,
                Placement::RejectedNumber => {
                    log::debug!(
                        "page {}: rejected line number {:?} at x={:.0}",
                        page_number,
                        fragment.text.trim(),
                        fragment.center_x()
                    );
                    page.rejected += 1;
                    continue;
                }
                Placement::OutsideRegions => {
                    log::debug!(
                        "page {}: dropped {:?} outside all regions at ({:.0}, {:.0})",
                        page_number,
                        fragment.text.trim(),
                        fragment.center_x(),
                        fragment.center_y()
                    );
                    page.rejected += 1;
                    continue;
                }
                Placement::Empty => continue,
            };

            let mut fragment = fragment.clone();
            let trimmed = fragment.text.trim();
            if trimmed.len() != fragment.text.len() {
                fragment.text = trimmed.to_string();
            }

            let block = ClassifiedBlock {
                fragment,
                block_type,
                page_width: width,
                page_height: height,
            };
            match block_type {
                BlockType::Header => page.headers.push(block),
                BlockType::Footer => page.footers.push(block),
                BlockType::LineNumber => page.line_numbers.push(block),
                BlockType::Content => page.main_content.push(block),
            }
        }

        let tolerance = self.margins.row_tolerance;
        sort_by_position(&mut page.headers, tolerance);
        sort_by_position(&mut page.footers, tolerance);
        sort_by_position(&mut page.line_numbers, tolerance);
        sort_by_position(&mut page.main_content, tolerance);

        log::debug!(
            "page {}: {} line numbers, {} headers, {} footers, {} content, {} rejected",
            page_number,
            page.line_numbers.len(),
            page.headers.len(),
            page.footers.len(),
            page.main_content.len(),
            page.rejected
        );

        page
    }

    /// Count the fragments that would be placed in the line-number column.
    pub fn count_line_numbers(&self, width: f32, height: f32, fragments: &[TextFragment]) -> usize {
        fragments
            .iter()
            .filter(|f| self.place(f, width, height) == Placement::Region(BlockType::LineNumber))
            .count()
    }

    /// Re-run classification over a page's own blocks.
    pub fn reclassify(&self, page: &PageExtraction) -> PageExtraction {
        let fragments: Vec<TextFragment> = page.blocks().map(|b| b.fragment.clone()).collect();
        let mut out = self.classify_page(page.page_number, page.width, page.height, &fragments);
        out.confidence = page.confidence;
        out.extraction_method = page.extraction_method;
        out.rejected += page.rejected;
        out
    }
}

/// Whether `text` is a 1-2 digit positive line number without a leading zero.
pub fn is_line_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes {
        [d] => (b'1'..=b'9').contains(d),
        [d, e] => (b'1'..=b'9').contains(d) && e.is_ascii_digit(),
        _ => false,
    }
}

/// Sort blocks top to bottom, then left to right within a row.
///
/// Blocks are first ordered by their top edge; consecutive blocks whose top
/// lies within `tolerance` of the first block of the current row join that
/// row, and each row is then ordered by x.
pub fn sort_by_position(blocks: &mut [ClassifiedBlock], tolerance: f32) {
    blocks.sort_by(|a, b| a.fragment.y.total_cmp(&b.fragment.y));

    let mut row_start = 0;
    while row_start < blocks.len() {
        let row_y = blocks[row_start].fragment.y;
        let mut row_end = row_start + 1;
        while row_end < blocks.len() && blocks[row_end].fragment.y - row_y <= tolerance {
            row_end += 1;
        }
        blocks[row_start..row_end].sort_by(compare_in_row);
        row_start = row_end;
    }
}

fn compare_in_row(a: &ClassifiedBlock, b: &ClassifiedBlock) -> Ordering {
    a.fragment
        .x
        .total_cmp(&b.fragment.x)
        .then(a.fragment.y.total_cmp(&b.fragment.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: f32 = 612.0;
    const H: f32 = 792.0;

    fn frag(text: &str, x: f32, y: f32) -> TextFragment {
        TextFragment::digital(text, x, y, 10.0, 10.0)
    }

    fn classify(fragments: &[TextFragment]) -> PageExtraction {
        SpatialClassifier::default().classify_page(1, W, H, fragments)
    }

    #[test]
    fn test_is_line_number() {
        assert!(is_line_number("1"));
        assert!(is_line_number("25"));
        assert!(is_line_number("99"));
        assert!(!is_line_number("0"));
        assert!(!is_line_number("07"));
        assert!(!is_line_number("100"));
        assert!(!is_line_number("1a"));
        assert!(!is_line_number(""));
    }

    #[test]
    fn test_regions() {
        let page = classify(&[
            frag("CAPTION", 300.0, 20.0),
            frag("Page 5", 300.0, 760.0),
            frag("3", 30.0, 300.0),
            frag("Q.", 100.0, 300.0),
        ]);
        assert_eq!(page.headers.len(), 1);
        assert_eq!(page.footers.len(), 1);
        assert_eq!(page.line_numbers.len(), 1);
        assert_eq!(page.main_content.len(), 1);
        assert_eq!(page.rejected, 0);
    }

    #[test]
    fn test_header_takes_precedence_over_line_number() {
        // A number in the top-left corner is a header, not a line number.
        let page = classify(&[frag("1", 30.0, 10.0)]);
        assert_eq!(page.headers.len(), 1);
        assert!(page.line_numbers.is_empty());
    }

    #[test]
    fn test_count_line_numbers() {
        let fragments = [
            frag("1", 30.0, 10.0),
            frag("2", 30.0, 300.0),
            frag("3", 30.0, 324.0),
            frag("4", 300.0, 348.0),
        ];
        assert_eq!(SpatialClassifier::default().count_line_numbers(W, H, &fragments), 2);
    }

    #[test]
    fn test_three_digit_margin_number_rejected() {
        let page = classify(&[frag("123", 30.0, 300.0), frag("05", 30.0, 340.0)]);
        assert!(page.line_numbers.is_empty());
        assert!(page.main_content.is_empty());
        assert_eq!(page.rejected, 2);
    }

    #[test]
    fn test_outside_regions_dropped() {
        let page = classify(&[frag("stamp", 580.0, 300.0), frag("x", 20.0, 300.0)]);
        assert_eq!(page.block_count(), 0);
        assert_eq!(page.rejected, 2);
    }

    #[test]
    fn test_whitespace_skipped_and_text_trimmed() {
        let page = classify(&[frag("   ", 100.0, 300.0), frag("  word ", 100.0, 320.0)]);
        assert_eq!(page.rejected, 0);
        assert_eq!(page.main_content.len(), 1);
        assert_eq!(page.main_content[0].text(), "word");
    }

    #[test]
    fn test_sort_rows_by_x_within_tolerance() {
        let page = classify(&[
            frag("world", 200.0, 303.0),
            frag("Hello", 100.0, 300.0),
            frag("next", 100.0, 330.0),
        ]);
        let texts: Vec<&str> = page.main_content.iter().map(|b| b.text()).collect();
        assert_eq!(texts, vec!["Hello", "world", "next"]);
    }

    #[test]
    fn test_sort_outside_tolerance_uses_y() {
        let page = classify(&[frag("lower", 100.0, 310.0), frag("upper", 200.0, 300.0)]);
        let texts: Vec<&str> = page.main_content.iter().map(|b| b.text()).collect();
        assert_eq!(texts, vec!["upper", "lower"]);
    }

    #[test]
    fn test_reclassify_is_fixed_point() {
        let fragments = vec![
            frag("HEADER", 300.0, 20.0),
            frag("1", 30.0, 100.0),
            frag("2", 30.0, 130.0),
            frag("b", 150.0, 132.0),
            frag("a", 100.0, 129.0),
            frag("Hello", 100.0, 102.0),
            frag("123", 30.0, 200.0),
            frag("footer", 300.0, 770.0),
        ];
        let classifier = SpatialClassifier::default();
        let first = classifier.classify_page(1, W, H, &fragments);
        let mut second = classifier.reclassify(&first);
        second.rejected = first.rejected;
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_margins() {
        let classifier = SpatialClassifier::new(MarginConfig::default().with_left(0.2));
        // x center 105 is in the line-number column once left = 0.2 * 612.
        let page = classifier.classify_page(1, W, H, &[frag("4", 100.0, 300.0)]);
        assert_eq!(page.line_numbers.len(), 1);
    }
}
