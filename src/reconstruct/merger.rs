//! Line reconstruction: pair margin line numbers with the body text beside them.
//!
//! Each line number opens a vertical window of `tolerance_ratio` times the
//! line pitch, centered on the number. Unconsumed body blocks whose vertical
//! center falls in the window are joined left to right into that line.
//! Whatever is left over is appended without a number, so no body text is
//! ever lost, only mis-numbered in the worst case.

use crate::extract::LayoutConfig;
use crate::model::{ClassifiedBlock, PageExtraction, ReconstructedLine};

/// Merges line-number blocks with content blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineMerger {
    config: LayoutConfig,
}

impl LineMerger {
    /// Create a merger with the given layout settings.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Reconstruct the lines of one classified page.
    pub fn reconstruct(&self, page: &PageExtraction) -> Vec<ReconstructedLine> {
        let numbers = monotonic_line_numbers(&page.line_numbers);
        if numbers.len() < page.line_numbers.len() {
            log::debug!(
                "page {}: set aside {} out-of-sequence line numbers",
                page.page_number,
                page.line_numbers.len() - numbers.len()
            );
        }
        self.merge(&numbers, &page.main_content)
    }

    /// Merge position-sorted line numbers with position-sorted content.
    pub fn merge(
        &self,
        line_numbers: &[&ClassifiedBlock],
        content: &[ClassifiedBlock],
    ) -> Vec<ReconstructedLine> {
        let line_height = self.line_height(line_numbers);
        let half_window = line_height * self.config.tolerance_ratio / 2.0;

        let mut consumed = vec![false; content.len()];
        let mut lines = Vec::with_capacity(line_numbers.len() + content.len());

        for number in line_numbers {
            let center = number.fragment.center_y();
            let top = center - half_window;
            let bottom = center + half_window;

            let mut matched: Vec<usize> = content
                .iter()
                .enumerate()
                .filter(|(i, block)| {
                    let cy = block.fragment.center_y();
                    !consumed[*i] && cy >= top && cy <= bottom
                })
                .map(|(i, _)| i)
                .collect();
            matched.sort_by(|&a, &b| content[a].fragment.x.total_cmp(&content[b].fragment.x));

            let mut confidence = number.confidence();
            let mut parts = Vec::with_capacity(matched.len());
            for &i in &matched {
                consumed[i] = true;
                confidence = confidence.min(content[i].confidence());
                parts.push(content[i].text());
            }

            lines.push(ReconstructedLine::numbered(
                number.text(),
                parts.join(" ").trim(),
                confidence,
            ));
        }

        for (block, used) in content.iter().zip(&consumed) {
            if !used {
                lines.push(ReconstructedLine::unnumbered(block.text(), block.confidence()));
            }
        }

        lines
    }

    /// Nominal line pitch: distance between the first two line numbers that
    /// survived the out-of-sequence filter (not the first two detected), or
    /// the configured default when there are fewer than two (or they overlap).
    fn line_height(&self, line_numbers: &[&ClassifiedBlock]) -> f32 {
        match line_numbers {
            [first, second, ..] => {
                let pitch = (second.fragment.center_y() - first.fragment.center_y()).abs();
                if pitch >= 1.0 {
                    pitch
                } else {
                    self.config.default_line_height
                }
            }
            _ => self.config.default_line_height,
        }
    }
}

/// Keep the longest run of line numbers whose values never decrease in
/// vertical order. OCR misreads ("8" read as "3") break the sequence and are
/// dropped here; ties keep the earliest blocks.
pub fn monotonic_line_numbers(blocks: &[ClassifiedBlock]) -> Vec<&ClassifiedBlock> {
    let values: Vec<u32> = blocks
        .iter()
        .map(|b| b.text().parse().unwrap_or(0))
        .collect();
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    // best[i]: length of the longest non-decreasing run ending at i
    let mut best = vec![1usize; n];
    let mut prev = vec![usize::MAX; n];
    for i in 0..n {
        for j in 0..i {
            if values[j] <= values[i] && best[j] + 1 > best[i] {
                best[i] = best[j] + 1;
                prev[i] = j;
            }
        }
    }

    let mut end = 0;
    for i in 1..n {
        if best[i] > best[end] {
            end = i;
        }
    }

    let mut kept = Vec::with_capacity(best[end]);
    let mut i = end;
    loop {
        kept.push(&blocks[i]);
        if prev[i] == usize::MAX {
            break;
        }
        i = prev[i];
    }
    kept.reverse();
    kept
}

/// Reconstruct one page's lines.
pub fn reconstruct_page(page: &PageExtraction, config: &LayoutConfig) -> Vec<ReconstructedLine> {
    LineMerger::new(*config).reconstruct(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockType, TextFragment};

    fn block(text: &str, x: f32, y: f32, block_type: BlockType) -> ClassifiedBlock {
        ClassifiedBlock {
            fragment: TextFragment::digital(text, x, y, 10.0 * text.len() as f32, 10.0),
            block_type,
            page_width: 612.0,
            page_height: 792.0,
        }
    }

    fn number(text: &str, y: f32) -> ClassifiedBlock {
        block(text, 30.0, y, BlockType::LineNumber)
    }

    fn content(text: &str, x: f32, y: f32) -> ClassifiedBlock {
        block(text, x, y, BlockType::Content)
    }

    fn page(numbers: Vec<ClassifiedBlock>, body: Vec<ClassifiedBlock>) -> PageExtraction {
        let mut page = PageExtraction::new(1, 612.0, 792.0);
        page.line_numbers = numbers;
        page.main_content = body;
        page
    }

    #[test]
    fn test_scenario_numbers_content_and_orphan() {
        let page = page(
            vec![number("1", 100.0), number("2", 130.0), number("3", 160.0)],
            vec![
                content("Hello", 100.0, 102.0),
                content("world", 100.0, 128.0),
                content("Orphan", 100.0, 500.0),
            ],
        );
        let lines = reconstruct_page(&page, &LayoutConfig::default());

        assert_eq!(
            lines,
            vec![
                ReconstructedLine::numbered("1", "Hello", 100.0),
                ReconstructedLine::numbered("2", "world", 100.0),
                ReconstructedLine::numbered("3", "", 100.0),
                ReconstructedLine::unnumbered("Orphan", 100.0),
            ]
        );
    }

    #[test]
    fn test_pitch_ignores_misread_number() {
        // "9" breaks the sequence; measuring from it would halve the pitch
        // and shrink the window below the 5pt offset of "Second".
        let page = page(
            vec![number("1", 100.0), number("9", 112.0), number("2", 124.0), number("3", 148.0)],
            vec![content("First", 100.0, 100.0), content("Second", 100.0, 129.0)],
        );
        let lines = reconstruct_page(&page, &LayoutConfig::default());
        assert_eq!(
            lines,
            vec![
                ReconstructedLine::numbered("1", "First", 100.0),
                ReconstructedLine::numbered("2", "Second", 100.0),
                ReconstructedLine::numbered("3", "", 100.0),
            ]
        );
    }

    #[test]
    fn test_blocks_joined_left_to_right() {
        let page = page(
            vec![number("1", 100.0), number("2", 130.0)],
            vec![content("sign?", 300.0, 101.0), content("Q. Did you", 100.0, 99.0)],
        );
        let lines = reconstruct_page(&page, &LayoutConfig::default());
        assert_eq!(lines[0].text, "Q. Did you sign?");
    }

    #[test]
    fn test_confidence_is_minimum() {
        let mut low = content("blurry", 100.0, 100.0);
        low.fragment.confidence = 42.0;
        let mut num = number("1", 100.0);
        num.fragment.confidence = 95.0;
        let page = page(vec![num], vec![low, content("clear", 200.0, 100.0)]);

        let lines = reconstruct_page(&page, &LayoutConfig::default());
        assert_eq!(lines[0].confidence, 42.0);
    }

    #[test]
    fn test_no_line_numbers_passes_content_through() {
        let page = page(
            vec![],
            vec![content("first", 100.0, 100.0), content("second", 100.0, 130.0)],
        );
        let lines = reconstruct_page(&page, &LayoutConfig::default());
        assert_eq!(
            lines,
            vec![
                ReconstructedLine::unnumbered("first", 100.0),
                ReconstructedLine::unnumbered("second", 100.0),
            ]
        );
    }

    #[test]
    fn test_default_line_height_with_single_number() {
        // Window is 0.6 * 30 = 18 wide, so +/-9 around the number.
        let page = page(
            vec![number("1", 100.0)],
            vec![content("near", 100.0, 108.0), content("far", 100.0, 110.0)],
        );
        let lines = reconstruct_page(&page, &LayoutConfig::default());
        assert_eq!(lines[0].text, "near");
        assert_eq!(lines[1], ReconstructedLine::unnumbered("far", 100.0));
    }

    #[test]
    fn test_block_consumed_once() {
        // Tight pitch makes windows overlap; the first number wins.
        let page = page(
            vec![number("1", 100.0), number("2", 104.0)],
            vec![content("shared", 100.0, 101.0)],
        );
        let lines = reconstruct_page(&page, &LayoutConfig::default());
        let with_text: Vec<_> = lines.iter().filter(|l| l.text == "shared").collect();
        assert_eq!(with_text.len(), 1);
        assert_eq!(with_text[0].line_number.as_deref(), Some("1"));
    }

    #[test]
    fn test_no_content_lost() {
        let body: Vec<ClassifiedBlock> = (0..40)
            .map(|i| content(&format!("w{}", i), 100.0 + (i % 3) as f32 * 80.0, 90.0 + i as f32 * 13.0))
            .collect();
        let numbers: Vec<ClassifiedBlock> = (1..=25)
            .map(|n| number(&n.to_string(), 100.0 + (n - 1) as f32 * 24.0))
            .collect();
        let page = page(numbers, body.clone());

        let lines = reconstruct_page(&page, &LayoutConfig::default());
        let words: Vec<&str> = lines
            .iter()
            .flat_map(|l| l.text.split_whitespace())
            .collect();
        assert_eq!(words.len(), body.len());
        for b in &body {
            assert_eq!(words.iter().filter(|w| **w == b.text()).count(), 1);
        }
    }

    #[test]
    fn test_out_of_sequence_number_set_aside() {
        let page = page(
            vec![
                number("1", 100.0),
                number("2", 130.0),
                number("8", 160.0),
                number("4", 190.0),
                number("5", 220.0),
            ],
            vec![content("third", 100.0, 160.0)],
        );
        let lines = reconstruct_page(&page, &LayoutConfig::default());
        let numbers: Vec<&str> = lines.iter().filter_map(|l| l.line_number.as_deref()).collect();
        assert_eq!(numbers, vec!["1", "2", "4", "5"]);
        // Text beside the misread number still surfaces.
        assert!(lines.iter().any(|l| l.text == "third"));
    }

    #[test]
    fn test_monotonic_line_numbers_allows_repeats() {
        let blocks = vec![number("3", 10.0), number("3", 40.0), number("4", 70.0)];
        let kept = monotonic_line_numbers(&blocks);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_emitted_numbers_non_decreasing() {
        let blocks: Vec<ClassifiedBlock> = ["1", "2", "9", "3", "4", "1", "5", "6"]
            .iter()
            .enumerate()
            .map(|(i, n)| number(n, 100.0 + i as f32 * 30.0))
            .collect();
        let lines = reconstruct_page(&page(blocks, vec![]), &LayoutConfig::default());
        let values: Vec<u32> = lines.iter().filter_map(|l| l.line_value()).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }
}
