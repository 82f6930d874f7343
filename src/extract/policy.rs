//! Per-page choice between the digital text layer and OCR.

use crate::model::TextFragment;

/// Content-sufficiency counts for one page's digital text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAssessment {
    /// All fragments on the page
    pub total: usize,
    /// Fragments with at least one ASCII letter or digit
    pub meaningful: usize,
    /// Whether the page should be rasterized and recognized
    pub needs_ocr: bool,
}

/// Decides whether a page's digital text layer can be trusted.
///
/// A page needs OCR when it has fewer than `min_items` fragments, or fewer
/// than `min_items / 2` meaningful ones. Scanned pages usually carry no text
/// layer at all; flattened pages often carry only punctuation and rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPolicy {
    min_items: usize,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self { min_items: 10 }
    }
}

impl ExtractionPolicy {
    /// Create a policy with the given threshold.
    pub fn new(min_items: usize) -> Self {
        Self { min_items }
    }

    /// Threshold in use.
    pub fn min_items(&self) -> usize {
        self.min_items
    }

    /// Decide from raw counts.
    pub fn needs_ocr(&self, total: usize, meaningful: usize) -> bool {
        // Half the threshold is not rounded: with 7, three meaningful
        // fragments are still too few.
        total < self.min_items || (meaningful as f64) < self.min_items as f64 / 2.0
    }

    /// Count a page's fragments and decide.
    pub fn assess(&self, fragments: &[TextFragment]) -> PageAssessment {
        let total = fragments.len();
        let meaningful = fragments.iter().filter(|f| f.is_meaningful()).count();
        PageAssessment {
            total,
            meaningful,
            needs_ocr: self.needs_ocr(total, meaningful),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frags(texts: &[&str]) -> Vec<TextFragment> {
        texts
            .iter()
            .map(|t| TextFragment::digital(*t, 0.0, 0.0, 1.0, 1.0))
            .collect()
    }

    #[test]
    fn test_empty_page_needs_ocr() {
        let assessment = ExtractionPolicy::default().assess(&[]);
        assert_eq!(assessment.total, 0);
        assert!(assessment.needs_ocr);
    }

    #[test]
    fn test_sufficient_page() {
        let texts: Vec<String> = (0..12).map(|i| format!("word{}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let assessment = ExtractionPolicy::default().assess(&frags(&refs));
        assert_eq!(assessment.meaningful, 12);
        assert!(!assessment.needs_ocr);
    }

    #[test]
    fn test_symbol_only_page_needs_ocr() {
        let mut texts = vec!["-"; 20];
        texts.extend(["a", "b", "c", "d"]);
        let assessment = ExtractionPolicy::default().assess(&frags(&texts));
        assert_eq!(assessment.total, 24);
        assert_eq!(assessment.meaningful, 4);
        assert!(assessment.needs_ocr);
    }

    #[test]
    fn test_threshold_boundaries() {
        let policy = ExtractionPolicy::new(10);
        assert!(policy.needs_ocr(9, 9));
        assert!(!policy.needs_ocr(10, 5));
        assert!(policy.needs_ocr(10, 4));

        let odd = ExtractionPolicy::new(7);
        assert!(!odd.needs_ocr(7, 4));
        assert!(odd.needs_ocr(7, 3));
    }

    #[test]
    fn test_decision_is_deterministic() {
        let policy = ExtractionPolicy::new(10);
        let first: Vec<bool> = (0..30).map(|n| policy.needs_ocr(n, n / 2)).collect();
        let second: Vec<bool> = (0..30).rev().map(|n| policy.needs_ocr(n, n / 2)).collect();
        let second: Vec<bool> = second.into_iter().rev().collect();
        assert_eq!(first, second);
    }
}
