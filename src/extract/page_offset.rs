//! Printed page number detection.
//!
//! Transcripts often start with a cover or caption page, so printed page 1
//! may sit on physical page 3. The offset found here is handed to the
//! assembler as a plain integer; callers who know better can override it.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::TextFragment;

/// Fraction of page height below which text counts as footer.
const FOOTER_BAND: f32 = 0.85;

/// Fraction of page height above which text counts as header.
const HEADER_BAND: f32 = 0.10;

fn page_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)page\s*(\d+)").expect("page word pattern"))
}

fn dashed_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\s*(\d+)\s*-?$").expect("dashed number pattern"))
}

/// Find the printed page number among a page's fragments.
///
/// Footer text is searched before header text. Accepted forms are a
/// standalone 1-3 digit number, `Page N`, and `-N-`.
pub fn detect_printed_page(fragments: &[TextFragment], height: f32) -> Option<i32> {
    let footer = fragments.iter().filter(|f| f.y > height * FOOTER_BAND);
    let header = fragments.iter().filter(|f| f.y < height * HEADER_BAND);

    footer
        .chain(header)
        .find_map(|fragment| parse_page_label(fragment.text.trim()))
}

/// Parse a header/footer label into a page number.
pub fn parse_page_label(text: &str) -> Option<i32> {
    let standalone = match text.as_bytes() {
        [first, rest @ ..] if rest.len() <= 2 => {
            (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit)
        }
        _ => false,
    };
    let number: Option<i32> = if standalone {
        text.parse().ok()
    } else if let Some(caps) = page_word().captures(text) {
        caps[1].parse().ok()
    } else if let Some(caps) = dashed_number().captures(text) {
        caps[1].parse().ok()
    } else {
        None
    };
    number.filter(|n| *n > 0)
}

/// Physical page (1-based) on which printed page 1 appears.
///
/// Uses the page labelled 1 when there is one, otherwise extrapolates back
/// from the first labelled page, otherwise assumes the first page.
pub fn first_numbered_page(detections: &[Option<i32>]) -> i32 {
    if let Some(i) = detections.iter().position(|d| *d == Some(1)) {
        return i as i32 + 1;
    }
    for (i, detected) in detections.iter().enumerate() {
        if let Some(n) = detected {
            let inferred = (i as i32 + 1) - (n - 1);
            if inferred > 0 {
                return inferred;
            }
        }
    }
    1
}

/// Offset to subtract from a physical page number to get the printed one.
pub fn printed_page_offset(detections: &[Option<i32>]) -> i32 {
    let first = first_numbered_page(detections);
    log::info!("printed page 1 is on physical page {}", first);
    first - 1
}
