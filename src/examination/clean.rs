//! Line cleanup applied before marker detection.

use unicode_normalization::UnicodeNormalization;

/// Characters OCR commonly produces from margin rules, bullets and specks.
const NOISE: &[char] = &[
    '\u{00B7}', // middle dot
    '\u{2022}', // bullet
    '\u{2027}', // hyphenation point
    '\u{2219}', // bullet operator
    '\u{25CF}', // black circle
    '\u{25AA}', // small black square
    '\u{25E6}', // white bullet
    '|',
    '\u{00A6}', // broken bar
    '\u{FFFD}', // replacement character
];

/// Stray quote and dash characters only stripped at the start of a line.
const LEADING_STRAYS: &[char] = &[
    '\'', '"', '`', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '-', '_', '~', '\u{2013}',
    '\u{2014}',
];

const LIGATURES: &[(&str, &str)] = &[
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
];

/// Normalize a transcript line for matching and output.
///
/// NFC normalization, ligature expansion, noise removal, leading stray
/// punctuation removal, whitespace collapse.
pub fn clean_line(text: &str) -> String {
    let mut line: String = text.nfc().collect();
    for (ligature, replacement) in LIGATURES {
        if line.contains(ligature) {
            line = line.replace(ligature, replacement);
        }
    }
    line.retain(|c| !NOISE.contains(&c));

    let trimmed = line.trim_start_matches(|c: char| c.is_whitespace() || LEADING_STRAYS.contains(&c));
    collapse_whitespace(trimmed)
}

/// Join runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `piece` to `acc` with a single separating space.
pub(crate) fn append_text(acc: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if !acc.is_empty() {
        acc.push(' ');
    }
    acc.push_str(piece);
}
