//! Question/answer testimony records and their source locations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A page/line address in printed transcript coordinates.
///
/// Ordering is lexicographic: page first, then line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinePosition {
    /// Printed page number
    pub page: i32,
    /// Line address on that page
    pub line: u32,
}

impl LinePosition {
    /// Create a position.
    pub fn new(page: i32, line: u32) -> Self {
        Self { page, line }
    }
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page, self.line)
    }
}

/// An inclusive range of transcript lines.
///
/// Renders as `page:line` for a single line, `page:start-end` within one
/// page, and `startPage:startLine-endPage:endLine` across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// First line of the span
    pub start: LinePosition,
    /// Last line of the span
    pub end: LinePosition,
}

impl Span {
    /// A span covering one line.
    pub fn at(pos: LinePosition) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Extend the end of the span to `pos` if it lies further on.
    pub fn extend(&mut self, pos: LinePosition) {
        if pos > self.end {
            self.end = pos;
        }
    }

    /// Smallest span covering both.
    pub fn cover(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else if self.start.page == self.end.page {
            write!(f, "{}:{}-{}", self.start.page, self.start.line, self.end.line)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Error returned when a location string is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSpanError(String);

impl fmt::Display for ParseSpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid location: {}", self.0)
    }
}

impl std::error::Error for ParseSpanError {}

impl FromStr for Span {
    type Err = ParseSpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSpanError(s.to_string());

        // Split "start-end" on the first '-' after the start's colon, so a
        // negative front-matter page ("-1:4") is not mistaken for a range.
        let colon = s.find(':').ok_or_else(err)?;
        let (start, end) = match s[colon..].find('-') {
            Some(dash) => (&s[..colon + dash], Some(&s[colon + dash + 1..])),
            None => (s, None),
        };

        let start = parse_position(start).ok_or_else(err)?;
        let end = match end {
            None => start,
            Some(end) if end.contains(':') => parse_position(end).ok_or_else(err)?,
            Some(line) => LinePosition::new(start.page, line.parse().map_err(|_| err())?),
        };

        if end < start {
            return Err(err());
        }
        Ok(Span { start, end })
    }
}

fn parse_position(s: &str) -> Option<LinePosition> {
    let (page, line) = s.split_once(':')?;
    Some(LinePosition::new(page.parse().ok()?, line.parse().ok()?))
}

/// One question/answer exchange recovered from the examination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaItem {
    /// Question text, marker stripped
    pub question: String,
    /// Lines the question spans
    pub question_location: String,
    /// Answer text, marker stripped
    pub answer: String,
    /// Lines the answer spans
    pub answer_location: String,
    /// Colloquy attached to this exchange, speaker prefixes kept
    pub colloquy: Option<String>,
    /// Lines the colloquy spans
    pub colloquy_location: Option<String>,
    /// Lines the whole exchange spans
    pub location: String,
}

impl QaItem {
    /// Parsed question location.
    pub fn question_span(&self) -> Option<Span> {
        self.question_location.parse().ok()
    }

    /// Parsed answer location.
    pub fn answer_span(&self) -> Option<Span> {
        self.answer_location.parse().ok()
    }

    /// Parsed overall location.
    pub fn span(&self) -> Option<Span> {
        self.location.parse().ok()
    }
}

/// A question that never received an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingQuestion {
    /// Question text
    pub question: String,
    /// Lines the question spans
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(page: i32, line: u32) -> LinePosition {
        LinePosition::new(page, line)
    }

    #[test]
    fn test_span_format_single_line() {
        assert_eq!(Span::at(pos(12, 4)).to_string(), "12:4");
    }

    #[test]
    fn test_span_format_same_page() {
        let mut span = Span::at(pos(12, 4));
        span.extend(pos(12, 9));
        assert_eq!(span.to_string(), "12:4-9");
    }

    #[test]
    fn test_span_format_cross_page() {
        let mut span = Span::at(pos(12, 24));
        span.extend(pos(13, 2));
        assert_eq!(span.to_string(), "12:24-13:2");
    }

    #[test]
    fn test_extend_never_moves_backwards() {
        let mut span = Span::at(pos(5, 10));
        span.extend(pos(5, 3));
        assert_eq!(span.end, pos(5, 10));
    }

    #[test]
    fn test_parse_all_forms() {
        assert_eq!("12:4".parse::<Span>().unwrap(), Span::at(pos(12, 4)));
        assert_eq!(
            "12:4-9".parse::<Span>().unwrap(),
            Span {
                start: pos(12, 4),
                end: pos(12, 9)
            }
        );
        assert_eq!(
            "12:24-13:2".parse::<Span>().unwrap(),
            Span {
                start: pos(12, 24),
                end: pos(13, 2)
            }
        );
    }

    #[test]
    fn test_parse_negative_page() {
        let span: Span = "-1:3-0:2".parse().unwrap();
        assert_eq!(span.start, pos(-1, 3));
        assert_eq!(span.end, pos(0, 2));
        assert_eq!(span.to_string(), "-1:3-0:2");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Span>().is_err());
        assert!("12".parse::<Span>().is_err());
        assert!("12:x".parse::<Span>().is_err());
        assert!("12:9-4".parse::<Span>().is_err());
    }

    #[test]
    fn test_cover() {
        let q = Span::at(pos(3, 5));
        let a = Span {
            start: pos(3, 6),
            end: pos(4, 1),
        };
        assert_eq!(q.cover(&a).to_string(), "3:5-4:1");
    }

    #[test]
    fn test_position_ordering() {
        assert!(pos(2, 25) < pos(3, 1));
        assert!(pos(3, 1) < pos(3, 2));
    }
}
