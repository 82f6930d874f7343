//! Examination parsing: recover question/answer testimony from the global
//! line stream.

mod clean;
mod options;
mod parser;
mod rules;

pub use clean::{clean_line, collapse_whitespace};
pub use options::{ParserOptions, UnansweredPolicy};
pub use parser::{ExaminationOutcome, ExaminationParser, ParseState};
pub use rules::{Marker, MarkerKind, Rule, RuleSet};

use crate::model::{GlobalLine, QaItem};

/// Parse testimony with the standard rules, discarding unanswered questions.
pub fn parse_examination(lines: &[GlobalLine]) -> Vec<QaItem> {
    ExaminationParser::default().parse(lines).items
}
