//! Question/answer state machine.
//!
//! Single pass over the global line stream with no lookahead. Lines are
//! cleaned, matched against the rule set, and the resulting marker kind
//! drives the transitions below.
//!
//! ```text
//! Searching --Q / EXAMINATION / BY--> AwaitingQuestion | InQuestion
//! InQuestion --colloquy--> InColloquy --A--> InAnswer --Q--> InQuestion
//! any active state --end marker--> Finished
//! ```

use crate::model::{DanglingQuestion, GlobalLine, LinePosition, QaItem, Span};

use super::clean::{append_text, clean_line};
use super::options::{ParserOptions, UnansweredPolicy};
use super::rules::MarkerKind;

/// Parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Before the examination section
    Searching,
    /// Section started, no open question
    AwaitingQuestion,
    /// Accumulating a question
    InQuestion,
    /// Accumulating colloquy for the open exchange
    InColloquy,
    /// Accumulating an answer
    InAnswer,
    /// An end marker was seen; remaining lines are ignored
    Finished,
}

/// Everything the parser recovered from a line stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExaminationOutcome {
    /// Complete question/answer exchanges in transcript order
    pub items: Vec<QaItem>,
    /// Questions dropped because no answer followed
    pub unanswered: usize,
    /// The dropped questions, when the policy collects them
    pub dangling: Vec<DanglingQuestion>,
    /// Whether an examination section was found at all
    pub section_found: bool,
    /// Whether an end marker stopped the scan
    pub terminated: bool,
}

#[derive(Debug)]
struct Part {
    text: String,
    span: Span,
}

impl Part {
    fn open(text: &str, pos: LinePosition) -> Self {
        Self {
            text: text.to_string(),
            span: Span::at(pos),
        }
    }

    fn push(&mut self, text: &str, pos: LinePosition) {
        append_text(&mut self.text, text);
        self.span.extend(pos);
    }
}

fn push_or_open(part: &mut Option<Part>, text: &str, pos: LinePosition) {
    match part {
        Some(part) => part.push(text, pos),
        None => *part = Some(Part::open(text, pos)),
    }
}

#[derive(Debug)]
struct Exchange {
    question: Part,
    answer: Option<Part>,
    colloquy: Option<Part>,
}

impl Exchange {
    fn into_item(self) -> Result<QaItem, DanglingQuestion> {
        let Some(answer) = self.answer else {
            return Err(DanglingQuestion {
                question: self.question.text,
                location: self.question.span.to_string(),
            });
        };

        let mut location = self.question.span.cover(&answer.span);
        if let Some(colloquy) = &self.colloquy {
            location = location.cover(&colloquy.span);
        }

        Ok(QaItem {
            question: self.question.text,
            question_location: self.question.span.to_string(),
            answer: answer.text,
            answer_location: answer.span.to_string(),
            colloquy_location: self.colloquy.as_ref().map(|c| c.span.to_string()),
            colloquy: self.colloquy.map(|c| c.text),
            location: location.to_string(),
        })
    }
}

struct Machine<'o> {
    options: &'o ParserOptions,
    state: ParseState,
    open: Option<Exchange>,
    outcome: ExaminationOutcome,
}

impl<'o> Machine<'o> {
    fn new(options: &'o ParserOptions) -> Self {
        Self {
            options,
            state: ParseState::Searching,
            open: None,
            outcome: ExaminationOutcome::default(),
        }
    }

    fn feed(&mut self, line: &GlobalLine) {
        let text = clean_line(&line.text);
        if text.is_empty() {
            return;
        }
        let pos = line.position();
        let marker = self
            .options
            .rules
            .detect(&text)
            .map(|m| (m.kind, m.body));

        if self.state == ParseState::Searching {
            match marker {
                Some((MarkerKind::Question, body)) => {
                    self.outcome.section_found = true;
                    self.open_question(&body, pos);
                }
                Some((MarkerKind::ExaminationHeader | MarkerKind::Examiner, _)) => {
                    log::debug!("examination starts at {}", pos);
                    self.outcome.section_found = true;
                    self.state = ParseState::AwaitingQuestion;
                }
                _ => {}
            }
            return;
        }

        match marker {
            Some((MarkerKind::Question, body)) => {
                self.flush();
                self.open_question(&body, pos);
            }
            Some((MarkerKind::Answer, body)) => self.answer(&body, pos),
            Some((MarkerKind::Colloquy | MarkerKind::Examiner, body)) => self.colloquy(&body, pos),
            Some((MarkerKind::ExaminationHeader, _)) => {
                self.flush();
                self.state = ParseState::AwaitingQuestion;
            }
            Some((MarkerKind::SectionEnd, _)) => {
                log::debug!("examination ends at {}", pos);
                self.flush();
                self.outcome.terminated = true;
                self.state = ParseState::Finished;
            }
            None => self.continuation(&text, pos),
        }
    }

    fn open_question(&mut self, text: &str, pos: LinePosition) {
        self.open = Some(Exchange {
            question: Part::open(text, pos),
            answer: None,
            colloquy: None,
        });
        self.state = ParseState::InQuestion;
    }

    fn answer(&mut self, text: &str, pos: LinePosition) {
        match &mut self.open {
            Some(exchange) => {
                push_or_open(&mut exchange.answer, text, pos);
                self.state = ParseState::InAnswer;
            }
            None => log::debug!("answer without a question at {}", pos),
        }
    }

    fn colloquy(&mut self, text: &str, pos: LinePosition) {
        if let Some(exchange) = &mut self.open {
            push_or_open(&mut exchange.colloquy, text, pos);
            self.state = ParseState::InColloquy;
        }
    }

    fn continuation(&mut self, text: &str, pos: LinePosition) {
        let Some(exchange) = &mut self.open else {
            return;
        };
        let part = match self.state {
            ParseState::InQuestion => Some(&mut exchange.question),
            ParseState::InAnswer => exchange.answer.as_mut(),
            ParseState::InColloquy => exchange.colloquy.as_mut(),
            _ => None,
        };
        if let Some(part) = part {
            part.push(text, pos);
        }
    }

    fn flush(&mut self) {
        let Some(exchange) = self.open.take() else {
            return;
        };
        match exchange.into_item() {
            Ok(item) => self.outcome.items.push(item),
            Err(dangling) => {
                log::debug!("unanswered question at {}", dangling.location);
                self.outcome.unanswered += 1;
                if self.options.unanswered == UnansweredPolicy::Collect {
                    self.outcome.dangling.push(dangling);
                }
            }
        }
        self.state = ParseState::AwaitingQuestion;
    }

    fn finish(mut self) -> ExaminationOutcome {
        if self.state != ParseState::Finished {
            self.flush();
        }
        self.outcome
    }
}

/// Examination parser.
#[derive(Debug, Clone, Default)]
pub struct ExaminationParser {
    options: ParserOptions,
}

impl ExaminationParser {
    /// Create a parser with the given options.
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parser options.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a global line stream.
    pub fn parse(&self, lines: &[GlobalLine]) -> ExaminationOutcome {
        let mut machine = Machine::new(&self.options);
        for line in lines {
            machine.feed(line);
            if machine.state == ParseState::Finished {
                break;
            }
        }
        let outcome = machine.finish();

        if !outcome.section_found {
            log::info!("no examination section found");
        } else {
            log::info!(
                "examination: {} exchanges, {} unanswered questions discarded",
                outcome.items.len(),
                outcome.unanswered
            );
        }
        outcome
    }
}
