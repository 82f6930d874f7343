//! Marker detection rules.
//!
//! Each rule is a named regex tagged with the [`MarkerKind`] it signals.
//! Rules are tried in order and the first match wins, so more specific
//! rules go first. A pattern with a `body` capture group yields that group
//! as the line's text (the marker is stripped); otherwise the whole line is
//! kept, which is how colloquy keeps its speaker prefix.

use regex::Regex;

use crate::error::{Error, Result};

/// What a matched line means to the examination state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// `Q.` and friends
    Question,
    /// `A.`, `ANSWER:`, `THE WITNESS:`
    Answer,
    /// Attorney, reporter, court or videographer remarks and parentheticals
    Colloquy,
    /// `BY MR. SMITH:`; starts the section, colloquy once it has started
    Examiner,
    /// `EXAMINATION`, `CROSS-EXAMINATION`, ...
    ExaminationHeader,
    /// Certificate, signature, errata or penalty-of-perjury headers
    SectionEnd,
}

/// A named detection rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    kind: MarkerKind,
    pattern: Regex,
}

/// A line recognized by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'r> {
    /// Kind signalled by the rule
    pub kind: MarkerKind,
    /// Name of the rule that matched
    pub rule: &'r str,
    /// Text of the line with the marker stripped where the rule says so
    pub body: String,
}

impl Rule {
    /// Compile a rule. Invalid patterns are configuration errors.
    pub fn new(name: impl Into<String>, kind: MarkerKind, pattern: &str) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("rule {}: {}", name, e)))?;
        Ok(Self {
            name,
            kind,
            pattern,
        })
    }

    /// Rule name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind this rule signals.
    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    /// Match a cleaned line.
    pub fn detect(&self, line: &str) -> Option<Marker<'_>> {
        let caps = self.pattern.captures(line)?;
        let has_body = self.pattern.capture_names().flatten().any(|n| n == "body");
        let body = if has_body {
            caps.name("body").map(|m| m.as_str().trim()).unwrap_or("")
        } else {
            line
        };
        Some(Marker {
            kind: self.kind,
            rule: &self.name,
            body: body.to_string(),
        })
    }
}

const HONORIFIC_NAME: &str = r"(?:MR|MS|MRS|DR)\.?\s+[A-Z][A-Za-z.'\-]*(?:\s+[A-Z][A-Za-z.'\-]*)*";

/// Ordered collection of rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    /// A set with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Rules for US-style deposition transcripts.
    pub fn standard() -> Self {
        let examiner = format!(r"^BY\s+{}\s*:?$", HONORIFIC_NAME);
        let attorney = format!(r"^{}\s*:", HONORIFIC_NAME);
        let table: [(&str, MarkerKind, &str); 17] = [
            ("certificate", MarkerKind::SectionEnd, r"^(?:[A-Z']+\s+)*CERTIFICATE(?:\s+[A-Z'\s]+)?$"),
            ("perjury", MarkerKind::SectionEnd, r"^[A-Z,'\s]*PENALTY\s+OF\s+PERJURY[A-Z,'\s]*$"),
            ("signature", MarkerKind::SectionEnd, r"^(?:(?:WITNESS|DEPONENT)'?S?\s+)?SIGNATURE(?:\s+PAGE)?\s*$"),
            ("acknowledgment", MarkerKind::SectionEnd, r"^ACKNOWLEDG(?:E)?MENT\s+OF\s+(?:DEPONENT|WITNESS)\b"),
            ("errata", MarkerKind::SectionEnd, r"^ERRATA\b"),
            (
                "examination",
                MarkerKind::ExaminationHeader,
                r"^(?:(?:FURTHER\s+)?(?:DIRECT|CROSS|REDIRECT|RECROSS)[\s\-]*)?EXAMINATION\b",
            ),
            ("examiner", MarkerKind::Examiner, &examiner),
            ("witness", MarkerKind::Answer, r"^THE\s+WITNESS\s*:\s*(?P<body>.*)$"),
            ("question", MarkerKind::Question, r"^Q\s*[.:]\s*(?P<body>.*)$"),
            ("question_word", MarkerKind::Question, r"^(?:QUESTION|Question)\s*[.:]\s*(?P<body>.*)$"),
            // A bare letter only counts when what follows is not lowercase,
            // so "A lot of people" stays a continuation.
            ("question_bare", MarkerKind::Question, r"^Q(?:\s+(?P<body>[^a-z].*))?$"),
            ("answer", MarkerKind::Answer, r"^A\s*[.:]\s*(?P<body>.*)$"),
            ("answer_word", MarkerKind::Answer, r"^(?:ANSWER|Answer)\s*[.:]\s*(?P<body>.*)$"),
            ("answer_bare", MarkerKind::Answer, r"^A(?:\s+(?P<body>[^a-z].*))?$"),
            ("attorney", MarkerKind::Colloquy, &attorney),
            ("officer", MarkerKind::Colloquy, r"^THE\s+(?:REPORTER|COURT|VIDEOGRAPHER)\s*:"),
            ("parenthetical", MarkerKind::Colloquy, r"^\(.*\)$"),
        ];

        let rules = table
            .iter()
            .map(|(name, kind, pattern)| {
                Rule::new(*name, *kind, pattern).expect("built-in rule pattern")
            })
            .collect();
        Self { rules }
    }

    /// Add a rule ahead of the existing ones.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Add a rule after the existing ones.
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Remove every rule with the given name.
    pub fn without(mut self, name: &str) -> Self {
        self.rules.retain(|r| r.name != name);
        self
    }

    /// Rules in match order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching a cleaned line.
    pub fn detect(&self, line: &str) -> Option<Marker<'_>> {
        self.rules.iter().find_map(|rule| rule.detect(line))
    }

    /// Kind of a cleaned line, if any rule matches.
    pub fn kind_of(&self, line: &str) -> Option<MarkerKind> {
        self.detect(line).map(|m| m.kind)
    }
}
