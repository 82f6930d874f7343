//! Summarizers for question/answer exchanges.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Classification of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInfo {
    /// Topic bucket
    pub topic: String,
    /// People named with an honorific, in order of first mention
    pub people_mentioned: Vec<String>,
    /// Whether a date or year appears
    pub has_dates: bool,
}

/// Produces a short summary and a topic classification for an exchange.
///
/// Implementations backed by remote services return `Error::Summarize` on
/// failure; the [`Enricher`](super::Enricher) then falls back to the
/// rule-based summarizer.
pub trait Summarizer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// One-line summary of an exchange.
    fn summarize(&self, question: &str, answer: &str, colloquy: Option<&str>) -> Result<String>;

    /// Topic, people and date flags for an exchange.
    fn classify(&self, question: &str, answer: &str) -> Result<TopicInfo>;
}

const MAX_SUMMARY_CHARS: usize = 200;

const YES: &[&str] = &["yes", "yeah", "yep", "correct", "that's correct", "right", "i did", "it is"];
const NO: &[&str] = &["no", "nope", "incorrect", "i did not", "i didn't", "it is not", "not that i recall"];

const TOPICS: &[(&str, &[&str])] = &[
    (
        "Employment",
        &["job", "employ", "work", "hired", "fired", "salary", "supervisor", "manager", "position"],
    ),
    (
        "Medical",
        &["doctor", "hospital", "injur", "pain", "treatment", "medical", "surgery", "medication"],
    ),
    (
        "Financial",
        &["money", "paid", "payment", "bank", "account", "loan", "invoice", "dollars"],
    ),
    (
        "Documents",
        &["document", "exhibit", "email", "letter", "contract", "sign", "form", "record"],
    ),
    (
        "Incident",
        &["accident", "incident", "happened", "crash", "collision", "scene", "police"],
    ),
    (
        "Background",
        &["name", "address", "born", "school", "education", "degree", "married", "live"],
    ),
];

fn person_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:Mr|Ms|Mrs|Dr|MR|MS|MRS|DR)\.?\s+[A-Z][A-Za-z'\-]+").expect("person pattern")
    })
}

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b|\b\d{1,2}/\d{1,2}/\d{2,4}\b|\b(?:19|20)\d{2}\b",
        )
        .expect("date pattern")
    })
}

/// Deterministic summarizer that needs no service.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedSummarizer;

impl RuleBasedSummarizer {
    /// Create the summarizer.
    pub fn new() -> Self {
        Self
    }
}

fn normalized_reply(answer: &str) -> String {
    answer
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
        .replace('\u{2019}', "'")
}

fn polarity(answer: &str) -> Option<&'static str> {
    let reply = normalized_reply(answer);
    // "Yes, sir." and "No, ma'am." count; anything longer is a real answer.
    let head = reply.split(',').next().unwrap_or("").trim();
    let short = reply.split_whitespace().count() <= 3;
    if YES.contains(&reply.as_str()) || (short && YES.contains(&head)) {
        Some("Yes")
    } else if NO.contains(&reply.as_str()) || (short && NO.contains(&head)) {
        Some("No")
    } else {
        None
    }
}

/// Cut `text` to at most `max` characters at a word boundary.
pub fn truncate_words(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() > max {
            break;
        }
        if extra == 1 {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = text.chars().take(max).collect();
    }
    out.push_str("...");
    out
}

impl Summarizer for RuleBasedSummarizer {
    fn name(&self) -> &str {
        "rule-based"
    }

    fn summarize(&self, question: &str, answer: &str, _colloquy: Option<&str>) -> Result<String> {
        Ok(match polarity(answer) {
            Some(word) => format!("{}: {}", word, question.trim()),
            None => truncate_words(answer.trim(), MAX_SUMMARY_CHARS),
        })
    }

    fn classify(&self, question: &str, answer: &str) -> Result<TopicInfo> {
        let text = format!("{} {}", question, answer);

        let mut people_mentioned: Vec<String> = Vec::new();
        for m in person_pattern().find_iter(&text) {
            let name = m.as_str().to_string();
            if !people_mentioned.contains(&name) {
                people_mentioned.push(name);
            }
        }

        let lower = text.to_lowercase();
        let topic = TOPICS
            .iter()
            .map(|(topic, words)| (*topic, words.iter().filter(|w| lower.contains(*w)).count()))
            .filter(|(_, hits)| *hits > 0)
            .fold(None::<(&str, usize)>, |best, (topic, hits)| match best {
                Some((_, top)) if top >= hits => best,
                _ => Some((topic, hits)),
            })
            .map(|(topic, _)| topic)
            .unwrap_or("General");

        Ok(TopicInfo {
            topic: topic.to_string(),
            people_mentioned,
            has_dates: date_pattern().is_match(&text),
        })
    }
}
