//! Examination parser options.

use super::rules::RuleSet;

/// What to do with a question that never receives an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnansweredPolicy {
    /// Drop it and count it
    #[default]
    Discard,
    /// Drop it from the testimony but return it for review
    Collect,
}

/// Options for the examination parser.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Marker rules, in match order
    pub rules: RuleSet,
    /// Handling of unanswered questions
    pub unanswered: UnansweredPolicy,
}

impl ParserOptions {
    /// Create options with the standard rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Set the unanswered-question policy.
    pub fn with_unanswered(mut self, policy: UnansweredPolicy) -> Self {
        self.unanswered = policy;
        self
    }

    /// Keep unanswered questions for review.
    pub fn collect_unanswered(self) -> Self {
        self.with_unanswered(UnansweredPolicy::Collect)
    }
}
