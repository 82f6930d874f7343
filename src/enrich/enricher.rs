//! Attach summaries and topics to testimony, with a rule-based fallback.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::QaItem;

use super::summarizer::{RuleBasedSummarizer, Summarizer, TopicInfo};

/// Consecutive primary failures after which the primary is skipped.
pub const DEFAULT_MAX_FAILURES: usize = 3;

/// Which summarizer produced an enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// The configured primary summarizer
    Primary,
    /// The rule-based fallback
    Fallback,
}

/// A question/answer exchange with its summary and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedQaItem {
    /// The exchange
    #[serde(flatten)]
    pub item: QaItem,
    /// One-line summary
    pub summary: String,
    /// Topic classification
    #[serde(flatten)]
    pub topic: TopicInfo,
    /// Producer of the summary
    pub source: SummarySource,
}

/// Enriches exchanges using an optional primary summarizer.
///
/// Each exchange goes to the primary first; on error the fallback is used
/// and a warning logged. After `max_failures` consecutive primary errors the
/// primary is not called again for the rest of the run, which keeps a
/// rate-limited or offline service from being hammered.
pub struct Enricher {
    primary: Option<Box<dyn Summarizer>>,
    fallback: RuleBasedSummarizer,
    max_failures: usize,
}

impl Default for Enricher {
    fn default() -> Self {
        Self {
            primary: None,
            fallback: RuleBasedSummarizer::new(),
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }
}

impl Enricher {
    /// Enricher that only uses the rule-based summarizer.
    pub fn rule_based() -> Self {
        Self::default()
    }

    /// Enricher trying `primary` first.
    pub fn with_primary(primary: Box<dyn Summarizer>) -> Self {
        Self {
            primary: Some(primary),
            ..Self::default()
        }
    }

    /// Set the consecutive-failure limit (minimum 1).
    pub fn with_max_failures(mut self, max_failures: usize) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    fn run(summarizer: &dyn Summarizer, item: &QaItem) -> Result<(String, TopicInfo)> {
        let summary = summarizer.summarize(&item.question, &item.answer, item.colloquy.as_deref())?;
        let topic = summarizer.classify(&item.question, &item.answer)?;
        Ok((summary, topic))
    }

    /// Enrich every exchange, in order.
    pub fn enrich(&self, items: &[QaItem]) -> Vec<EnrichedQaItem> {
        let mut failures = 0;
        let mut out = Vec::with_capacity(items.len());

        for item in items {
            let mut primary_result = None;
            if let Some(primary) = self.primary.as_deref().filter(|_| failures < self.max_failures) {
                match Self::run(primary, item) {
                    Ok(result) => {
                        failures = 0;
                        primary_result = Some(result);
                    }
                    Err(e) => {
                        failures += 1;
                        log::warn!(
                            "summarizer {} failed at {}: {}; using fallback",
                            primary.name(),
                            item.location,
                            e
                        );
                        if failures == self.max_failures {
                            log::warn!(
                                "summarizer {} disabled after {} consecutive failures",
                                primary.name(),
                                failures
                            );
                        }
                    }
                }
            }

            let (source, (summary, topic)) = match primary_result {
                Some(result) => (SummarySource::Primary, result),
                None => (SummarySource::Fallback, self.fallback_for(item)),
            };
            out.push(EnrichedQaItem {
                item: item.clone(),
                summary,
                topic,
                source,
            });
        }

        log::info!(
            "enriched {} exchanges ({} by fallback)",
            out.len(),
            out.iter().filter(|e| e.source == SummarySource::Fallback).count()
        );
        out
    }

    fn fallback_for(&self, item: &QaItem) -> (String, TopicInfo) {
        // The rule-based summarizer cannot fail.
        Self::run(&self.fallback, item).unwrap_or_else(|_| (item.answer.clone(), TopicInfo::default()))
    }
}
