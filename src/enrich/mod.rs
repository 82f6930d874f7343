//! Optional summary and topic enrichment of testimony.

mod enricher;
mod summarizer;

pub use enricher::{EnrichedQaItem, Enricher, SummarySource, DEFAULT_MAX_FAILURES};
pub use summarizer::{truncate_words, RuleBasedSummarizer, Summarizer, TopicInfo};
