//! Integration tests for rendering extracted transcripts.

use depoparse::enrich::{Enricher, Summarizer, SummarySource, TopicInfo};
use depoparse::error::{Error, Result};
use depoparse::render::{
    enriched_to_markdown, testimony_to_markdown, to_json, to_markdown, to_text, JsonFormat,
    RenderOptions,
};
use depoparse::{
    build_transcript, parse_examination, PageExtraction, QaItem, ReconstructedLine, Transcript,
    TranscriptMetadata, TranscriptPage,
};

fn transcript() -> Transcript {
    let pages = vec![TranscriptPage {
        extraction: PageExtraction::new(3, 612.0, 792.0),
        lines: vec![
            ReconstructedLine::numbered("1", "Q. Were you employed by Acme in 2019?", 100.0),
            ReconstructedLine::numbered("2", "A. Yes, I was.", 100.0),
            ReconstructedLine::numbered("3", "Q. Who was your supervisor?", 100.0),
            ReconstructedLine::numbered("4", "A. Mr. Jones ran the office.", 100.0),
        ],
    }];
    let lines = build_transcript(&pages, 2);
    let testimony = parse_examination(&lines);
    Transcript {
        metadata: TranscriptMetadata {
            source: Some("doe-deposition.pdf".to_string()),
            page_count: 3,
            printed_page_offset: 2,
            ..Default::default()
        },
        pages,
        lines,
        testimony,
        unanswered_questions: 0,
        dangling: vec![],
    }
}

#[test]
fn test_text_output() {
    let text = to_text(&transcript(), &RenderOptions::default()).unwrap();
    assert!(text.contains("PAGE 3 (612 x 792) - Confidence: 100.0%"));
    assert!(text.contains("   1 | Q. Were you employed by Acme in 2019?"));
    assert!(text.contains("   4 | A. Mr. Jones ran the office."));
}

#[test]
fn test_markdown_output() {
    let md = to_markdown(&transcript(), &RenderOptions::default()).unwrap();
    assert!(md.contains("*Source: doe-deposition.pdf*"));
    assert!(md.contains("## Page 3"));
    assert!(md.contains("**Q:** Were you employed by Acme in 2019? *(1:1)*"));
    assert!(md.contains("**A:** Mr. Jones ran the office. *(1:4)*"));

    let testimony = testimony_to_markdown(&transcript().testimony);
    assert!(testimony.starts_with("# Testimony"));
    assert!(!testimony.contains("## Page"));
}

#[test]
fn test_json_output() {
    let transcript = transcript();
    let json = to_json(&transcript, JsonFormat::Compact).unwrap();
    assert!(json.contains("\"printedPageOffset\":2"));
    assert!(json.contains("\"location\":\"1:1-2\""));

    let items: Vec<QaItem> =
        serde_json::from_str(&to_json(&transcript.testimony, JsonFormat::Pretty).unwrap()).unwrap();
    assert_eq!(items, transcript.testimony);
}

#[test]
fn test_rule_based_enrichment() {
    let enriched = Enricher::rule_based().enrich(&transcript().testimony);
    assert_eq!(enriched.len(), 2);
    assert_eq!(enriched[0].summary, "Yes: Were you employed by Acme in 2019?");
    assert_eq!(enriched[0].topic.topic, "Employment");
    assert!(enriched[0].topic.has_dates);
    assert_eq!(enriched[1].topic.people_mentioned, vec!["Mr. Jones".to_string()]);
    assert!(enriched.iter().all(|e| e.source == SummarySource::Fallback));

    let md = enriched_to_markdown(&enriched);
    assert!(md.contains("### Employment (1:1-2)"));
    assert!(md.contains("People: Mr. Jones"));

    let json = to_json(&enriched, JsonFormat::Compact).unwrap();
    assert!(json.contains("\"summary\":\"Yes: Were you employed by Acme in 2019?\""));
    assert!(json.contains("\"questionLocation\":\"1:1\""));
}

struct Offline;

impl Summarizer for Offline {
    fn name(&self) -> &str {
        "offline"
    }

    fn summarize(&self, _question: &str, _answer: &str, _colloquy: Option<&str>) -> Result<String> {
        Err(Error::Summarize("service unreachable".to_string()))
    }

    fn classify(&self, _question: &str, _answer: &str) -> Result<TopicInfo> {
        Err(Error::Summarize("service unreachable".to_string()))
    }
}

#[test]
fn test_unreachable_service_uses_rules() {
    let enriched = Enricher::with_primary(Box::new(Offline)).enrich(&transcript().testimony);
    assert_eq!(enriched.len(), 2);
    assert!(enriched.iter().all(|e| e.source == SummarySource::Fallback));
    assert_eq!(enriched[0].summary, "Yes: Were you employed by Acme in 2019?");
}
