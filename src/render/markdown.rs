//! Markdown rendering of transcripts and testimony.

use crate::enrich::EnrichedQaItem;
use crate::error::Result;
use crate::model::{QaItem, Transcript, TranscriptPage};

use super::RenderOptions;

/// Convert a transcript to Markdown.
pub fn to_markdown(transcript: &Transcript, options: &RenderOptions) -> Result<String> {
    MarkdownRenderer::new(options.clone()).render(transcript)
}

/// Render testimony alone as Markdown.
pub fn testimony_to_markdown(items: &[QaItem]) -> String {
    let mut output = String::from("# Testimony\n\n");
    for item in items {
        render_exchange(&mut output, item);
    }
    output.trim_end().to_string()
}

/// Render enriched testimony as Markdown, one section per exchange.
pub fn enriched_to_markdown(items: &[EnrichedQaItem]) -> String {
    let mut output = String::from("# Testimony\n\n");
    for enriched in items {
        output.push_str(&format!(
            "### {} ({})\n\n",
            enriched.topic.topic, enriched.item.location
        ));
        output.push_str(&format!("*{}*\n\n", enriched.summary));
        if !enriched.topic.people_mentioned.is_empty() {
            output.push_str(&format!(
                "People: {}\n\n",
                enriched.topic.people_mentioned.join(", ")
            ));
        }
        render_exchange(&mut output, &enriched.item);
    }
    output.trim_end().to_string()
}

fn render_exchange(output: &mut String, item: &QaItem) {
    output.push_str(&format!("**Q:** {} *({})*  \n", item.question, item.question_location));
    if let (Some(colloquy), Some(location)) = (&item.colloquy, &item.colloquy_location) {
        output.push_str(&format!("> {} *({})*  \n", colloquy, location));
    }
    output.push_str(&format!("**A:** {} *({})*\n\n", item.answer, item.answer_location));
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a transcript to Markdown.
    pub fn render(&self, transcript: &Transcript) -> Result<String> {
        let mut output = String::from("# Transcript\n\n");

        if let Some(source) = &transcript.metadata.source {
            output.push_str(&format!("*Source: {}*\n\n", source));
        }

        for page in &transcript.pages {
            if self.options.page_selection.includes(page.extraction.page_number) {
                self.render_page(&mut output, page);
            }
        }

        if self.options.include_testimony && !transcript.testimony.is_empty() {
            output.push_str("## Testimony\n\n");
            for item in &transcript.testimony {
                render_exchange(&mut output, item);
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn render_page(&self, output: &mut String, page: &TranscriptPage) {
        let extraction = &page.extraction;
        output.push_str(&format!("## Page {}\n\n", extraction.page_number));
        if self.options.include_confidence {
            output.push_str(&format!("*Confidence: {:.1}%*\n\n", extraction.confidence));
        }

        if self.options.include_margins && !extraction.headers.is_empty() {
            output.push_str("### Headers\n\n");
            for header in &extraction.headers {
                output.push_str(&format!("{}  \n", header.text()));
            }
            output.push('\n');
        }

        if !page.lines.is_empty() {
            output.push_str("### Content\n\n");
            for line in &page.lines {
                if let Some(number) = &line.line_number {
                    output.push_str(&format!("**{}** ", number));
                }
                output.push_str(&format!("{}  \n", line.text));
            }
            output.push('\n');
        }

        if self.options.include_margins && !extraction.footers.is_empty() {
            output.push_str("### Footers\n\n");
            for footer in &extraction.footers {
                output.push_str(&format!("{}  \n", footer.text()));
            }
            output.push('\n');
        }

        output.push_str("---\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::Enricher;
    use crate::model::{PageExtraction, ReconstructedLine, TranscriptMetadata};

    fn item(colloquy: bool) -> QaItem {
        QaItem {
            question: "Did you sign the form?".to_string(),
            question_location: "12:1".to_string(),
            answer: "Yes.".to_string(),
            answer_location: "12:3".to_string(),
            colloquy: colloquy.then(|| "MR. SMITH: Objection, form.".to_string()),
            colloquy_location: colloquy.then(|| "12:2".to_string()),
            location: "12:1-3".to_string(),
        }
    }

    fn transcript() -> Transcript {
        Transcript {
            metadata: TranscriptMetadata::default(),
            pages: vec![TranscriptPage {
                extraction: PageExtraction::new(1, 612.0, 792.0),
                lines: vec![
                    ReconstructedLine::numbered("1", "Q. Did you sign the form?", 100.0),
                    ReconstructedLine::unnumbered("Orphan", 100.0),
                ],
            }],
            lines: vec![],
            testimony: vec![item(false)],
            unanswered_questions: 0,
            dangling: vec![],
        }
    }

    #[test]
    fn test_transcript_markdown() {
        let md = to_markdown(&transcript(), &RenderOptions::default()).unwrap();
        assert!(md.starts_with("# Transcript\n\n## Page 1\n\n### Content\n\n"));
        assert!(md.contains("**1** Q. Did you sign the form?  \nOrphan  \n"));
        assert!(md.contains("---\n\n## Testimony"));
        assert!(md.contains("**Q:** Did you sign the form? *(12:1)*"));
        assert!(md.ends_with("**A:** Yes. *(12:3)*"));
    }

    #[test]
    fn test_confidence_and_no_testimony() {
        let options = RenderOptions::new().with_confidence(true).with_testimony(false);
        let md = to_markdown(&transcript(), &options).unwrap();
        assert!(md.contains("*Confidence: 100.0%*"));
        assert!(!md.contains("## Testimony"));
    }

    #[test]
    fn test_testimony_with_colloquy() {
        let md = testimony_to_markdown(&[item(true)]);
        assert_eq!(
            md,
            "# Testimony\n\n**Q:** Did you sign the form? *(12:1)*  \n> MR. SMITH: Objection, form. *(12:2)*  \n**A:** Yes. *(12:3)*"
        );
    }

    #[test]
    fn test_enriched_markdown() {
        let enriched = Enricher::rule_based().enrich(&[item(false)]);
        let md = enriched_to_markdown(&enriched);
        assert!(md.contains("### Documents (12:1-3)"));
        assert!(md.contains("*Yes: Did you sign the form?*"));
    }
}
