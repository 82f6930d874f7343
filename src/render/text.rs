//! Plain text rendering of reconstructed transcript pages.

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::model::{ClassifiedBlock, Transcript, TranscriptPage};

use super::RenderOptions;

/// Convert a transcript to the page-by-page plain text layout.
pub fn to_text(transcript: &Transcript, options: &RenderOptions) -> Result<String> {
    let mut output = String::new();
    for page in &transcript.pages {
        if options.page_selection.includes(page.extraction.page_number) {
            render_page(&mut output, page, options)
                .map_err(|e| Error::Render(format!("text output: {}", e)))?;
        }
    }
    Ok(output)
}

fn render_page(output: &mut String, page: &TranscriptPage, options: &RenderOptions) -> std::fmt::Result {
    let extraction = &page.extraction;
    let rule = "=".repeat(80);
    writeln!(output, "{}", rule)?;
    writeln!(
        output,
        "PAGE {} ({:.0} x {:.0}) - Confidence: {:.1}%",
        extraction.page_number, extraction.width, extraction.height, extraction.confidence
    )?;
    writeln!(output, "{}\n", rule)?;

    if options.include_margins && !extraction.headers.is_empty() {
        output.push_str("--- HEADERS ---\n");
        render_blocks(output, &extraction.headers, options)?;
        output.push('\n');
    }

    if !page.lines.is_empty() {
        output.push_str("--- CONTENT ---\n");
        for line in &page.lines {
            match &line.line_number {
                Some(number) => write!(output, "{:>4} | ", number)?,
                None => output.push_str("     | "),
            }
            output.push_str(&line.text);
            if options.include_confidence {
                write!(output, " [{:.1}%]", line.confidence)?;
            }
            output.push('\n');
        }
        output.push('\n');
    }

    if options.include_margins && !extraction.footers.is_empty() {
        output.push_str("--- FOOTERS ---\n");
        render_blocks(output, &extraction.footers, options)?;
        output.push('\n');
    }
    Ok(())
}

fn render_blocks(output: &mut String, blocks: &[ClassifiedBlock], options: &RenderOptions) -> std::fmt::Result {
    for block in blocks {
        if options.include_positions {
            write!(output, "[{:.0}, {:.0}] ", block.fragment.x, block.fragment.y)?;
        }
        output.push_str(block.text());
        if options.include_confidence {
            write!(output, " [{:.1}%]", block.confidence())?;
        }
        output.push('\n');
    }
    Ok(())
}
