//! # depoparse
//!
//! Deposition transcript extraction library for Rust.
//!
//! Court-reporter transcripts print a line number in the left margin of every
//! line. This library reads those PDFs (through the digital text layer, or
//! OCR when the layer is missing), rebuilds each numbered line, addresses it
//! as `page:line` using the printed page numbering, and parses the
//! examination section into question/answer pairs with exact locations.
//!
//! ## Quick Start
//!
//! ```no_run
//! use depoparse::{extract_file, render};
//!
//! fn main() -> depoparse::Result<()> {
//!     let transcript = extract_file("deposition.pdf")?;
//!
//!     for item in &transcript.testimony {
//!         println!("[{}] Q: {}", item.location, item.question);
//!         println!("    A: {}", item.answer);
//!     }
//!
//!     let text = render::to_text(&transcript, &render::RenderOptions::default())?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Margin-aware classification**: headers, footers, line numbers, content
//! - **OCR fallback**: sparse pages go through `pdftoppm` + `tesseract`
//! - **Printed page numbering**: offset detected from running headers/footers
//! - **Q/A parsing**: colloquy, continuations and cross-page spans
//! - **Parallel processing**: Uses Rayon for multi-page documents

pub mod detect;
pub mod enrich;
pub mod error;
pub mod examination;
pub mod extract;
pub mod model;
pub mod reconstruct;
pub mod render;

// Re-export commonly used types
pub use detect::{is_pdf, sniff_bytes, sniff_file, PdfHeader};
pub use enrich::{EnrichedQaItem, Enricher, RuleBasedSummarizer, Summarizer, TopicInfo};
pub use error::{Error, Result};
pub use examination::{parse_examination, ExaminationParser, ParserOptions, RuleSet, UnansweredPolicy};
pub use extract::{
    CommandRasterizer, DigitalTextSource, ErrorMode, ExtractOptions, LayoutConfig,
    LopdfTextSource, MarginConfig, OcrEngine, Rasterizer, TesseractCli, TranscriptExtractor,
};
pub use model::{
    BlockType, ClassifiedBlock, DanglingQuestion, ExtractionMethod, GlobalLine, PageExtraction,
    QaItem, ReconstructedLine, TextFragment, Transcript, TranscriptMetadata, TranscriptPage,
};
pub use reconstruct::{build_transcript, reconstruct_page};
pub use render::{JsonFormat, PageSelection, RenderOptions};

use std::path::Path;

/// Extract a transcript from a PDF file with default options.
///
/// OCR is attempted for sparse pages, and for the margin of digital pages
/// without line numbers, when `pdftoppm` (or `gs`) and `tesseract` are
/// installed; otherwise those pages keep their digital text.
///
/// # Example
///
/// ```no_run
/// use depoparse::extract_file;
///
/// let transcript = extract_file("deposition.pdf").unwrap();
/// println!("Q/A pairs: {}", transcript.testimony.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Transcript> {
    extract_file_with_options(path, ExtractOptions::default())
}

/// Extract a transcript from a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use depoparse::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new()
///     .with_ocr(false)
///     .with_page_offset(2)
///     .sequential();
/// let transcript = extract_file_with_options("deposition.pdf", options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    mut options: ExtractOptions,
) -> Result<Transcript> {
    let path = path.as_ref();
    let source = LopdfTextSource::open(path)?;

    if options.source_label.is_none() {
        if let Some(name) = path.file_name() {
            options.source_label = Some(name.to_string_lossy().to_string());
        }
    }

    let ocr = if options.ocr_enabled {
        ocr_backend(path)
    } else {
        None
    };

    let extractor = TranscriptExtractor::new(&source, options);
    match &ocr {
        Some((engine, rasterizer)) => extractor.with_ocr(engine, rasterizer).extract(),
        None => extractor.extract(),
    }
}

/// Extract a transcript from PDF bytes. Pages are read from the digital
/// text layer only.
///
/// # Example
///
/// ```no_run
/// use depoparse::{extract_bytes, ExtractOptions};
///
/// let data = std::fs::read("deposition.pdf").unwrap();
/// let transcript = extract_bytes(&data, ExtractOptions::default()).unwrap();
/// ```
pub fn extract_bytes(data: &[u8], options: ExtractOptions) -> Result<Transcript> {
    let source = LopdfTextSource::from_bytes(data)?;
    TranscriptExtractor::new(&source, options).extract()
}

/// Extract a transcript on tokio's blocking pool.
#[cfg(feature = "async")]
pub async fn extract_file_async<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Transcript> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || extract_file_with_options(path, options))
        .await
        .map_err(|e| Error::Other(format!("extraction task failed: {}", e)))?
}

fn ocr_backend(path: &Path) -> Option<(TesseractCli, CommandRasterizer)> {
    if !extract::command_available("tesseract") {
        log::warn!("tesseract not found; sparse pages will keep their digital text");
        return None;
    }
    match CommandRasterizer::new(path) {
        Ok(rasterizer) => Some((TesseractCli::new(), rasterizer)),
        Err(e) => {
            log::warn!("OCR disabled: {}", e);
            None
        }
    }
}

/// Builder for extracting and rendering transcripts.
///
/// # Example
///
/// ```no_run
/// use depoparse::Depoparse;
///
/// let markdown = Depoparse::new()
///     .without_ocr()
///     .with_page_offset(1)
///     .with_confidence()
///     .extract("deposition.pdf")?
///     .to_markdown()?;
/// # Ok::<(), depoparse::Error>(())
/// ```
pub struct Depoparse {
    extract_options: ExtractOptions,
    render_options: RenderOptions,
}

impl Depoparse {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            extract_options: ExtractOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Abort when a page's text layer cannot be read.
    pub fn strict(mut self) -> Self {
        self.extract_options = self.extract_options.strict();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.extract_options = self.extract_options.sequential();
        self
    }

    /// Never send pages to OCR.
    pub fn without_ocr(mut self) -> Self {
        self.extract_options = self.extract_options.with_ocr(false);
        self
    }

    /// Keep digital pages without line numbers as they are instead of
    /// reading their margins with OCR.
    pub fn without_margin_ocr(mut self) -> Self {
        self.extract_options = self.extract_options.with_hybrid(false);
        self
    }

    /// Set the layout configuration.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.extract_options = self.extract_options.with_layout(layout);
        self
    }

    /// Set the minimum fragment count before OCR is considered.
    pub fn with_min_items(mut self, min_items: usize) -> Self {
        self.extract_options = self.extract_options.with_min_items(min_items);
        self
    }

    /// Fix the printed-page offset.
    pub fn with_page_offset(mut self, offset: i32) -> Self {
        self.extract_options = self.extract_options.with_page_offset(offset);
        self
    }

    /// Keep trailing unanswered questions for inspection.
    pub fn collect_unanswered(mut self) -> Self {
        let parser = self.extract_options.parser.clone().collect_unanswered();
        self.extract_options = self.extract_options.with_parser(parser);
        self
    }

    /// Show confidence scores in rendered output.
    pub fn with_confidence(mut self) -> Self {
        self.render_options = self.render_options.with_confidence(true);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.extract_options = self.extract_options.with_pages(pages.clone());
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Extract a PDF file and return a result wrapper.
    pub fn extract<P: AsRef<Path>>(self, path: P) -> Result<DepoparseResult> {
        let transcript = extract_file_with_options(path, self.extract_options)?;
        Ok(DepoparseResult {
            transcript,
            render_options: self.render_options,
        })
    }

    /// Extract a PDF held in memory.
    pub fn extract_bytes(self, data: &[u8]) -> Result<DepoparseResult> {
        let transcript = extract_bytes(data, self.extract_options)?;
        Ok(DepoparseResult {
            transcript,
            render_options: self.render_options,
        })
    }
}

impl Default for Depoparse {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of extracting a transcript.
pub struct DepoparseResult {
    /// The extracted transcript
    pub transcript: Transcript,
    /// Render options to use
    render_options: RenderOptions,
}

impl DepoparseResult {
    /// Convert to the plain text page layout.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.transcript, &self.render_options)
    }

    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.transcript, &self.render_options)
    }

    /// Convert the whole transcript to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.transcript, format)
    }

    /// Convert only the Q/A items to JSON.
    pub fn testimony_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.transcript.testimony, format)
    }

    /// Summarize and classify each Q/A item with the rule-based summarizer.
    pub fn enrich(&self) -> Vec<EnrichedQaItem> {
        Enricher::rule_based().enrich(&self.transcript.testimony)
    }

    /// Get the transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}
