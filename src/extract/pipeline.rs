//! Whole-document extraction.
//!
//! Digital text pass (sequential over the document handle), per-page policy,
//! one bounded OCR pass for the flagged pages and for digital pages missing
//! their line numbers, then classification and line reconstruction per page,
//! printed-page offset, assembly and the examination parse. Page-level failures degrade the page, they never stop
//! the document unless `ErrorMode::Strict` is set for the digital pass.

use rayon::prelude::*;

use crate::error::Result;
use crate::examination::ExaminationParser;
use crate::model::{
    ExtractionMethod, PageExtraction, ReconstructedLine, TextFragment, Transcript,
    TranscriptMetadata, TranscriptPage,
};
use crate::reconstruct::{build_transcript, LineMerger};

use super::classifier::SpatialClassifier;
use super::hybrid::{self, MIN_DIGITAL_LINE_NUMBERS};
use super::ocr_pool::run_ocr_pass;
use super::options::{ErrorMode, ExtractOptions};
use super::page_offset::{detect_printed_page, printed_page_offset};
use super::policy::ExtractionPolicy;
use super::source::{DigitalPage, DigitalTextSource, OcrEngine, Rasterizer};

/// Text chosen for one page, before classification.
#[derive(Debug, Clone)]
struct SourcedPage {
    index: usize,
    width: f32,
    height: f32,
    fragments: Vec<TextFragment>,
    method: ExtractionMethod,
    confidence: f32,
    /// OCR header/footer words, consulted for the printed page number
    labels: Vec<TextFragment>,
}

/// Drives a document through the full pipeline.
pub struct TranscriptExtractor<'a> {
    source: &'a dyn DigitalTextSource,
    ocr: Option<(&'a dyn OcrEngine, &'a dyn Rasterizer)>,
    options: ExtractOptions,
}

impl<'a> TranscriptExtractor<'a> {
    /// Create an extractor over a digital text source.
    pub fn new(source: &'a dyn DigitalTextSource, options: ExtractOptions) -> Self {
        Self {
            source,
            ocr: None,
            options,
        }
    }

    /// Attach an OCR engine and a rasterizer for pages the policy flags.
    pub fn with_ocr(mut self, engine: &'a dyn OcrEngine, rasterizer: &'a dyn Rasterizer) -> Self {
        self.ocr = Some((engine, rasterizer));
        self
    }

    /// Options in use.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Run the pipeline.
    pub fn extract(&self) -> Result<Transcript> {
        let total = self.source.page_count();
        let selected: Vec<usize> = (0..total)
            .filter(|i| self.options.pages.includes(*i as u32 + 1))
            .collect();
        log::info!("extracting {} of {} pages", selected.len(), total);

        let policy = ExtractionPolicy::new(self.options.min_items);
        let classifier = SpatialClassifier::new(self.options.layout.margins);
        let mut pages = Vec::with_capacity(selected.len());
        let mut flagged = Vec::new();
        let mut margin_ocr = Vec::new();

        for &index in &selected {
            let digital = match self.source.extract_page(index) {
                Ok(page) => page,
                Err(e) => {
                    if self.options.error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Failed to extract text from page {}: {}", index + 1, e);
                    DigitalPage::default()
                }
            };

            let assessment = policy.assess(&digital.fragments);
            log::debug!(
                "page {}: {} fragments, {} meaningful",
                index + 1,
                assessment.total,
                assessment.meaningful
            );
            if assessment.needs_ocr {
                flagged.push(index);
            } else if self.options.hybrid
                && classifier.count_line_numbers(digital.width, digital.height, &digital.fragments)
                    < MIN_DIGITAL_LINE_NUMBERS
            {
                log::debug!("page {}: no digital line numbers, queued for margin OCR", index + 1);
                margin_ocr.push(index);
            }
            pages.push(SourcedPage {
                index,
                width: digital.width,
                height: digital.height,
                fragments: digital.fragments,
                method: ExtractionMethod::Digital,
                confidence: 100.0,
                labels: Vec::new(),
            });
        }

        self.apply_ocr(&mut pages, &flagged, &margin_ocr);

        let offset = match self.options.printed_page_offset {
            Some(offset) => offset,
            None => self.detect_offset(&pages, total),
        };

        let merger = LineMerger::new(self.options.layout);
        let process = |page: &SourcedPage| {
            let extraction = classifier
                .classify_page(page.index as u32 + 1, page.width, page.height, &page.fragments)
                .with_method(page.method, page.confidence);
            let lines = merger.reconstruct(&extraction);
            TranscriptPage { extraction, lines }
        };
        let transcript_pages: Vec<TranscriptPage> = if self.options.parallel {
            pages.par_iter().map(process).collect()
        } else {
            pages.iter().map(process).collect()
        };

        let lines = build_transcript(&transcript_pages, offset);
        let outcome = ExaminationParser::new(self.options.parser.clone()).parse(&lines);

        let metadata = metadata(&self.options, &transcript_pages, total, offset);
        log::info!(
            "{} pages: {} digital, {} OCR, {} hybrid, {} fallback; {} exchanges, {} unanswered questions",
            transcript_pages.len(),
            metadata.digital_pages,
            metadata.ocr_pages,
            metadata.hybrid_pages,
            metadata.fallback_pages,
            outcome.items.len(),
            outcome.unanswered
        );

        Ok(Transcript {
            metadata,
            pages: transcript_pages,
            lines,
            testimony: outcome.items,
            unanswered_questions: outcome.unanswered,
            dangling: outcome.dangling,
        })
    }

    /// Replace flagged pages' text with OCR output where recognition works,
    /// and take line numbers from OCR for `margin_ocr` pages.
    fn apply_ocr(&self, pages: &mut [SourcedPage], flagged: &[usize], margin_ocr: &[usize]) {
        if flagged.is_empty() && margin_ocr.is_empty() {
            return;
        }
        let fallback = |pages: &mut [SourcedPage], index: usize| {
            if let Some(page) = pages.iter_mut().find(|p| p.index == index) {
                page.method = ExtractionMethod::DigitalFallback;
            }
        };

        let (engine, rasterizer) = match self.ocr {
            Some(ocr) if self.options.ocr_enabled => ocr,
            _ => {
                if !flagged.is_empty() {
                    log::warn!(
                        "{} pages need OCR but OCR is not available; keeping their digital text",
                        flagged.len()
                    );
                }
                if !margin_ocr.is_empty() {
                    log::warn!(
                        "{} pages have no digital line numbers and OCR is not available",
                        margin_ocr.len()
                    );
                }
                flagged.iter().for_each(|&i| fallback(pages, i));
                return;
            }
        };

        let mut indices: Vec<usize> = flagged.iter().chain(margin_ocr).copied().collect();
        indices.sort_unstable();
        let outcomes = match run_ocr_pass(
            engine,
            rasterizer,
            &indices,
            self.options.ocr_dpi,
            self.options.ocr_concurrency,
        ) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                log::warn!("OCR unavailable: {}; keeping digital text", e);
                flagged.iter().for_each(|&i| fallback(pages, i));
                return;
            }
        };

        let margins = self.options.layout.margins;
        for outcome in outcomes {
            let Some(page) = pages.iter_mut().find(|p| p.index == outcome.index) else {
                continue;
            };

            if !flagged.contains(&outcome.index) {
                match outcome.result {
                    Ok(ocr) => {
                        let digital = DigitalPage {
                            width: page.width,
                            height: page.height,
                            fragments: std::mem::take(&mut page.fragments),
                        };
                        let combined = hybrid::combine(&digital, &ocr, &margins);
                        log::debug!(
                            "page {}: {} line numbers from a {:.2} margin",
                            outcome.index + 1,
                            combined.line_numbers,
                            combined.margin
                        );
                        if combined.line_numbers > 0 {
                            page.fragments = combined.fragments;
                            page.method = ExtractionMethod::Hybrid;
                        } else {
                            page.fragments = digital.fragments;
                        }
                        page.labels = combined.labels;
                    }
                    Err(e) => {
                        log::warn!("Margin OCR failed on page {}: {}", outcome.index + 1, e);
                    }
                }
                continue;
            }

            match outcome.result {
                Ok(ocr) if ocr.has_text() => {
                    page.width = ocr.width;
                    page.height = ocr.height;
                    page.fragments = ocr.to_fragments();
                    page.method = ExtractionMethod::Ocr;
                    page.confidence = ocr.confidence;
                }
                Ok(_) => {
                    log::warn!("OCR found no text on page {}; keeping digital text", outcome.index + 1);
                    page.method = ExtractionMethod::DigitalFallback;
                }
                Err(e) => {
                    log::warn!("OCR failed on page {}: {}; keeping digital text", outcome.index + 1, e);
                    page.method = ExtractionMethod::DigitalFallback;
                }
            }
        }
    }

    fn detect_offset(&self, pages: &[SourcedPage], total: usize) -> i32 {
        let mut detections = vec![None; total];
        for page in pages {
            detections[page.index] = detect_printed_page(&page.fragments, page.height)
                .or_else(|| detect_printed_page(&page.labels, page.height));
        }
        printed_page_offset(&detections)
    }
}

fn metadata(
    options: &ExtractOptions,
    pages: &[TranscriptPage],
    total: usize,
    offset: i32,
) -> TranscriptMetadata {
    let count = |method: ExtractionMethod| {
        pages
            .iter()
            .filter(|p| p.extraction.extraction_method == method)
            .count() as u32
    };
    TranscriptMetadata {
        source: options.source_label.clone(),
        page_count: total as u32,
        digital_pages: count(ExtractionMethod::Digital),
        ocr_pages: count(ExtractionMethod::Ocr),
        fallback_pages: count(ExtractionMethod::DigitalFallback),
        hybrid_pages: count(ExtractionMethod::Hybrid),
        printed_page_offset: offset,
        ..TranscriptMetadata::default()
    }
}

/// Classify one page's fragments and reconstruct its lines.
pub fn process_page(
    page_number: u32,
    page: &DigitalPage,
    options: &ExtractOptions,
) -> (PageExtraction, Vec<ReconstructedLine>) {
    let extraction = SpatialClassifier::new(options.layout.margins).classify_page(
        page_number,
        page.width,
        page.height,
        &page.fragments,
    );
    let lines = LineMerger::new(options.layout).reconstruct(&extraction);
    (extraction, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::extract::source::{BoundingBox, OcrPage, OcrWord, RasterImage};
    use crate::render::PageSelection;
    use std::path::{Path, PathBuf};

    /// One numbered transcript page in 612x792 points.
    fn transcript_page(printed: Option<&str>, lines: &[&str]) -> DigitalPage {
        let mut fragments = Vec::new();
        for (i, text) in lines.iter().enumerate() {
            let y = 100.0 + i as f32 * 24.0;
            fragments.push(TextFragment::digital((i + 1).to_string(), 40.0, y, 10.0, 10.0));
            fragments.push(TextFragment::digital(*text, 100.0, y, 300.0, 10.0));
        }
        if let Some(label) = printed {
            fragments.push(TextFragment::digital(label, 300.0, 750.0, 12.0, 10.0));
        }
        DigitalPage {
            width: 612.0,
            height: 792.0,
            fragments,
        }
    }

    struct MemorySource {
        pages: Vec<Result<DigitalPage>>,
    }

    impl DigitalTextSource for MemorySource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn extract_page(&self, index: usize) -> Result<DigitalPage> {
            match &self.pages[index] {
                Ok(page) => Ok(page.clone()),
                Err(e) => Err(Error::TextExtract(e.to_string())),
            }
        }
    }

    struct ScriptedOcr;

    impl OcrEngine for ScriptedOcr {
        fn name(&self) -> &str {
            "scripted"
        }

        fn acquire(&self) -> Result<()> {
            Ok(())
        }

        fn recognize(&self, _image: &Path) -> Result<OcrPage> {
            let word = |text: &str, x: f32, y: f32| OcrWord {
                text: text.to_string(),
                confidence: 88.0,
                bbox: BoundingBox {
                    x,
                    y,
                    width: 40.0,
                    height: 20.0,
                },
            };
            Ok(OcrPage {
                width: 1000.0,
                height: 1000.0,
                confidence: 88.0,
                words: vec![
                    word("1", 50.0, 200.0),
                    word("Q.", 200.0, 200.0),
                    word("Scanned?", 260.0, 200.0),
                    word("2", 50.0, 250.0),
                    word("A.", 200.0, 250.0),
                    word("Yes.", 260.0, 250.0),
                ],
            })
        }

        fn release(&self) {}
    }

    struct NullRasterizer;

    impl Rasterizer for NullRasterizer {
        fn render_page(&self, index: usize, _dpi: u32) -> Result<RasterImage> {
            Ok(RasterImage {
                index,
                path: PathBuf::from(format!("page-{}.png", index + 1)),
            })
        }

        fn cleanup(&self, _image: &RasterImage) {}
    }

    /// Recognizes only margin numbers and a footer label on a 2x scan of a
    /// 612x792 page.
    struct MarginOcr {
        numbers: usize,
        footer: &'static str,
    }

    impl OcrEngine for MarginOcr {
        fn name(&self) -> &str {
            "margin"
        }

        fn acquire(&self) -> Result<()> {
            Ok(())
        }

        fn recognize(&self, _image: &Path) -> Result<OcrPage> {
            let word = |text: &str, x: f32, y: f32| OcrWord {
                text: text.to_string(),
                confidence: 92.0,
                bbox: BoundingBox {
                    x,
                    y,
                    width: 20.0,
                    height: 20.0,
                },
            };
            let mut words: Vec<OcrWord> = (0..self.numbers)
                .map(|i| word(&(i + 1).to_string(), 60.0, 200.0 + i as f32 * 48.0))
                .collect();
            words.push(word("Q.", 200.0, 200.0));
            words.push(word(self.footer, 600.0, 1500.0));
            Ok(OcrPage {
                width: 1224.0,
                height: 1584.0,
                confidence: 92.0,
                words,
            })
        }

        fn release(&self) {}
    }

    /// A digital page whose line numbers are not in the text layer.
    fn unnumbered_page(lines: &[&str]) -> DigitalPage {
        let fragments = lines
            .iter()
            .enumerate()
            .map(|(i, text)| TextFragment::digital(*text, 100.0, 100.0 + i as f32 * 24.0, 300.0, 10.0))
            .collect();
        DigitalPage {
            width: 612.0,
            height: 792.0,
            fragments,
        }
    }

    fn body() -> Vec<&'static str> {
        vec![
            "Q. Did you sign the form?",
            "MR. SMITH: Objection, form.",
            "A. Yes.",
            "Q. When?",
            "A. In May.",
            "Q. Where?",
            "A. At the office.",
            "Q. Anyone else there?",
            "A. No.",
            "Q. Thank you.",
        ]
    }

    #[test]
    fn test_digital_document() {
        let source = MemorySource {
            pages: vec![
                Ok(transcript_page(None, &["CAPTION", "", "", "", "", "", "", "", "", "x"])),
                Ok(transcript_page(Some("1"), &body())),
            ],
        };
        let transcript = TranscriptExtractor::new(&source, ExtractOptions::default())
            .extract()
            .unwrap();

        assert_eq!(transcript.metadata.page_count, 2);
        assert_eq!(transcript.metadata.printed_page_offset, 1);
        assert_eq!(transcript.pages[1].extraction.extraction_method, ExtractionMethod::Digital);
        assert_eq!(transcript.testimony.len(), 4);
        assert_eq!(transcript.testimony[0].question_location, "1:1");
        assert_eq!(
            transcript.testimony[0].colloquy.as_deref(),
            Some("MR. SMITH: Objection, form.")
        );
        assert_eq!(transcript.unanswered_questions, 1);
    }

    #[test]
    fn test_fixed_offset_overrides_detection() {
        let source = MemorySource {
            pages: vec![Ok(transcript_page(Some("7"), &body()))],
        };
        let options = ExtractOptions::default().with_page_offset(-4);
        let transcript = TranscriptExtractor::new(&source, options).extract().unwrap();
        assert_eq!(transcript.metadata.printed_page_offset, -4);
        assert_eq!(transcript.lines[0].printed_page, 5);
    }

    #[test]
    fn test_sparse_page_goes_to_ocr() {
        let source = MemorySource {
            pages: vec![Ok(DigitalPage {
                width: 612.0,
                height: 792.0,
                fragments: vec![],
            })],
        };
        let (engine, rasterizer) = (ScriptedOcr, NullRasterizer);
        let transcript = TranscriptExtractor::new(&source, ExtractOptions::default())
            .with_ocr(&engine, &rasterizer)
            .extract()
            .unwrap();

        let page = &transcript.pages[0];
        assert_eq!(page.extraction.extraction_method, ExtractionMethod::Ocr);
        assert_eq!(page.extraction.width, 1000.0);
        assert_eq!(page.extraction.confidence, 88.0);
        assert_eq!(transcript.metadata.ocr_pages, 1);
        assert_eq!(transcript.testimony.len(), 1);
        assert_eq!(transcript.testimony[0].question, "Scanned?");
    }

    #[test]
    fn test_margin_ocr_supplies_line_numbers() {
        let source = MemorySource {
            pages: vec![
                Ok(transcript_page(None, &["CAPTION", "", "", "", "", "", "", "", "", "x"])),
                Ok(unnumbered_page(&body())),
            ],
        };
        let engine = MarginOcr {
            numbers: 10,
            footer: "1",
        };
        let rasterizer = NullRasterizer;
        let transcript = TranscriptExtractor::new(&source, ExtractOptions::default())
            .with_ocr(&engine, &rasterizer)
            .extract()
            .unwrap();

        assert_eq!(transcript.pages[0].extraction.extraction_method, ExtractionMethod::Digital);
        let page = &transcript.pages[1];
        assert_eq!(page.extraction.extraction_method, ExtractionMethod::Hybrid);
        assert_eq!(page.extraction.confidence, 100.0);
        assert_eq!(page.extraction.line_numbers.len(), 10);
        assert_eq!(page.lines[0].text, "Q. Did you sign the form?");
        assert_eq!(transcript.metadata.hybrid_pages, 1);

        // The printed page number comes from the OCR footer.
        assert_eq!(transcript.metadata.printed_page_offset, 1);
        assert_eq!(transcript.testimony[0].question_location, "1:1");
        assert_eq!(transcript.testimony[0].answer_location, "1:3");
    }

    #[test]
    fn test_margin_ocr_disabled() {
        let source = MemorySource {
            pages: vec![Ok(unnumbered_page(&body()))],
        };
        let engine = MarginOcr {
            numbers: 10,
            footer: "1",
        };
        let rasterizer = NullRasterizer;
        let transcript =
            TranscriptExtractor::new(&source, ExtractOptions::default().with_hybrid(false))
                .with_ocr(&engine, &rasterizer)
                .extract()
                .unwrap();

        let page = &transcript.pages[0];
        assert_eq!(page.extraction.extraction_method, ExtractionMethod::Digital);
        assert!(page.extraction.line_numbers.is_empty());
        assert_eq!(transcript.metadata.hybrid_pages, 0);
    }

    #[test]
    fn test_margin_ocr_without_numbers_keeps_digital_page() {
        let source = MemorySource {
            pages: vec![Ok(unnumbered_page(&body()))],
        };
        let engine = MarginOcr {
            numbers: 0,
            footer: "Page 4",
        };
        let rasterizer = NullRasterizer;
        let transcript = TranscriptExtractor::new(&source, ExtractOptions::default())
            .with_ocr(&engine, &rasterizer)
            .extract()
            .unwrap();

        let page = &transcript.pages[0];
        assert_eq!(page.extraction.extraction_method, ExtractionMethod::Digital);
        assert_eq!(page.extraction.main_content.len(), 10);
        assert!(page.extraction.line_numbers.is_empty());
        // Printed page 4 on physical page 1 cannot be extrapolated back.
        assert_eq!(transcript.metadata.printed_page_offset, 0);
    }

    #[test]
    fn test_sparse_page_without_ocr_falls_back() {
        let source = MemorySource {
            pages: vec![Ok(transcript_page(None, &["Q. Short?", "A. Yes."]))],
        };
        let transcript = TranscriptExtractor::new(&source, ExtractOptions::default())
            .extract()
            .unwrap();
        let page = &transcript.pages[0];
        assert_eq!(page.extraction.extraction_method, ExtractionMethod::DigitalFallback);
        assert_eq!(transcript.metadata.fallback_pages, 1);
        // The partial digital text is still used.
        assert_eq!(transcript.testimony.len(), 1);
    }

    #[test]
    fn test_lenient_skips_unreadable_page() {
        let source = MemorySource {
            pages: vec![
                Err(Error::TextExtract("bad stream".to_string())),
                Ok(transcript_page(None, &body())),
            ],
        };
        let transcript = TranscriptExtractor::new(&source, ExtractOptions::default().with_page_offset(0))
            .extract()
            .unwrap();
        assert_eq!(transcript.pages.len(), 2);
        assert!(transcript.pages[0].lines.is_empty());
        assert_eq!(transcript.testimony.len(), 4);
    }

    #[test]
    fn test_strict_aborts_on_unreadable_page() {
        let source = MemorySource {
            pages: vec![Err(Error::TextExtract("bad stream".to_string()))],
        };
        let result = TranscriptExtractor::new(&source, ExtractOptions::default().strict()).extract();
        assert!(matches!(result, Err(Error::TextExtract(_))));
    }

    #[test]
    fn test_page_selection() {
        let source = MemorySource {
            pages: vec![
                Ok(transcript_page(None, &body())),
                Ok(transcript_page(None, &body())),
                Ok(transcript_page(None, &body())),
            ],
        };
        let options = ExtractOptions::default()
            .with_pages(PageSelection::Pages(vec![2]))
            .with_page_offset(0);
        let transcript = TranscriptExtractor::new(&source, options).extract().unwrap();
        assert_eq!(transcript.pages.len(), 1);
        assert_eq!(transcript.pages[0].extraction.page_number, 2);
        assert_eq!(transcript.lines[0].printed_page, 2);
        assert_eq!(transcript.metadata.page_count, 3);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let source = MemorySource {
            pages: (0..6).map(|_| Ok(transcript_page(None, &body()))).collect(),
        };
        let parallel = TranscriptExtractor::new(&source, ExtractOptions::default())
            .extract()
            .unwrap();
        let sequential = TranscriptExtractor::new(&source, ExtractOptions::default().sequential())
            .extract()
            .unwrap();
        assert_eq!(parallel.lines, sequential.lines);
        assert_eq!(parallel.testimony, sequential.testimony);
    }

    #[test]
    fn test_process_page() {
        let (extraction, lines) = process_page(3, &transcript_page(None, &body()), &ExtractOptions::default());
        assert_eq!(extraction.page_number, 3);
        assert_eq!(extraction.line_numbers.len(), 10);
        assert_eq!(lines[0].text, "Q. Did you sign the form?");
    }
}
