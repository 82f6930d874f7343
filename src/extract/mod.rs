//! Page text acquisition and the extraction pipeline.
//!
//! Every page's text comes either from the PDF's digital text layer or, when
//! the [`ExtractionPolicy`] finds that layer too thin, from OCR of a
//! rasterized image. Digital pages whose line numbers are images keep their
//! text and take only the margin numbers from OCR. Fragments are then
//! assigned to page regions by the [`SpatialClassifier`].

mod classifier;
mod external;
mod hybrid;
mod lopdf_source;
mod ocr_pool;
mod options;
mod page_offset;
mod pipeline;
mod policy;
mod source;

pub use classifier::{is_line_number, sort_by_position, Placement, SpatialClassifier};
pub use external::{command_available, parse_tsv, CommandRasterizer, RasterTool, TesseractCli};
pub use hybrid::{
    adaptive_scan, combine, scale_to_page, scan_margin, HybridPage, MarginScan,
    IDEAL_LINE_COUNT, MARGIN_CANDIDATES, MIN_DIGITAL_LINE_NUMBERS,
};
pub use lopdf_source::LopdfTextSource;
pub use ocr_pool::{run_ocr_pass, OcrOutcome, OcrSession};
pub use options::{ErrorMode, ExtractOptions, LayoutConfig, MarginConfig};
pub use page_offset::{detect_printed_page, first_numbered_page, parse_page_label, printed_page_offset};
pub use pipeline::{process_page, TranscriptExtractor};
pub use policy::{ExtractionPolicy, PageAssessment};
pub use source::{
    BoundingBox, DigitalPage, DigitalTextSource, OcrEngine, OcrPage, OcrWord, RasterImage,
    Rasterizer,
};
