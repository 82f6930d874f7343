//! Error types for depoparse library.

use std::io;
use thiserror::Error;

/// Result type alias for depoparse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting a transcript.
///
/// Only the outer layers (opening a file, talking to collaborators) return
/// these. Page-level failures inside the pipeline are downgraded to
/// warnings and a degraded page, never propagated.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting the digital text layer of a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// The page could not be rendered to an image.
    #[error("Rasterization error: {0}")]
    Rasterize(String),

    /// The OCR engine failed or is unavailable.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// The summarization service failed or is unavailable.
    #[error("Summarization error: {0}")]
    Summarize(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
