//! Input validation: make sure a transcript file is actually a PDF before
//! handing it to the content-stream parser.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header information sniffed from the first bytes of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// Declared PDF version (e.g., "1.4")
    pub version: String,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Read the first bytes of `path` and validate the PDF header.
pub fn sniff_file<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let mut header = Vec::with_capacity(16);
    File::open(path)?.take(16).read_to_end(&mut header)?;
    sniff_bytes(&header)
}

/// Validate a PDF header held in memory.
///
/// Scanned transcripts produced by some copier firmware prefix the header
/// with a few bytes of garbage, so the magic is searched for within the
/// first 16 bytes rather than required at offset 0.
pub fn sniff_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(16)];
    let start = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = start + PDF_MAGIC.len();
    let version = data
        .get(version_start..version_start + 3)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version).to_string();

    match version.as_bytes() {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(PdfHeader { version })
        }
        _ => Err(Error::UnsupportedVersion(version)),
    }
}

/// Check whether `path` looks like a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    sniff_file(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sniff_valid_header() {
        let header = sniff_bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.to_string(), "PDF 1.7");
    }

    #[test]
    fn test_sniff_leading_garbage() {
        let header = sniff_bytes(b"\x00\x00%PDF-1.4\n").unwrap();
        assert_eq!(header.version, "1.4");
    }

    #[test]
    fn test_sniff_rejects_other_formats() {
        assert!(matches!(
            sniff_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(sniff_bytes(b""), Err(Error::UnknownFormat)));
        assert!(matches!(sniff_bytes(b"%PDF-"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_bad_version() {
        assert!(matches!(
            sniff_bytes(b"%PDF-x.y\n"),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_is_pdf_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.5\n%comment\n").unwrap();
        assert!(is_pdf(file.path()));

        let mut other = tempfile::NamedTempFile::new().unwrap();
        other.write_all(b"plain text").unwrap();
        assert!(!is_pdf(other.path()));
    }
}
