//! Adapters for external command-line tools: poppler's `pdftoppm` (or
//! Ghostscript) to rasterize pages, and `tesseract` to recognize them.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;

use crate::error::{Error, Result};

use super::source::{BoundingBox, OcrEngine, OcrPage, OcrWord, RasterImage, Rasterizer};

/// Whether `program` can be run from PATH.
pub fn command_available(program: &str) -> bool {
    let probe = match program {
        "pdftoppm" => "-v",
        _ => "--version",
    };
    Command::new(program)
        .arg(probe)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Page rasterizing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterTool {
    /// poppler `pdftoppm`
    Pdftoppm,
    /// Ghostscript `gs`
    Ghostscript,
}

impl RasterTool {
    /// First available tool, preferring pdftoppm.
    pub fn detect() -> Option<Self> {
        if command_available("pdftoppm") {
            Some(RasterTool::Pdftoppm)
        } else if command_available("gs") {
            Some(RasterTool::Ghostscript)
        } else {
            None
        }
    }
}

/// Renders pages of a PDF file to PNG images in a private temporary directory.
pub struct CommandRasterizer {
    pdf: PathBuf,
    tool: RasterTool,
    scratch: TempDir,
}

impl CommandRasterizer {
    /// Create a rasterizer for `pdf` using the first available tool.
    pub fn new<P: AsRef<Path>>(pdf: P) -> Result<Self> {
        let tool = RasterTool::detect().ok_or_else(|| {
            Error::Rasterize("no rasterizer available (install poppler or ghostscript)".to_string())
        })?;
        Self::with_tool(pdf, tool)
    }

    /// Create a rasterizer using a specific tool.
    pub fn with_tool<P: AsRef<Path>>(pdf: P, tool: RasterTool) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("depoparse-").tempdir()?;
        Ok(Self {
            pdf: pdf.as_ref().to_path_buf(),
            tool,
            scratch,
        })
    }

    /// Tool in use.
    pub fn tool(&self) -> RasterTool {
        self.tool
    }

    fn command(&self, page: usize, dpi: u32, output: &Path) -> Command {
        match self.tool {
            RasterTool::Pdftoppm => {
                // -singlefile writes exactly "<prefix>.png"
                let prefix = output.with_extension("");
                let mut cmd = Command::new("pdftoppm");
                cmd.arg("-png")
                    .arg("-r")
                    .arg(dpi.to_string())
                    .arg("-f")
                    .arg(page.to_string())
                    .arg("-l")
                    .arg(page.to_string())
                    .arg("-singlefile")
                    .arg(&self.pdf)
                    .arg(prefix);
                cmd
            }
            RasterTool::Ghostscript => {
                let mut cmd = Command::new("gs");
                cmd.arg("-q")
                    .arg("-dNOPAUSE")
                    .arg("-dBATCH")
                    .arg("-sDEVICE=png16m")
                    .arg(format!("-r{}", dpi))
                    .arg(format!("-dFirstPage={}", page))
                    .arg(format!("-dLastPage={}", page))
                    .arg(format!("-sOutputFile={}", output.display()))
                    .arg(&self.pdf);
                cmd
            }
        }
    }
}

impl Rasterizer for CommandRasterizer {
    fn render_page(&self, index: usize, dpi: u32) -> Result<RasterImage> {
        let page = index + 1;
        let output = self.scratch.path().join(format!("page-{}.png", page));
        let result = self
            .command(page, dpi, &output)
            .stdout(Stdio::null())
            .output()
            .map_err(|e| Error::Rasterize(format!("failed to run {:?}: {}", self.tool, e)))?;

        if !result.status.success() {
            return Err(Error::Rasterize(format!(
                "{:?} exited with {} on page {}: {}",
                self.tool,
                result.status,
                page,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        if !output.exists() {
            return Err(Error::Rasterize(format!(
                "{:?} produced no image for page {}",
                self.tool, page
            )));
        }

        Ok(RasterImage {
            index,
            path: output,
        })
    }

    fn cleanup(&self, image: &RasterImage) {
        if let Err(e) = std::fs::remove_file(&image.path) {
            log::debug!("could not remove {}: {}", image.path.display(), e);
        }
    }
}

/// OCR through the `tesseract` command, reading its TSV word boxes.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    language: String,
    psm: u8,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: 3,
        }
    }
}

impl TesseractCli {
    /// Create an engine with English and automatic page segmentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn acquire(&self) -> Result<()> {
        if command_available("tesseract") {
            Ok(())
        } else {
            Err(Error::Ocr("tesseract is not installed or not on PATH".to_string()))
        }
    }

    fn recognize(&self, image: &Path) -> Result<OcrPage> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg("1")
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .map_err(|e| Error::Ocr(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout))
    }

    fn release(&self) {}
}

/// Parse tesseract TSV output.
///
/// Level 1 rows carry the image size, level 5 rows are words. Page
/// confidence is the mean of the word confidences; tesseract reports -1 for
/// rows without a confidence, which are ignored.
pub fn parse_tsv(tsv: &str) -> Result<OcrPage> {
    let mut lines = tsv.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::Ocr("empty tesseract output".to_string()))?;
    if !header.starts_with("level") {
        return Err(Error::Ocr(format!("unexpected TSV header: {}", header)));
    }

    let mut page = OcrPage::default();
    let mut confidence_sum = 0.0;
    let mut confidence_count = 0usize;

    for line in lines {
        let cols: Vec<&str> = line.splitn(12, '\t').collect();
        if cols.len() < 11 {
            continue;
        }
        let num = |i: usize| cols[i].trim().parse::<f32>().unwrap_or(0.0);
        match cols[0] {
            "1" => {
                page.width = num(8);
                page.height = num(9);
            }
            "5" => {
                let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
                let confidence = num(10);
                if text.is_empty() || confidence < 0.0 {
                    continue;
                }
                confidence_sum += confidence;
                confidence_count += 1;
                page.words.push(OcrWord {
                    text: text.to_string(),
                    confidence,
                    bbox: BoundingBox {
                        x: num(6),
                        y: num(7),
                        width: num(8),
                        height: num(9),
                    },
                });
            }
            _ => {}
        }
    }

    if confidence_count > 0 {
        page.confidence = confidence_sum / confidence_count as f32;
    }
    Ok(page)
}
