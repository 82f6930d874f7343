//! Bounded OCR pass over the pages flagged by the extraction policy.
//!
//! Rasterizing and recognizing a page is the only expensive, I/O-bound step
//! of the pipeline. Jobs go through a bounded channel to a fixed number of
//! scoped workers so at most `workers` page images exist at any time. The
//! engine is acquired once for the whole pass and released when the
//! [`OcrSession`] guard drops, whatever happened to individual pages.

use std::path::Path;
use std::thread;

use crossbeam_channel::{bounded, unbounded};

use crate::error::{Error, Result};

use super::source::{OcrEngine, OcrPage, Rasterizer};

/// Scoped handle on an acquired OCR engine.
pub struct OcrSession<'e> {
    engine: &'e dyn OcrEngine,
}

impl<'e> OcrSession<'e> {
    /// Acquire `engine`; it is released when the session drops.
    pub fn acquire(engine: &'e dyn OcrEngine) -> Result<Self> {
        engine.acquire()?;
        log::debug!("OCR engine {} acquired", engine.name());
        Ok(Self { engine })
    }

    /// Recognize one image.
    pub fn recognize(&self, image: &Path) -> Result<OcrPage> {
        self.engine.recognize(image)
    }
}

impl Drop for OcrSession<'_> {
    fn drop(&mut self) {
        self.engine.release();
        log::debug!("OCR engine {} released", self.engine.name());
    }
}

/// Result of the OCR pass for one page.
#[derive(Debug)]
pub struct OcrOutcome {
    /// 0-based page index
    pub index: usize,
    /// Recognition result or the reason it failed
    pub result: Result<OcrPage>,
}

/// Rasterize and recognize `indices` with at most `workers` pages in flight.
///
/// Returns one outcome per requested page, in page order. Errors are only
/// returned when the engine cannot be acquired at all; per-page failures are
/// reported in the outcomes.
pub fn run_ocr_pass(
    engine: &dyn OcrEngine,
    rasterizer: &dyn Rasterizer,
    indices: &[usize],
    dpi: u32,
    workers: usize,
) -> Result<Vec<OcrOutcome>> {
    if indices.is_empty() {
        return Ok(Vec::new());
    }

    let session = OcrSession::acquire(engine)?;
    let workers = workers.clamp(1, indices.len());
    log::info!(
        "OCR pass: {} pages with {} workers at {} dpi",
        indices.len(),
        workers,
        dpi
    );

    let (job_tx, job_rx) = bounded::<usize>(workers);
    let (result_tx, result_rx) = unbounded::<OcrOutcome>();

    let mut outcomes = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let session = &session;
                scope.spawn(move || {
                    for index in job_rx {
                        let result = process_page(session, rasterizer, index, dpi);
                        if result_tx.send(OcrOutcome { index, result }).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        // Only workers hold the job receiver, so sends fail instead of
        // blocking if every worker has died.
        drop(job_rx);
        drop(result_tx);

        for &index in indices {
            if job_tx.send(index).is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut outcomes: Vec<OcrOutcome> = result_rx.iter().collect();
        for handle in handles {
            if handle.join().is_err() {
                log::error!("OCR worker panicked");
            }
        }

        // Pages lost to a panicked worker are reported as failures.
        for &index in indices {
            if !outcomes.iter().any(|o| o.index == index) {
                outcomes.push(OcrOutcome {
                    index,
                    result: Err(Error::Ocr("OCR worker panicked".to_string())),
                });
            }
        }
        outcomes
    });

    drop(session);
    outcomes.sort_by_key(|o| o.index);
    Ok(outcomes)
}

fn process_page(
    session: &OcrSession<'_>,
    rasterizer: &dyn Rasterizer,
    index: usize,
    dpi: u32,
) -> Result<OcrPage> {
    let image = rasterizer.render_page(index, dpi)?;
    let result = session.recognize(&image.path);
    rasterizer.cleanup(&image);
    result
}
