//! Line reconstruction and transcript assembly.

mod assembler;
mod merger;

pub use assembler::{build_transcript, printed_page};
pub use merger::{monotonic_line_numbers, reconstruct_page, LineMerger};
