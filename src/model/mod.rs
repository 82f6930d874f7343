//! Transcript model types.
//!
//! This module defines the records that flow through the pipeline, from
//! positioned fragments produced by a text source up to the Q/A items
//! emitted by the examination parser. Everything here is plain data and
//! serializes to the camelCase JSON shape downstream consumers expect.

mod fragment;
mod line;
mod page;
mod testimony;
mod transcript;

pub use fragment::{SourceMethod, TextFragment};
pub use line::{GlobalLine, ReconstructedLine};
pub use page::{BlockType, ClassifiedBlock, ExtractionMethod, PageExtraction};
pub use testimony::{DanglingQuestion, LinePosition, QaItem, Span};
pub use transcript::{Transcript, TranscriptMetadata, TranscriptPage};
