//! Rendering module for converting transcripts to output formats.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, JsonFormat};
pub use markdown::{enriched_to_markdown, testimony_to_markdown, to_markdown, MarkdownRenderer};
pub use options::{PageSelection, RenderOptions};
pub use text::to_text;
