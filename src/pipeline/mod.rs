//! Article processing pipeline
//!
//! Five stages, strictly forward: fetch → parse → chunk → summarize → render.
//! Each stage is a pure function over its inputs (plus bounded network calls
//! for fetch / summarize / TTS) with no knowledge of storage or of the other
//! stages; the orchestrator alone knows stage order and persists status.

pub mod chunk;
pub mod fetch;
pub mod orchestrator;
pub mod parse;
pub mod render;
pub mod summarize;

pub use chunk::chunk_text;
pub use fetch::{HttpFetcher, PageFetcher};
pub use orchestrator::{Orchestrator, PipelineConfig, RunOutcome};
pub use parse::{parse_html, ParsedArticle};
pub use render::{render, RenderFormat, RenderedArtifact};
pub use summarize::{Summarizer, SummaryOutcome};
