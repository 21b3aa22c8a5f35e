//! Ticket processing — export extraction through structured summaries.
//!
//! Pipeline: extract → timeline → reconstruct → summarize (LLM) → parse.

pub mod cleaner;
pub mod extractor;
pub mod llm_client;
pub mod markup;
pub mod pipeline;
pub mod prompt;
pub mod reconstructor;
pub mod summary_parser;
pub mod timeline;
