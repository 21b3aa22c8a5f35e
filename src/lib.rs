//! Case Digest — support ticket exports to conversation threads and structured summaries.
//!
//! Single-crate library: export extraction, timeline recovery, thread
//! reconstruction, rate-limited summarization, and tolerant summary parsing.

// Foundation
pub mod constants;
pub mod error;
pub mod time_utils;

// Core types
pub mod config;
pub mod summary;
pub mod thread;
pub mod ticket;

// Sub-systems
pub mod processing;
pub mod tracing_init;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-exports for convenience
pub use error::{DigestError, DigestResult};
pub use processing::pipeline::{BatchReport, CaseDigester};
