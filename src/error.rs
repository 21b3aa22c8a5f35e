use thiserror::Error;

use crate::processing::llm_client::CallFailure;

#[derive(Error, Debug)]
pub enum DigestError {
    /// Export table/row structure is not what the extractor expects.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("No timeline entries in ticket {0}")]
    NoTimelineEntries(String),

    #[error("No messages reconstructed for ticket {0}")]
    NoMessages(String),

    /// Transient failures kept recurring until the attempt budget ran out.
    #[error("External service error after {attempts} attempts: {last}")]
    ExternalService { attempts: u32, last: CallFailure },

    #[error("External service fatal error: {0}")]
    ExternalServiceFatal(CallFailure),

    /// Never propagated out of the summary parser; logged and replaced by empty metadata.
    #[error("Metadata parse error: {0}")]
    MetadataParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DigestError {
    /// Recoverable per-ticket conditions: the batch skips the ticket instead of failing it.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::NoTimelineEntries(_) | Self::NoMessages(_))
    }
}

pub type DigestResult<T> = Result<T, DigestError>;
