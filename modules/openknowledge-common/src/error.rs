use thiserror::Error;

use crate::types::SourceId;

/// Result type alias for aggregation operations.
pub type Result<T> = std::result::Result<T, OpenKnowledgeError>;

#[derive(Error, Debug)]
pub enum OpenKnowledgeError {
    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream API error (status {status}): {message}")]
    UpstreamApi { status: u16, message: String },

    #[error("Source {source_id} failed: {message}")]
    SourceFailure { source_id: SourceId, message: String },

    #[error("Probe inconclusive for {0}")]
    ProbeInconclusive(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl OpenKnowledgeError {
    /// Wrap an adapter's error chain as the failure of one source.
    pub fn source_failure(source: SourceId, err: &anyhow::Error) -> Self {
        OpenKnowledgeError::SourceFailure {
            source_id: source,
            message: format!("{err:#}"),
        }
    }
}
