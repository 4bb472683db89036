use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocgraphError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Graph apply error: {0}")]
    Apply(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Query failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl DocgraphError {
    /// Failures the graph database reported for a submitted script.
    pub fn is_apply(&self) -> bool {
        matches!(self, DocgraphError::Apply(_))
    }
}

pub type Result<T> = std::result::Result<T, DocgraphError>;
