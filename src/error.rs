use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors surfaced by the generation workflows and their backends
#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error("Please provide a description or upload at least one file")]
    MissingInput,

    #[error("Failed to parse AI response: {reason}. Please try again.")]
    MalformedResponse {
        reason: String,
        raw: String,
        sanitized: String,
    },

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file {name}: {reason}")]
    UnsupportedFile { name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("The model returned an empty response")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GenerationError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::MalformedResponse { .. }
                | GenerationError::Http(_)
                | GenerationError::Backend(_)
                | GenerationError::EmptyResponse
        )
    }
}
