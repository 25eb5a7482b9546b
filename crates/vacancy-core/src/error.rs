use thiserror::Error;

/// Application-wide error types for Vacancy.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (fetching a page).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out; carries the limit in milliseconds.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// The run was cancelled while the request was in flight.
    #[error("Fetch cancelled")]
    Cancelled,

    /// A page's markup did not have the expected shape.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The assembled aggregate could not be encoded.
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] serde_json::Error),

    /// Uploading the snapshot failed.
    #[error("Sink error: {0}")]
    Sink(String),

    /// Invalid configuration (environment or sources file).
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Shorthand for a markup mismatch inside an extractor.
    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::Extraction(message.into())
    }

    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout")
                    || msg.contains("connect")
                    || msg.contains("reset")
                    || msg.starts_with("HTTP 5")
                    || msg.starts_with("HTTP 429")
            }
            _ => false,
        }
    }
}
