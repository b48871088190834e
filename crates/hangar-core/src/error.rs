use thiserror::Error;

/// Application-wide error types for Hangar.
#[derive(Error, Debug)]
pub enum AppError {
    /// Target page answered with a non-success status or could not be read.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Headless browser failed to render a page.
    #[error("Render error: {0}")]
    RenderError(String),

    /// Text classifier call failed.
    #[error("Classifier error (HTTP {status_code}): {message}")]
    ClassifierError {
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::ClassifierError { retryable, .. } => *retryable,
            AppError::HttpError(msg) => {
                msg.contains("timeout")
                    || msg.contains("connect")
                    || msg.contains("reset")
                    || msg.contains("HTTP 5")
            }
            _ => false,
        }
    }
}
