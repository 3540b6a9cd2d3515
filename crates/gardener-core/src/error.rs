//! Error types for digital-gardener.

use thiserror::Error;

/// Result type alias using digital-gardener's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for digital-gardener operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document or folder already exists at the target path
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Model output did not match the expected response shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// The request was cancelled before it completed
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// The request exceeded its deadline
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Error::Request(format!("timed out: {}", e));
        }
        Error::Request(e.to_string())
    }
}
