//! OpenAI-specific error handling.

use gardener_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert an OpenAI error into the shared error type.
///
/// Every variant maps to [`Error::Inference`] so the completion client can
/// report it as an API failure; the prefix keeps the cause readable.
pub fn to_gardener_error(code: OpenAIErrorCode, message: &str) -> Error {
    let prefix = match code {
        OpenAIErrorCode::AuthenticationError => "Authentication failed",
        OpenAIErrorCode::RateLimitExceeded => "Rate limit exceeded",
        OpenAIErrorCode::ModelNotFound => "Model not found",
        OpenAIErrorCode::ContextLengthExceeded => "Context too long",
        OpenAIErrorCode::ServerError => "Server error",
        OpenAIErrorCode::Unknown => return Error::Inference(message.to_string()),
    };
    Error::Inference(format!("{}: {}", prefix, message))
}
