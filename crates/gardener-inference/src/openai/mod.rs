//! OpenAI-compatible chat backend.
//!
//! Works with any endpoint that speaks the OpenAI chat-completions protocol:
//! OpenAI itself, Azure OpenAI, or a local server such as Ollama or vLLM.
//!
//! # Example
//!
//! ```rust,no_run
//! use gardener_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! let backend = OpenAIBackend::new(OpenAIConfig {
//!     base_url: "http://localhost:11434/v1".to_string(),
//!     api_key: None,
//!     model: "llama3".to_string(),
//!     ..Default::default()
//! })
//! .unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_gardener_error, OpenAIErrorCode};
pub use types::*;
