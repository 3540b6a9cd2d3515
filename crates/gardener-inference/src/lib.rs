//! # gardener-inference
//!
//! Chat-completion plumbing for digital-gardener.
//!
//! - [`CompletionClient`]: timeout, cancellation and JSON validation around a
//!   [`gardener_core::ChatBackend`]
//! - [`openai`]: OpenAI-compatible HTTP backend
//! - [`mock`]: recording backend for tests (feature `mock`)

pub mod cancel;
pub mod client;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cancel::CancelToken;
pub use client::{parse_structured, strip_code_fences, CompletionClient};

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};
