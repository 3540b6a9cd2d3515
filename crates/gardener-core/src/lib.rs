//! # gardener-core
//!
//! Core types, traits, and abstractions for digital-gardener.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other digital-gardener crates depend on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod responses;
pub mod settings;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{note_file_name, sanitize_note_name};
pub use models::*;
pub use responses::*;
pub use settings::{join_vault_path, EmojiLevel, Settings};
pub use traits::*;
