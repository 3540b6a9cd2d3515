//! # gardener-vault
//!
//! Filesystem-backed vault for digital-gardener.
//!
//! This crate provides:
//! - [`FilesystemVault`], a [`gardener_core::DocumentStore`] over a directory
//! - YAML frontmatter parsing and merging
//! - Tag extraction and the vault metadata index
//! - Settings persistence and first-run folder setup

pub mod folders;
pub mod frontmatter;
pub mod fs_store;
pub mod index;
pub mod settings_store;
pub mod tags;

pub use folders::{ensure_root_folders, list_folders};
pub use fs_store::FilesystemVault;
pub use index::read_vault_index;
pub use settings_store::SettingsStore;
