//! Core traits for digital-gardener abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::*;
use crate::settings::Settings;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// The vault: a collection of markdown documents plus the active document.
///
/// All paths are vault-relative and use `/` separators.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Display name of the vault.
    fn vault_name(&self) -> String;

    /// Vault configuration directory, e.g. `.obsidian`.
    fn config_dir(&self) -> String;

    /// List every markdown document.
    async fn list_documents(&self) -> Result<Vec<DocumentRef>>;

    /// List every folder below the vault root.
    async fn list_folders(&self) -> Result<Vec<String>>;

    /// Read a document's full raw content.
    async fn read(&self, path: &str) -> Result<String>;

    /// Read a document's tags and frontmatter.
    async fn metadata(&self, path: &str) -> Result<DocumentMetadata>;

    /// Check whether a document or folder exists.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a document. Fails if one already exists at `path`.
    async fn create(&self, path: &str, content: &str) -> Result<DocumentRef>;

    /// Create a folder and any missing parents.
    async fn create_folder(&self, path: &str) -> Result<()>;

    /// Move a document. Fails if the target exists.
    async fn rename(&self, path: &str, new_path: &str) -> Result<DocumentRef>;

    /// Assign the given key/value pairs into the document's frontmatter,
    /// creating the block if it is missing.
    async fn merge_frontmatter(
        &self,
        path: &str,
        properties: &serde_json::Map<String, JsonValue>,
    ) -> Result<()>;

    /// Append text to the end of a document, on a new line.
    async fn append(&self, path: &str, text: &str) -> Result<()>;

    /// The document the user is working on, if any.
    async fn active_document(&self) -> Option<DocumentRef>;

    /// Make a document the active one (or clear it).
    async fn set_active_document(&self, doc: Option<DocumentRef>) -> Result<()>;
}

// =============================================================================
// CHAT BACKEND
// =============================================================================

/// A chat-completion endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a fully resolved request and return the first choice's content.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Model used when the caller does not override it.
    fn default_model(&self) -> &str;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

// =============================================================================
// USER SURFACE
// =============================================================================

/// Everything the commands need from the person at the keyboard.
#[async_trait]
pub trait UserSurface: Send + Sync {
    /// Collect per-invocation options. `None` means the dialog was cancelled.
    async fn collect_options(
        &self,
        settings: &Settings,
        request: &OptionRequest,
    ) -> Result<Option<CallOptions>>;

    /// Pick one of several options. `None` means cancelled.
    async fn select_one(
        &self,
        title: &str,
        instructions: &str,
        choices: &[Choice],
    ) -> Result<Option<usize>>;

    /// Toggle any number of options. `None` means cancelled.
    async fn select_many(
        &self,
        title: &str,
        instructions: &str,
        choices: &[Choice],
    ) -> Result<Option<Vec<usize>>>;

    /// Show a notification.
    fn notify(&self, notice: Notice);
}

/// Receives status bar text.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, text: &str);
}
