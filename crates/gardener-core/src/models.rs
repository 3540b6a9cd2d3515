//! Core data models for digital-gardener.
//!
//! These types are shared across all digital-gardener crates.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};

use crate::defaults;
use crate::settings::{EmojiLevel, Settings};

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Reference to a markdown document inside the vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Vault-relative path using `/` separators, e.g. `travel/Trip.md`.
    pub path: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name including the extension, e.g. `Trip.md`.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without the markdown extension, e.g. `Trip`.
    pub fn basename(&self) -> &str {
        strip_markdown_extension(self.name())
    }

    /// Parent folder, empty for documents at the vault root.
    pub fn folder(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.name()
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case(defaults::MARKDOWN_EXTENSION))
            .unwrap_or(false)
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Remove a trailing `.md` (any case) from a file name.
pub fn strip_markdown_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && ext.eq_ignore_ascii_case(defaults::MARKDOWN_EXTENSION) =>
        {
            stem
        }
        _ => name,
    }
}

/// Cached metadata for a document: tags and parsed frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Tags in `#tag` form, from frontmatter and inline occurrences.
    pub tags: Vec<String>,
    /// Frontmatter key/value pairs in document order.
    pub frontmatter: serde_json::Map<String, JsonValue>,
}

// =============================================================================
// VAULT INDEX
// =============================================================================

/// Snapshot of the vault's metadata, recomputed for every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultFileIndex {
    /// Document path → file name.
    pub files: BTreeMap<String, String>,
    /// All tags seen in any document.
    pub tags: BTreeSet<String>,
    /// All distinct frontmatter keys.
    pub frontmatter_keys: BTreeSet<String>,
}

impl VaultFileIndex {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.tags.is_empty() && self.frontmatter_keys.is_empty()
    }
}

// =============================================================================
// CALL OPTIONS
// =============================================================================

/// Per-invocation request options, built once by the option collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    pub include_personalisation: bool,
    pub include_filenames: bool,
    pub include_tags: bool,
    pub user_query: String,
    /// Model override; the settings model is used when unset.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub emoji_level: EmojiLevel,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            include_personalisation: false,
            include_filenames: false,
            include_tags: false,
            user_query: String::new(),
            model: None,
            temperature: None,
            max_tokens: None,
            emoji_level: EmojiLevel::Low,
        }
    }
}

impl CallOptions {
    /// Options for commands that run without a dialog.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: Some(settings.model.clone()),
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
            emoji_level: settings.emoji_level,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.user_query = query.into();
        self
    }

    /// Force personalisation off when there is nothing to personalise with.
    pub fn normalized(mut self, settings: &Settings) -> Self {
        if !settings.has_personalisation() {
            self.include_personalisation = false;
        }
        self
    }

    /// Request parameters for the completion client.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            model: self.model.clone().filter(|m| !m.trim().is_empty()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

// =============================================================================
// CHAT TYPES
// =============================================================================

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Ordered messages sent to the completion API: one system, one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    messages: Vec<ChatMessage>,
}

impl ComposedPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn system(&self) -> &str {
        &self.messages[0].content
    }

    pub fn user(&self) -> &str {
        &self.messages[1].content
    }

    /// Total byte length of all message contents.
    pub fn len(&self) -> usize {
        self.messages.iter().map(|m| m.content.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Caller-level request parameters; unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Fully resolved request handed to a chat backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the API for a JSON object response.
    pub json_response: bool,
}

// =============================================================================
// COMPLETION OUTCOME
// =============================================================================

/// Why a completion did not produce a usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Could not reach the API.
    Network,
    /// The API answered with an error status.
    Api,
    /// The request exceeded its deadline.
    Timeout,
    /// The request was cancelled by the user.
    Cancelled,
    /// The response did not match the expected shape.
    MalformedResponse,
    /// The model returned an `{error, message}` object.
    ModelReported,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Api => "api",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::MalformedResponse => "malformed_response",
            Self::ModelReported => "model_reported",
        }
    }
}

/// Failure converted to data at the completion client boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionFailure {
    pub kind: FailureKind,
    /// Short error code or detail.
    pub error: String,
    /// User-facing message.
    pub message: String,
}

impl CompletionFailure {
    pub fn new(kind: FailureKind, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
            message: message.into(),
        }
    }

    /// Text shown in the error dialog: `"{message} {error}"`, trimmed.
    pub fn display_text(&self) -> String {
        format!("{} {}", self.message, self.error).trim().to_string()
    }
}

/// Result of a completion request. Failures never escape as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome<T> {
    Success(T),
    Failed(CompletionFailure),
}

impl<T> CompletionOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure(&self) -> Option<&CompletionFailure> {
        match self {
            Self::Failed(f) => Some(f),
            Self::Success(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CompletionOutcome<U> {
        match self {
            Self::Success(v) => CompletionOutcome::Success(f(v)),
            Self::Failed(e) => CompletionOutcome::Failed(e),
        }
    }
}

// =============================================================================
// USER SURFACE TYPES
// =============================================================================

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Whether a notification is transient or must be acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStyle {
    Toast,
    Dialog,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub style: NoticeStyle,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn toast(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            style: NoticeStyle::Toast,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn dialog(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            style: NoticeStyle::Dialog,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// One option in a selection dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub description: String,
    pub reason: String,
    pub score: f64,
}

/// What the option collector is being asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionRequest {
    /// Dialog heading.
    pub title: String,
    /// Whether the filename/tag context toggles make sense for this command.
    pub offer_context_toggles: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ref_parts() {
        let doc = DocumentRef::new("travel/2024/Trip.md");
        assert_eq!(doc.name(), "Trip.md");
        assert_eq!(doc.basename(), "Trip");
        assert_eq!(doc.folder(), "travel/2024");
        assert!(doc.is_markdown());

        let root = DocumentRef::new("Index.MD");
        assert_eq!(root.folder(), "");
        assert_eq!(root.basename(), "Index");
        assert!(!DocumentRef::new("image.png").is_markdown());
    }

    #[test]
    fn test_strip_markdown_extension() {
        assert_eq!(strip_markdown_extension("My Note.md"), "My Note");
        assert_eq!(strip_markdown_extension("My Note"), "My Note");
        assert_eq!(strip_markdown_extension("readme.md.md"), "readme.md");
        assert_eq!(strip_markdown_extension(".md"), ".md");
        assert_eq!(strip_markdown_extension("notes.mdx"), "notes.mdx");
    }

    #[test]
    fn test_call_options_defaults() {
        let options = CallOptions::default();
        assert!(!options.include_personalisation);
        assert!(!options.include_filenames);
        assert!(!options.include_tags);
        assert_eq!(options.emoji_level, EmojiLevel::Low);
        assert_eq!(options.request_options(), RequestOptions::default());
    }

    #[test]
    fn test_call_options_from_settings() {
        let settings = Settings {
            model: "gpt-4".to_string(),
            temperature: 1.2,
            max_tokens: 900,
            emoji_level: EmojiLevel::High,
            ..Default::default()
        };
        let options = CallOptions::from_settings(&settings);
        let request = options.request_options();
        assert_eq!(request.model.as_deref(), Some("gpt-4"));
        assert_eq!(request.temperature, Some(1.2));
        assert_eq!(request.max_tokens, Some(900));
        assert_eq!(options.emoji_level, EmojiLevel::High);
    }

    #[test]
    fn test_normalized_drops_personalisation_without_name() {
        let options = CallOptions {
            include_personalisation: true,
            ..Default::default()
        };
        let normalized = options.clone().normalized(&Settings::default());
        assert!(!normalized.include_personalisation);

        let named = Settings {
            user_name: "Alex".to_string(),
            ..Default::default()
        };
        assert!(options.normalized(&named).include_personalisation);
    }

    #[test]
    fn test_blank_model_override_is_ignored() {
        let options = CallOptions {
            model: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(options.request_options().model.is_none());
    }

    #[test]
    fn test_composed_prompt_order() {
        let prompt = ComposedPrompt::new("sys", "hello");
        assert_eq!(prompt.messages().len(), 2);
        assert_eq!(prompt.messages()[0].role, ChatRole::System);
        assert_eq!(prompt.messages()[1].role, ChatRole::User);
        assert_eq!(prompt.system(), "sys");
        assert_eq!(prompt.user(), "hello");
        assert_eq!(prompt.len(), 8);
    }

    #[test]
    fn test_failure_display_text() {
        let failure = CompletionFailure::new(FailureKind::ModelReported, "", "Could not comply.");
        assert_eq!(failure.display_text(), "Could not comply.");

        let failure = CompletionFailure::new(FailureKind::Api, "rate_limit", "Try later.");
        assert_eq!(failure.display_text(), "Try later. rate_limit");
    }

    #[test]
    fn test_outcome_map() {
        let outcome: CompletionOutcome<i32> = CompletionOutcome::Success(2);
        assert_eq!(outcome.map(|v| v * 2), CompletionOutcome::Success(4));

        let failed: CompletionOutcome<i32> = CompletionOutcome::Failed(CompletionFailure::new(
            FailureKind::Timeout,
            "timeout",
            "slow",
        ));
        assert!(failed.failure().is_some());
        assert!(!failed.map(|v| v + 1).is_success());
    }
}
