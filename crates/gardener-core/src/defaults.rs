//! Centralized default constants for digital-gardener.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own literals.

// =============================================================================
// COMPLETION REQUESTS
// =============================================================================

/// Temperature used when neither the caller nor the settings provide one.
pub const REQUEST_TEMPERATURE: f32 = 0.5;

/// Token budget used when neither the caller nor the settings provide one.
pub const REQUEST_MAX_TOKENS: u32 = 150;

/// Highest temperature accepted by the completion API.
pub const TEMPERATURE_MAX: f32 = 2.0;

/// Default HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Message shown to the user when the completion API cannot be reached.
pub const APOLOGY_MESSAGE: &str =
    "My apologies, I am having trouble fetching a response from OpenAI. Please try again.";

/// Message shown when the model's answer could not be understood.
pub const MALFORMED_RESPONSE_MESSAGE: &str =
    "The response from OpenAI was not in the expected format. Please try again.";

/// Message shown when the user cancels a pending request.
pub const CANCELLED_MESSAGE: &str = "The request was cancelled.";

// =============================================================================
// OPENAI
// =============================================================================

/// Default OpenAI API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const OPENAI_MODEL: &str = "gpt-35-turbo";

/// Models offered by the option collector, with display labels.
pub const AVAILABLE_MODELS: &[(&str, &str)] = &[
    ("gpt-4-vision-preview", "GPT4 Turbo + Vision"),
    ("gpt-4-1106-preview", "GPT4 Turbo"),
    ("gpt-4", "GPT-4"),
    ("gpt-35-turbo", "GPT3.5 Turbo"),
];

// =============================================================================
// SETTINGS
// =============================================================================

/// Default sampling temperature stored in settings.
pub const SETTINGS_TEMPERATURE: f32 = 0.7;

/// Default token budget stored in settings.
pub const SETTINGS_MAX_TOKENS: u32 = 10_000;

/// Default preferred language for personalisation.
pub const USER_LANGUAGES: &str = "English (en-gb)";

/// Plugin identifier used for the settings folder.
pub const PLUGIN_ID: &str = "digital-gardener";

/// Settings file name inside the plugin folder.
pub const SETTINGS_FILE: &str = "data.json";

// =============================================================================
// VAULT
// =============================================================================

/// Vault configuration directory name.
pub const CONFIG_DIR: &str = ".obsidian";

/// Folder (below the root folder) where generated notes are created.
pub const NOTES_FOLDER: &str = "notes";

/// Markdown document extension, without the dot.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Folders never listed or indexed.
pub const IGNORED_FOLDERS: &[&str] = &[".obsidian", ".git", ".space", ".trash"];

/// Frontmatter keys that tend to be generated by other tools and must not be
/// replaced by the model.
pub const PROTECTED_FRONTMATTER_KEYS: &[&str] = &["created", "modified", "status", "author"];

// =============================================================================
// STATUS BAR
// =============================================================================

/// Prefix for every status bar message.
pub const STATUS_PREFIX: &str = "Digital Gardener";

/// Interval between elapsed-time updates while a request is pending.
pub const STATUS_TICK_SECS: u64 = 1;
