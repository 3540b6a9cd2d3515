//! Persisted plugin settings.
//!
//! Serialized with the same camelCase keys the vault's `data.json` has always
//! used, so an existing settings file loads unchanged. Every field has a
//! default, so a partial file is merged over the defaults on load.

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// How many emojis the model may use in generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl EmojiLevel {
    pub const ALL: [EmojiLevel; 4] = [Self::None, Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for EmojiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmojiLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid emoji level: {}", s)),
        }
    }
}

/// Settings shared by every component for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root folder (vault-relative) the plugin stores generated files under.
    #[serde(rename = "rootFolder")]
    pub root_folder: String,
    #[serde(rename = "openAIAPIKey")]
    pub api_key: String,
    #[serde(rename = "openAIModel")]
    pub model: String,
    #[serde(rename = "oaiTemperature")]
    pub temperature: f32,
    #[serde(rename = "oaiMaxTokens")]
    pub max_tokens: u32,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "userPronouns")]
    pub user_pronouns: String,
    #[serde(rename = "userBio")]
    pub user_bio: String,
    #[serde(rename = "userLanguages")]
    pub user_languages: String,
    #[serde(rename = "emojiLevel")]
    pub emoji_level: EmojiLevel,
    /// OpenAI-compatible endpoint.
    #[serde(rename = "openAIBaseURL")]
    pub base_url: String,
    #[serde(rename = "requestTimeoutSeconds")]
    pub timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_folder: String::new(),
            api_key: String::new(),
            model: defaults::OPENAI_MODEL.to_string(),
            temperature: defaults::SETTINGS_TEMPERATURE,
            max_tokens: defaults::SETTINGS_MAX_TOKENS,
            user_name: String::new(),
            user_pronouns: String::new(),
            user_bio: String::new(),
            user_languages: defaults::USER_LANGUAGES.to_string(),
            emoji_level: EmojiLevel::None,
            base_url: defaults::OPENAI_URL.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// True when an API key has been configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// True when personalisation can be offered (a user name is set).
    pub fn has_personalisation(&self) -> bool {
        !self.user_name.trim().is_empty()
    }

    /// Root folder without leading or trailing separators.
    pub fn root_folder(&self) -> &str {
        self.root_folder.trim_matches('/')
    }

    /// Vault-relative folder new notes are created in: `<root>/notes`.
    pub fn notes_folder(&self) -> String {
        join_vault_path(self.root_folder(), defaults::NOTES_FOLDER)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=defaults::TEMPERATURE_MAX).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0 and {}, got {}",
                defaults::TEMPERATURE_MAX,
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(Error::Config(
                "max tokens must be a positive integer".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Config(
                "request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Overlay environment variables on top of the loaded settings.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | OPENAI_API_KEY | api_key |
    /// | OPENAI_BASE_URL | base_url |
    /// | OPENAI_MODEL | model |
    /// | OPENAI_TIMEOUT | timeout_seconds |
    pub fn apply_env(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = key;
            }
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.model = model;
        }
        if let Some(timeout) = std::env::var("OPENAI_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.timeout_seconds = timeout;
        }
        self
    }

    /// Set a single field from its serialized key, as used by
    /// `gardener settings set <key> <value>`.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| Error::Internal("settings did not serialize to an object".into()))?;
        let current = obj
            .get(key)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown settings key: {}", key)))?;

        let parsed = match current {
            serde_json::Value::Number(_) => serde_json::from_str::<serde_json::Value>(value)
                .ok()
                .filter(|v| v.is_number())
                .ok_or_else(|| {
                    Error::InvalidInput(format!("{} expects a number, got {}", key, value))
                })?,
            _ => serde_json::Value::String(value.to_string()),
        };
        obj.insert(key.to_string(), parsed);

        let updated: Settings = serde_json::from_value(json)
            .map_err(|e| Error::InvalidInput(format!("Invalid value for {}: {}", key, e)))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Join vault-relative path segments with `/`, skipping empty segments.
pub fn join_vault_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    let name = name.trim_start_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model, "gpt-35-turbo");
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 10_000);
        assert_eq!(settings.user_languages, "English (en-gb)");
        assert_eq!(settings.emoji_level, EmojiLevel::None);
        assert!(!settings.has_api_key());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let json = r#"{"openAIAPIKey": "sk-test", "userName": "Sam", "emojiLevel": "high"}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.user_name, "Sam");
        assert_eq!(settings.emoji_level, EmojiLevel::High);
        assert_eq!(settings.model, "gpt-35-turbo");
        assert_eq!(settings.max_tokens, 10_000);
    }

    #[test]
    fn test_serializes_with_plugin_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json.get("openAIAPIKey").is_some());
        assert!(json.get("oaiTemperature").is_some());
        assert!(json.get("oaiMaxTokens").is_some());
        assert_eq!(json["emojiLevel"], "none");
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let settings = Settings {
            temperature: 2.5,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_max_tokens() {
        let settings = Settings {
            max_tokens: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_notes_folder() {
        let mut settings = Settings::default();
        assert_eq!(settings.notes_folder(), "notes");

        settings.root_folder = "/garden/".to_string();
        assert_eq!(settings.notes_folder(), "garden/notes");
    }

    #[test]
    fn test_join_vault_path() {
        assert_eq!(join_vault_path("", "a.md"), "a.md");
        assert_eq!(join_vault_path("notes/", "a.md"), "notes/a.md");
        assert_eq!(join_vault_path("notes", "/a.md"), "notes/a.md");
    }

    #[test]
    fn test_emoji_level_parse() {
        assert_eq!("HIGH".parse::<EmojiLevel>().unwrap(), EmojiLevel::High);
        assert!("lots".parse::<EmojiLevel>().is_err());
    }

    #[test]
    fn test_set_field_string_and_number() {
        let mut settings = Settings::default();
        settings.set_field("userName", "Robin").unwrap();
        settings.set_field("oaiMaxTokens", "2048").unwrap();
        settings.set_field("emojiLevel", "medium").unwrap();

        assert_eq!(settings.user_name, "Robin");
        assert_eq!(settings.max_tokens, 2048);
        assert_eq!(settings.emoji_level, EmojiLevel::Medium);
    }

    #[test]
    fn test_set_field_rejects_invalid() {
        let mut settings = Settings::default();
        assert!(settings.set_field("nope", "1").is_err());
        assert!(settings.set_field("oaiTemperature", "warm").is_err());
        assert!(settings.set_field("oaiTemperature", "3.5").is_err());
        assert!(settings.set_field("emojiLevel", "lots").is_err());
        assert_eq!(settings, Settings::default());
    }
}
