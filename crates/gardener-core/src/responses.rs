//! Typed JSON responses, one per command.
//!
//! Each response type is deserialized from the model's JSON content and then
//! checked with [`StructuredResponse::validate`]. A response that fails either
//! step is reported as a malformed response instead of reaching the vault.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A JSON shape the completion client can parse and validate.
pub trait StructuredResponse: DeserializeOwned + Send {
    /// Short name of the shape, used in log and error messages.
    const SHAPE: &'static str;

    /// Check invariants serde cannot express.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

fn check_score(score: f64, what: &str) -> std::result::Result<(), String> {
    if score.is_finite() {
        Ok(())
    } else {
        Err(format!("{} has a non-finite score", what))
    }
}

// =============================================================================
// NEW FILE
// =============================================================================

/// `{filename, content, frontmatter}` returned by the new-file command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFileResult {
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub frontmatter: serde_json::Map<String, JsonValue>,
}

impl StructuredResponse for NewFileResult {
    const SHAPE: &'static str = "new_file";

    fn validate(&self) -> std::result::Result<(), String> {
        if self.filename.trim().is_empty() {
            return Err("filename is empty".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// One candidate frontmatter property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCandidate {
    pub key: String,
    pub value: JsonValue,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub score: f64,
}

/// `{frontmatter: [{key, value, reason, score}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertiesResult {
    #[serde(default)]
    pub frontmatter: Vec<PropertyCandidate>,
}

impl StructuredResponse for PropertiesResult {
    const SHAPE: &'static str = "properties";

    fn validate(&self) -> std::result::Result<(), String> {
        for candidate in &self.frontmatter {
            if candidate.key.trim().is_empty() {
                return Err("property with an empty key".to_string());
            }
            check_score(candidate.score, &format!("property `{}`", candidate.key))?;
        }
        Ok(())
    }
}

// =============================================================================
// WIKI LINKS
// =============================================================================

/// One candidate link from the active document to another document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiLinkCandidate {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "linkLabel")]
    pub link_label: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub score: f64,
}

impl WikiLinkCandidate {
    /// Bullet line appended to the document:
    /// `- [[{fileName}|{linkLabel}]] (Reason: {reason}, Relevancy: {score})`.
    pub fn to_markdown(&self) -> String {
        format!(
            "- [[{}|{}]] (Reason: {}, Relevancy: {})",
            self.file_name, self.link_label, self.reason, self.score
        )
    }
}

/// `{wikiLinks: [{fileName, linkLabel, reason, score}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiLinksResult {
    #[serde(rename = "wikiLinks", default)]
    pub wiki_links: Vec<WikiLinkCandidate>,
}

impl StructuredResponse for WikiLinksResult {
    const SHAPE: &'static str = "wiki_links";

    fn validate(&self) -> std::result::Result<(), String> {
        for link in &self.wiki_links {
            if link.file_name.trim().is_empty() {
                return Err("wiki link with an empty fileName".to_string());
            }
            check_score(link.score, &format!("wiki link `{}`", link.file_name))?;
        }
        Ok(())
    }
}

// =============================================================================
// FILENAMES
// =============================================================================

/// One candidate file name with the model's reasoning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilenameCandidate {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub score: f64,
}

/// `{filenames: [{fileName, reason, score}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilenamesResult {
    #[serde(default)]
    pub filenames: Vec<FilenameCandidate>,
}

impl StructuredResponse for FilenamesResult {
    const SHAPE: &'static str = "filenames";

    fn validate(&self) -> std::result::Result<(), String> {
        for candidate in &self.filenames {
            if candidate.file_name.trim().is_empty() {
                return Err("filename candidate is empty".to_string());
            }
            check_score(candidate.score, &format!("filename `{}`", candidate.file_name))?;
        }
        Ok(())
    }
}
