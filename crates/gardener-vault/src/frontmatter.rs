//! YAML frontmatter codec.
//!
//! A document has frontmatter when its first line is `---` and a later line
//! is `---`; the text between them is a YAML mapping. Everything after the
//! closing line is the body.

use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value as YamlValue};

use gardener_core::{Error, Result};

const FENCE: &str = "---";

/// Split a document into its raw frontmatter (without fences) and body.
pub fn split(content: &str) -> (Option<&str>, &str) {
    let rest = match content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    {
        Some(rest) => rest,
        None => return (None, content),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    // Unterminated block: treat the whole document as body.
    (None, content)
}

/// Document body with any frontmatter removed.
pub fn body(content: &str) -> &str {
    split(content).1
}

fn parse_mapping(yaml: &str) -> Result<Mapping> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<YamlValue>(yaml)? {
        YamlValue::Null => Ok(Mapping::new()),
        YamlValue::Mapping(mapping) => Ok(mapping),
        other => Err(Error::InvalidInput(format!(
            "frontmatter is not a key/value mapping: {:?}",
            other
        ))),
    }
}

/// Parse a document's frontmatter into JSON values. Documents without
/// frontmatter yield an empty map.
pub fn parse(content: &str) -> Result<serde_json::Map<String, JsonValue>> {
    let Some(yaml) = split(content).0 else {
        return Ok(serde_json::Map::new());
    };
    let mapping = parse_mapping(yaml)?;

    let mut out = serde_json::Map::new();
    for (key, value) in mapping {
        let key = match key {
            YamlValue::String(s) => s,
            other => serde_yaml::to_string(&other)?.trim().to_string(),
        };
        out.insert(key, serde_json::to_value(value)?);
    }
    Ok(out)
}

/// Assign `properties` into the document's frontmatter and return the new
/// document text. Existing keys keep their position; new keys are appended.
/// The body is left byte-for-byte unchanged.
pub fn merge(content: &str, properties: &serde_json::Map<String, JsonValue>) -> Result<String> {
    let (yaml, body) = split(content);
    let mut mapping = match yaml {
        Some(yaml) => parse_mapping(yaml)?,
        None => Mapping::new(),
    };

    if properties.is_empty() {
        return Ok(content.to_string());
    }

    for (key, value) in properties {
        mapping.insert(
            YamlValue::String(key.clone()),
            serde_yaml::to_value(value)?,
        );
    }

    render(&mapping, body)
}

fn render(mapping: &Mapping, body: &str) -> Result<String> {
    let mut yaml = serde_yaml::to_string(mapping)?;
    if !yaml.ends_with('\n') {
        yaml.push('\n');
    }
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n{body}"))
}
