//! Tag extraction from frontmatter and document bodies.
//!
//! Tags are normalized to `#tag` form. Frontmatter tags come from the `tags`
//! or `tag` key (a list, or a comma/space separated string). Inline tags are
//! `#word` tokens preceded by whitespace or line start, outside fenced code
//! blocks, containing at least one non-digit character.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

static INLINE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}_/\-]+)").expect("inline tag pattern is valid")
});

const FRONTMATTER_TAG_KEYS: &[&str] = &["tags", "tag"];

/// Normalize a raw tag (`travel`, `#travel`, ` travel `) to `#travel`.
/// Returns `None` for empty or purely numeric tags.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim();
    if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("#{}", tag))
}

/// Tags declared in a frontmatter map.
pub fn frontmatter_tags(frontmatter: &serde_json::Map<String, JsonValue>) -> Vec<String> {
    let mut tags = Vec::new();
    for (key, value) in frontmatter {
        if !FRONTMATTER_TAG_KEYS.contains(&key.to_lowercase().as_str()) {
            continue;
        }
        match value {
            JsonValue::String(s) => {
                tags.extend(
                    s.split(|c: char| c == ',' || c.is_whitespace())
                        .filter_map(normalize_tag),
                );
            }
            JsonValue::Array(items) => {
                tags.extend(items.iter().filter_map(|v| match v {
                    JsonValue::String(s) => normalize_tag(s),
                    JsonValue::Number(n) => normalize_tag(&n.to_string()),
                    _ => None,
                }));
            }
            _ => {}
        }
    }
    tags
}

/// Inline `#tags` in a document body, in order of appearance.
pub fn inline_tags(body: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for cap in INLINE_TAG.captures_iter(line) {
            if let Some(tag) = cap.get(1).and_then(|m| normalize_tag(m.as_str())) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// All tags of a document, frontmatter first, without duplicates.
pub fn document_tags(
    frontmatter: &serde_json::Map<String, JsonValue>,
    body: &str,
) -> Vec<String> {
    let mut all: Vec<String> = Vec::new();
    for tag in frontmatter_tags(frontmatter)
        .into_iter()
        .chain(inline_tags(body))
    {
        if !all.contains(&tag) {
            all.push(tag);
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("travel"), Some("#travel".to_string()));
        assert_eq!(normalize_tag("#japan "), Some("#japan".to_string()));
        assert_eq!(normalize_tag("#"), None);
        assert_eq!(normalize_tag("2024"), None);
    }

    #[test]
    fn test_frontmatter_list_and_string() {
        let fm = json!({"tags": ["travel", "#japan"], "tag": "food, ramen"});
        let mut tags = frontmatter_tags(fm.as_object().unwrap());
        tags.sort();
        assert_eq!(tags, vec!["#food", "#japan", "#ramen", "#travel"]);
    }

    #[test]
    fn test_frontmatter_ignores_other_keys() {
        let fm = json!({"topics": ["travel"]});
        assert!(frontmatter_tags(fm.as_object().unwrap()).is_empty());
    }

    #[test]
    fn test_inline_tags() {
        let body = "# Trip\nPlanning #travel to #japan/kyoto.\nSee http://x.com/#anchor";
        assert_eq!(inline_tags(body), vec!["#travel", "#japan/kyoto"]);
    }

    #[test]
    fn test_inline_tags_skip_code_fences_and_headings() {
        let body = "## Heading\n```\n#not-a-tag\n```\n#real";
        assert_eq!(inline_tags(body), vec!["#real"]);
    }

    #[test]
    fn test_inline_numeric_tag_ignored() {
        assert!(inline_tags("issue #42").is_empty());
    }

    #[test]
    fn test_document_tags_deduplicates() {
        let fm = json!({"tags": ["travel"]});
        let tags = document_tags(fm.as_object().unwrap(), "#travel and #japan");
        assert_eq!(tags, vec!["#travel", "#japan"]);
    }
}
