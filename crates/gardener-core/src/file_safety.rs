//! Note name sanitization.
//!
//! Model-suggested names end up as file names, so they are cleaned before
//! any path is built from them.

use crate::models::strip_markdown_extension;

/// Maximum file name length in bytes, extension excluded.
const MAX_NAME_LEN: usize = 200;

/// Turn a model-suggested name into a safe note base name.
///
/// Strips a trailing `.md`, replaces path separators with `-` (so the name
/// cannot escape its folder), replaces characters most filesystems reject
/// with `_`, and trims whitespace and dots.
pub fn sanitize_note_name(name: &str) -> String {
    let name = strip_markdown_extension(name.trim());

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim().trim_matches('.').trim();
    if sanitized.is_empty() {
        return "Untitled".to_string();
    }

    if sanitized.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        return sanitized[..end].trim_end().to_string();
    }

    sanitized.to_string()
}

/// Note file name (`<name>.md`) for a model-suggested name.
pub fn note_file_name(name: &str) -> String {
    format!("{}.md", sanitize_note_name(name))
}
