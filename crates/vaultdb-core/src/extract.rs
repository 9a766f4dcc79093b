//! Markdown to plain text normalization.
//!
//! This is a textual pass, not a markdown parser: each marker family is removed
//! by one regex, in a fixed order, and whatever nesting the regexes cannot see
//! survives.
use encoding_rs::WINDOWS_1252;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::Result;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    // Patterns are literals; the unit tests compile every one of them.
    let pattern = Regex::new(pattern).expect("markdown rule compiles");
    Rule { pattern, replacement }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(r"#{1,6}\s+", ""),
        rule(r"\*\*(.*?)\*\*", "$1"),
        rule(r"\*(.*?)\*", "$1"),
        rule(r"__(.*?)__", "$1"),
        rule(r"\[(.*?)\]\(.*?\)", "$1"),
        rule(r"(?s)```.*?```", ""),
        rule(r"`([^`]+)`", "$1"),
        rule(r"(?m)^\s*[-*+]\s+", ""),
        rule(r"(?m)^\s*\d+\.\s+", ""),
        rule(r">\s+", ""),
        rule(r"\n\s*\n", "\n\n"),
    ]
});

/// Decode file bytes as UTF-8, falling back to a single-byte table that accepts any input.
/// `\r\n` and lone `\r` line endings become `\n`.
pub fn decode(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            tracing::debug!(valid_up_to = e.valid_up_to(), "not UTF-8, decoding as Windows-1252");
            let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text
        }
    };
    normalize_newlines(&text)
}

fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip markdown markers and collapse blank-line runs.
pub fn strip_markdown(content: &str) -> String {
    let mut text = content.to_string();
    for rule in RULES.iter() {
        text = rule.pattern.replace_all(&text, rule.replacement).into_owned();
    }
    text.trim().to_string()
}

/// Read a markdown file and return its normalized plain text.
pub fn extract_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(strip_markdown(&decode(&bytes)))
}
