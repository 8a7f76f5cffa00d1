//! Escaping helpers for text that is embedded in markup or in quoted path predicates.

use aho_corasick::AhoCorasick;
use std::sync::LazyLock;

static HTML_SPECIAL_CHARS: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::new(["&", "<", ">", "\"", "'"])
        .expect("HTML special characters are valid patterns")
});
const HTML_ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#039;"];

static SLASHED_CHARS: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::new(["\\", "'", "\"", "\0"]).expect("quote characters are valid patterns")
});
const SLASHED_REPLACEMENTS: [&str; 4] = ["\\\\", "\\'", "\\\"", "\\0"];

/// Replaces `&`, `<`, `>`, `"`, and `'` with their HTML entities.
#[must_use]
pub fn escape_html(text: &str) -> String {
    HTML_SPECIAL_CHARS.replace_all(text, &HTML_ENTITIES)
}

/// Puts a backslash in front of backslashes, quotes, and NUL (written as `\0`).
#[must_use]
pub fn add_slashes(text: &str) -> String {
    SLASHED_CHARS.replace_all(text, &SLASHED_REPLACEMENTS)
}

/// Reverses [`add_slashes`]. A backslash followed by any other character yields that character;
/// a trailing lone backslash is dropped.
#[must_use]
pub fn strip_slashes(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('0') => output.push('\0'),
                Some(escaped) => output.push(escaped),
                None => {}
            }
        } else {
            output.push(c);
        }
    }

    output
}
