//! A scanner for flat `name { body }` blocks, shared by the stylesheet and script editors.
//!
//! Bodies cannot nest: a block ends at the first `}` after its `{`.
//! An inner `{ ... }` inside a body therefore cuts the block short at the inner closing brace.
//! Replacement relies on the same non-nesting match, so this is kept as a property of the grammar.

use regex::Regex;
use std::{ops::Range, sync::LazyLock};

static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^{]+)\{([^}]*)\}").expect("block pattern is valid"));

/// One `header { body }` match in a source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block<'a> {
    /// The header with surrounding whitespace removed
    pub name: &'a str,
    /// The raw text between the braces
    pub body: &'a str,
    /// Byte range of the whole match in the source
    pub span: Range<usize>,
}

/// Returns every block in `source`, in source order.
pub fn blocks(source: &str) -> impl Iterator<Item = Block<'_>> {
    BLOCK.captures_iter(source).map(|caps| {
        let whole = caps.get(0).expect("capture group 0 always participates");
        Block {
            name: caps.get(1).map_or("", |name| name.as_str().trim()),
            body: caps.get(2).map_or("", |body| body.as_str()),
            span: whole.range(),
        }
    })
}

/// Replaces the first match of `pattern` in `source` with `replacement`, taken literally.
/// Returns `None` if `pattern` does not match.
pub(crate) fn replace_first(source: &str, pattern: &Regex, replacement: &str) -> Option<String> {
    pattern
        .find(source)
        .map(|found| splice(source, found.range(), replacement))
}

/// Returns `source` with the bytes in `range` replaced by `replacement`.
fn splice(source: &str, range: Range<usize>, replacement: &str) -> String {
    let mut output = String::with_capacity(source.len() - range.len() + replacement.len());
    output.push_str(&source[..range.start]);
    output.push_str(replacement);
    output.push_str(&source[range.end..]);
    output
}
