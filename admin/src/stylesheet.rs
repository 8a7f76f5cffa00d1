//! Code for reading and rewriting CSS rules as selector → property tables.

use crate::{
    rules::{blocks, replace_first},
    Change,
};
use anyhow::{Context, Result};
use common::Store;
use indexmap::IndexMap;
use regex::{escape, Regex};

/// Property → value pairs of one rule, in source order.
pub type Declarations = IndexMap<String, String>;

/// Splits a rule body into declarations.
/// Segments without a `:` are dropped.
/// Only the first `:` of a segment separates property from value.
#[must_use]
pub fn parse_declarations(body: &str) -> Declarations {
    body.trim()
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(property, value)| (property.trim().to_owned(), value.trim().to_owned()))
        .collect()
}

/// Parses every rule in a stylesheet.
/// A selector that appears more than once keeps its first position and takes its last declarations.
#[must_use]
pub fn parse_rules(source: &str) -> IndexMap<String, Declarations> {
    blocks(source)
        .map(|block| (block.name.to_owned(), parse_declarations(block.body)))
        .collect()
}

/// Lists selectors in source order, including repeats.
#[must_use]
pub fn selectors(source: &str) -> Vec<&str> {
    blocks(source).map(|block| block.name).collect()
}

#[must_use]
pub fn render_rule(selector: &str, declarations: &Declarations) -> String {
    let mut rule = format!("{selector} {{\n");
    for (property, value) in declarations {
        rule.push_str(&format!("    {property}: {value};\n"));
    }
    rule.push('}');
    rule
}

/// Replaces the first rule for `selector` with one holding exactly `declarations`.
/// Properties of the old rule that are not in `declarations` are removed.
/// Returns `None` if the stylesheet has no rule for `selector`.
///
/// The selector is matched as plain text anywhere in the source,
/// so `a` also matches the tail of `.nav a` if that rule comes first.
///
/// # Errors
/// This function returns an error if the search pattern for the selector cannot be compiled.
pub fn replace_rule(
    source: &str,
    selector: &str,
    declarations: &Declarations,
) -> Result<Option<String>> {
    let pattern = Regex::new(&format!(r"{}\s*\{{[^}}]*\}}", escape(selector)))
        .with_context(|| format!("failed to build search pattern for selector \"{selector}\""))?;

    Ok(replace_first(
        source,
        &pattern,
        &render_rule(selector, declarations),
    ))
}

/// Lists and edits the rules of the stylesheet held by a [`Store`].
pub struct StyleEditor<S> {
    store: S,
}

impl<S: Store> StyleEditor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Errors
    /// This function returns an error if the stylesheet cannot be read.
    pub fn rules(&self) -> Result<IndexMap<String, Declarations>> {
        self.store
            .read()
            .context("failed to read stylesheet")
            .map(|source| parse_rules(&source))
    }

    /// # Errors
    /// This function returns an error if the stylesheet cannot be read.
    pub fn selectors(&self) -> Result<Vec<String>> {
        let source = self.store.read().context("failed to read stylesheet")?;
        Ok(selectors(&source).into_iter().map(Into::into).collect())
    }

    /// Replaces the rule for `selector` and saves the stylesheet.
    /// If the stylesheet has no such rule, nothing is written.
    ///
    /// # Errors
    /// This function returns an error if the stylesheet cannot be read or written.
    pub fn update_rule(&self, selector: &str, declarations: &Declarations) -> Result<Change> {
        let source = self.store.read().context("failed to read stylesheet")?;

        let Some(updated) = replace_rule(&source, selector, declarations)? else {
            log::warn!("no CSS rule found for selector \"{selector}\"");
            return Ok(Change::NoMatch);
        };

        self.store
            .write(&updated)
            .context("failed to save stylesheet")?;

        log::info!(
            "updated CSS rule \"{selector}\" with {} properties",
            declarations.len()
        );

        Ok(Change::Updated)
    }
}
