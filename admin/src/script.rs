//! Code for listing and rewriting the bodies of named JavaScript functions.
//!
//! Only `function name(...) { ... }` declarations are recognized.
//! A body ends at its first `}`, so a function containing an inner block is cut short there;
//! see [`crate::rules`].

use crate::{rules::replace_first, Change};
use anyhow::{Context, Result};
use common::Store;
use regex::{escape, Regex};
use std::sync::LazyLock;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"function\s+(\w+)\s*\([^)]*\)\s*\{").expect("declaration pattern is valid")
});

/// Lists declared function names in source order, including repeats.
#[must_use]
pub fn function_names(source: &str) -> Vec<&str> {
    DECLARATION
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .collect()
}

/// Matches the declaration of `name`, capturing its body.
fn function_pattern(name: &str) -> Result<Regex> {
    Regex::new(&format!(
        r"function\s+{}\s*\([^)]*\)\s*\{{([^}}]*)\}}",
        escape(name)
    ))
    .with_context(|| format!("failed to build search pattern for function \"{name}\""))
}

/// Returns the trimmed body of the first function declared as `name`,
/// or `None` if there is no such declaration.
///
/// # Errors
/// This function returns an error if the search pattern for the name cannot be compiled.
pub fn function_body<'a>(source: &'a str, name: &str) -> Result<Option<&'a str>> {
    Ok(function_pattern(name)?
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().trim()))
}

/// Renders a declaration of `name` with an empty parameter list.
#[must_use]
pub fn render_function(name: &str, body: &str) -> String {
    format!("function {name}() {{\n{body}\n}}")
}

/// Replaces the first function declared as `name` with [`render_function`]'s output.
/// The old parameter list is not carried over.
/// Returns `None` if there is no such declaration.
///
/// # Errors
/// This function returns an error if the search pattern for the name cannot be compiled.
pub fn replace_function(source: &str, name: &str, body: &str) -> Result<Option<String>> {
    Ok(replace_first(
        source,
        &function_pattern(name)?,
        &render_function(name, body),
    ))
}

/// Lists and edits the functions of the script held by a [`Store`].
pub struct ScriptEditor<S> {
    store: S,
}

impl<S: Store> ScriptEditor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Errors
    /// This function returns an error if the script cannot be read.
    pub fn function_names(&self) -> Result<Vec<String>> {
        let source = self.store.read().context("failed to read script")?;
        Ok(function_names(&source).into_iter().map(Into::into).collect())
    }

    /// # Errors
    /// This function returns an error if the script cannot be read.
    pub fn function_body(&self, name: &str) -> Result<Option<String>> {
        let source = self.store.read().context("failed to read script")?;
        Ok(function_body(&source, name)?.map(Into::into))
    }

    /// Replaces the body of the function `name` and saves the script.
    /// If the function is not declared, nothing is written.
    ///
    /// # Errors
    /// This function returns an error if the script cannot be read or written.
    pub fn update_function(&self, name: &str, body: &str) -> Result<Change> {
        let source = self.store.read().context("failed to read script")?;

        let Some(updated) = replace_function(&source, name, body)? else {
            log::warn!("no function named \"{name}\" found");
            return Ok(Change::NoMatch);
        };

        self.store.write(&updated).context("failed to save script")?;

        log::info!("updated body of function \"{name}\"");

        Ok(Change::Updated)
    }
}

#[cfg(test)]
mod test {
    use super::{function_body, function_names, replace_function, ScriptEditor};
    use crate::Change;
    use camino::Utf8PathBuf;
    use common::{FileStore, Store};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const SCRIPT: &str = "\
function toggleMenu(button, menu) {
  menu.classList.toggle('open');
}

const helper = () => 1;

function  scrollTop ( ) {
  window.scrollTo(0, 0);
}
";

    fn editor_with(source: &str) -> (TempDir, FileStore, ScriptEditor<FileStore>) {
        let dir = tempdir().expect("temporary directory should be created");
        let file = Utf8PathBuf::from_path_buf(dir.path().join("main.js"))
            .expect("temporary paths should be UTF-8");
        fs::write(&file, source).expect("write should succeed");
        let store = FileStore::new(file);
        (dir, store.clone(), ScriptEditor::new(store))
    }

    #[test]
    fn single_function() {
        let source = "function foo() { return 1; }";

        assert_eq!(function_names(source), ["foo"]);
        assert_eq!(
            function_body(source, "foo").expect("pattern should compile"),
            Some("return 1;")
        );
    }

    #[test]
    fn list_and_read() {
        assert_eq!(function_names(SCRIPT), ["toggleMenu", "scrollTop"]);
        assert_eq!(
            function_body(SCRIPT, "scrollTop").expect("pattern should compile"),
            Some("window.scrollTo(0, 0);")
        );
        assert_eq!(
            function_body(SCRIPT, "helper").expect("pattern should compile"),
            None
        );
        // Names must match whole, not as a prefix
        assert_eq!(
            function_body(SCRIPT, "toggle").expect("pattern should compile"),
            None
        );
    }

    #[test]
    fn nested_block_truncates_body() {
        let source = "function check(x) {\n  if (x) { return 1; }\n  return 0;\n}";

        assert_eq!(
            function_body(source, "check").expect("pattern should compile"),
            Some("if (x) { return 1;")
        );
    }

    #[test]
    fn replace_writes_empty_parameter_list() {
        let updated = replace_function(SCRIPT, "toggleMenu", "  menu.hidden = !menu.hidden;")
            .expect("pattern should compile")
            .expect("function should be found");

        assert!(updated.starts_with(
            "function toggleMenu() {\n  menu.hidden = !menu.hidden;\n}\n\nconst helper"
        ));
        assert_eq!(
            function_body(&updated, "toggleMenu").expect("pattern should compile"),
            Some("menu.hidden = !menu.hidden;")
        );
        assert_eq!(function_names(&updated), ["toggleMenu", "scrollTop"]);
    }

    #[test]
    fn update_round_trip() {
        let (_dir, store, editor) = editor_with(SCRIPT);

        assert_eq!(
            editor
                .update_function("scrollTop", "window.scrollTo({ top: 0 });")
                .expect("update should succeed"),
            Change::Updated
        );
        assert_eq!(
            editor
                .function_body("toggleMenu")
                .expect("reading should succeed")
                .as_deref(),
            Some("menu.classList.toggle('open');")
        );
        assert_eq!(
            editor
                .function_names()
                .expect("listing should succeed"),
            ["toggleMenu", "scrollTop"]
        );
        assert!(store
            .read()
            .expect("read should succeed")
            .ends_with("function scrollTop() {\nwindow.scrollTo({ top: 0 });\n}\n"));
    }

    #[test]
    fn update_missing_function() {
        let (_dir, store, editor) = editor_with(SCRIPT);

        assert_eq!(
            editor
                .update_function("missing", "return;")
                .expect("update should not fail"),
            Change::NoMatch
        );
        assert_eq!(store.read().expect("read should succeed"), SCRIPT);
    }
}
