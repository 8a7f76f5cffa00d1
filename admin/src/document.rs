//! Code for listing and editing the visible text of an HTML page by structural path.
//!
//! Paths are derived from the document structure at the time of parsing.
//! The parser repairs malformed markup, and any structural edit elsewhere in the page
//! (or a repair of unbalanced tags) can shift paths, so a path captured earlier may go stale.

use crate::{path::PathSegment, Change, NodePath};
use anyhow::{Context, Result};
use common::{escape_html, Store};
use ego_tree::NodeId;
use indexmap::IndexMap;
use regex::Regex;
use scraper::{node::Text, Html, Node};
use std::sync::LazyLock;

// Markup declaring its own document root is parsed as a complete document and written back whole.
static DOCUMENT_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<!doctype|<html[\s>]").expect("document root pattern is valid")
});

// Markup with `<head>` or `<body>` but no root is parsed as a document whose `<html>` is implied.
static DOCUMENT_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:head|body)[\s>]").expect("document section pattern is valid")
});

pub struct Document {
    html: Html,
    // The root element was added by the parser; it is left out of paths and output
    implied_root: bool,
}

impl Document {
    /// Parses markup permissively. Parse errors are recovered from and discarded.
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        if DOCUMENT_ROOT.is_match(markup) {
            Self {
                html: Html::parse_document(markup),
                implied_root: false,
            }
        } else if DOCUMENT_SECTION.is_match(markup) {
            Self {
                html: Html::parse_document(markup),
                implied_root: true,
            }
        } else {
            Self {
                html: Html::parse_fragment(markup),
                implied_root: true,
            }
        }
    }

    /// Returns the trimmed content of every non-blank text node, keyed by structural path.
    ///
    /// Keys are ordered by the first text node producing them.
    /// When several text nodes share a path, the last one in document order provides the value.
    #[must_use]
    pub fn texts(&self) -> IndexMap<NodePath, String> {
        let mut texts = IndexMap::new();

        for (_, path, text) in self.text_nodes() {
            texts.insert(path, text.trim().to_owned());
        }

        texts
    }

    /// Replaces the whole content of the element holding the first non-blank text node at `path`
    /// with the HTML-escaped `text`. Child elements of that element are removed too.
    /// Returns `false` if no text node has that path.
    pub fn set_text(&mut self, path: &NodePath, text: &str) -> bool {
        let Some(element) = self
            .text_nodes()
            .find_map(|(id, node_path, _)| (node_path == *path).then_some(id))
            .and_then(|id| self.html.tree.get(id)?.parent())
            .map(|parent| parent.id())
        else {
            return false;
        };

        let children: Vec<NodeId> = self
            .html
            .tree
            .get(element)
            .map(|element| element.children().map(|child| child.id()).collect())
            .unwrap_or_default();

        for child in children {
            if let Some(mut child) = self.html.tree.get_mut(child) {
                child.detach();
            }
        }

        let Some(mut element) = self.html.tree.get_mut(element) else {
            return false;
        };

        element.append(Node::Text(Text {
            text: escape_html(text).as_str().into(),
        }));

        true
    }

    /// Serializes the document. A root element added during parsing is not written back.
    #[must_use]
    pub fn to_html(&self) -> String {
        if self.implied_root {
            self.html.root_element().inner_html()
        } else {
            self.html.html()
        }
    }

    fn text_nodes(&self) -> impl Iterator<Item = (NodeId, NodePath, &str)> + '_ {
        let wrapper = self
            .implied_root
            .then(|| self.html.root_element().id());

        self.html.tree.root().descendants().filter_map(move |node| {
            let text: &str = node.value().as_text()?;
            if text.trim().is_empty() {
                return None;
            }

            let segments = node
                .ancestors()
                .take_while(|ancestor| Some(ancestor.id()) != wrapper)
                .map_while(|ancestor| ancestor.value().as_element())
                .map(|element| {
                    PathSegment::new(element.name(), element.attr("id"), element.attr("class"))
                });

            Some((node.id(), NodePath::from_innermost(segments), text))
        })
    }
}

/// Lists and edits the text of the HTML page held by a [`Store`].
pub struct TextEditor<S> {
    store: S,
}

impl<S: Store> TextEditor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Errors
    /// This function returns an error if the HTML document cannot be read.
    pub fn texts(&self) -> Result<IndexMap<NodePath, String>> {
        let markup = self.store.read().context("failed to read HTML document")?;
        let texts = Document::parse(&markup).texts();

        log::debug!("found {} text paths", texts.len());

        Ok(texts)
    }

    /// Replaces the text at `path` and saves the document.
    /// If no text node matches, nothing is written.
    ///
    /// # Errors
    /// This function returns an error if the HTML document cannot be read or written.
    pub fn update(&self, path: &NodePath, text: &str) -> Result<Change> {
        let markup = self.store.read().context("failed to read HTML document")?;
        let mut document = Document::parse(&markup);

        if !document.set_text(path, text) {
            log::warn!("no text node found at {path}");
            return Ok(Change::NoMatch);
        }

        self.store
            .write(&document.to_html())
            .context("failed to save HTML document")?;

        log::info!("updated text at {path}");

        Ok(Change::Updated)
    }
}
