//! Dispatch of requests to the editors of one site.

use crate::{
    Change, Config, Form, Gallery, ImageTarget, MediaLibrary, Outcome, Request, ScriptEditor,
    Status, StyleEditor, TextEditor,
};
use anyhow::{Context, Result};
use common::FileStore;
use serde_json::{json, to_value};

/// Every editor of a site, set up from its configuration.
pub struct Site {
    text: TextEditor<FileStore>,
    styles: StyleEditor<FileStore>,
    scripts: ScriptEditor<FileStore>,
    media: MediaLibrary,
    gallery: Gallery,
}

impl Site {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            text: TextEditor::new(config.html_store()),
            styles: StyleEditor::new(config.css_store()),
            scripts: ScriptEditor::new(config.js_store()),
            media: config.media_library(),
            gallery: config.gallery(),
        }
    }

    /// Reads a request from `form` and handles it. Failures are reported in the outcome.
    #[must_use]
    pub fn respond(&self, form: &Form) -> Outcome {
        match Request::from_form(form).and_then(|request| self.handle(request)) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("request failed: {err:#}");
                Outcome::from_error(&err)
            }
        }
    }

    /// # Errors
    /// This function returns an error if the request cannot be carried out.
    /// A request that addresses nothing is not an error; it results in a "no match" outcome.
    pub fn handle(&self, request: Request) -> Result<Outcome> {
        Ok(match request {
            Request::ListText => {
                let texts = self.text.texts()?;
                Outcome::success(format!("Found {} text entries.", texts.len()))
                    .with_payload(to_value(&texts).context("failed to serialize text entries")?)
            }
            Request::UpdateText { path, text } => match self.text.update(&path, &text)? {
                Change::Updated => Outcome::success("Text updated successfully."),
                Change::NoMatch => {
                    Outcome::no_match("Failed to update text. XPath not found or invalid.")
                }
            },
            Request::ListRules { selected } => {
                let rules = self.styles.rules()?;
                let selected = selected
                    .filter(|selector| rules.contains_key(selector))
                    .or_else(|| rules.keys().next().cloned());

                Outcome::success(format!("Found {} CSS rules.", rules.len()))
                    .with_selected(selected)
                    .with_payload(to_value(&rules).context("failed to serialize CSS rules")?)
            }
            Request::UpdateRule {
                selector,
                declarations,
            } => {
                let outcome = match self.styles.update_rule(&selector, &declarations)? {
                    Change::Updated => Outcome::success("CSS rule updated successfully."),
                    Change::NoMatch => Outcome::no_match(format!(
                        "No CSS rule found for selector \"{selector}\"."
                    )),
                };
                outcome.with_selected(Some(selector))
            }
            Request::ListFunctions { selected } => {
                let names = self.scripts.function_names()?;
                let selected = selected
                    .filter(|name| names.contains(name))
                    .or_else(|| names.first().cloned());

                Outcome::success(format!("Found {} JS functions.", names.len()))
                    .with_selected(selected)
                    .with_payload(json!(names))
            }
            Request::FunctionContent { name } => match self.scripts.function_body(&name)? {
                Some(body) => Outcome::success(format!("Loaded function \"{name}\"."))
                    .with_selected(Some(name))
                    .with_payload(json!({ "content": body })),
                None => Outcome::no_match(format!("No JS function named \"{name}\".")),
            },
            Request::UpdateFunction { name, body } => {
                let outcome = match self.scripts.update_function(&name, &body)? {
                    Change::Updated => Outcome::success("JS function updated successfully."),
                    Change::NoMatch => {
                        Outcome::no_match(format!("No JS function named \"{name}\"."))
                    }
                };
                outcome.with_selected(Some(name))
            }
            Request::ListMedia => Outcome::success(format!(
                "Found {} media slots.",
                self.media.slots().len()
            ))
            .with_payload(to_value(self.media.slots()).context("failed to serialize media slots")?),
            Request::ReplaceMedia { key, upload } => {
                self.media.replace(&key, &upload)?;
                Outcome::success("Media replaced successfully")
            }
            Request::DeleteMedia { key } => {
                self.media.delete(&key)?;
                Outcome::success("Media deleted successfully")
            }
            Request::ListGallery => {
                let entries = self.gallery.entries()?;
                let payload = entries
                    .iter()
                    .map(|entry| -> serde_json::Result<_> {
                        let mut value = to_value(entry)?;
                        value["displayName"] = entry.display_name().into();
                        Ok(value)
                    })
                    .collect::<serde_json::Result<Vec<_>>>()
                    .context("failed to serialize gallery data")?;
                Outcome::success(format!("Found {} gallery images.", entries.len()))
                    .with_payload(payload.into())
            }
            Request::UploadImages(uploads) => {
                let report = self.gallery.upload(uploads)?;
                let outcome = if report.succeeded() {
                    Outcome::success(report.message())
                } else {
                    Outcome::new(Status::InvalidInput, report.message())
                };
                outcome.with_payload(
                    to_value(&report.stored).context("failed to serialize gallery data")?,
                )
            }
            Request::DeleteImage(ImageTarget::One(id)) => {
                let entry = self.gallery.delete(&id)?;
                Outcome::success("Image(s) deleted successfully.")
                    .with_payload(to_value(&entry).context("failed to serialize gallery data")?)
            }
            Request::DeleteImage(ImageTarget::All) => {
                let count = self.gallery.delete_all()?;
                Outcome::success("Image(s) deleted successfully.")
                    .with_payload(json!({ "deleted": count }))
            }
        })
    }
}
