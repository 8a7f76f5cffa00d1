//! Code for turning submitted form fields into typed requests.

use crate::{AdminError, Declarations, NodePath, Upload};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;

/// Named form fields in submission order. A name may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(String, String)>,
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads command-line arguments: the action name followed by `name=value` fields.
    ///
    /// # Errors
    /// This function returns an error if the action is missing or a field has no `=`.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut form = Self::new();

        let action = args
            .next()
            .ok_or_else(|| AdminError::invalid_input("Action not specified"))?;
        form.push("action", action);

        for arg in args {
            let (name, value) = arg.split_once('=').ok_or_else(|| {
                AdminError::invalid_input(format!("expected a `name=value` field, found \"{arg}\""))
            })?;
            form.push(name, value);
        }

        Ok(form)
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Returns the first value submitted under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every value submitted under `name`, in order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// # Errors
    /// This function returns an error if no value was submitted under `name`.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| AdminError::invalid_input(format!("Missing field `{name}`")))
    }

    /// Collects fields named `prefix[key]` into a key → value table, in submission order.
    #[must_use]
    pub fn keyed(&self, prefix: &str) -> Declarations {
        self.fields
            .iter()
            .filter_map(|(field, value)| {
                let key = field.strip_prefix(prefix)?.strip_prefix('[')?.strip_suffix(']')?;
                (!key.is_empty()).then(|| (key.to_owned(), value.clone()))
            })
            .collect()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Form {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (name, value) in iter {
            form.push(name, value);
        }
        form
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageTarget {
    One(String),
    All,
}

pub enum Request {
    ListText,
    UpdateText {
        path: NodePath,
        text: String,
    },
    /// `selected` is the rule the client had open, echoed back so it can stay open
    ListRules {
        selected: Option<String>,
    },
    UpdateRule {
        selector: String,
        declarations: Declarations,
    },
    ListFunctions {
        selected: Option<String>,
    },
    FunctionContent {
        name: String,
    },
    UpdateFunction {
        name: String,
        body: String,
    },
    ListMedia,
    ReplaceMedia {
        key: String,
        upload: Utf8PathBuf,
    },
    DeleteMedia {
        key: String,
    },
    ListGallery,
    UploadImages(Vec<Upload>),
    DeleteImage(ImageTarget),
}

impl Request {
    /// Reads a request from form fields. The `action` field selects the request type.
    ///
    /// # Errors
    /// This function returns an error if the action is missing or unknown,
    /// or if a field required by the action is missing or invalid.
    pub fn from_form(form: &Form) -> Result<Self> {
        let selected = || form.get("selected").map(Into::into);

        Ok(match form.require("action")? {
            "list_text" => Self::ListText,
            "update_text" => Self::UpdateText {
                path: form
                    .require("xpath")?
                    .parse()
                    .map_err(|err| AdminError::invalid_input(format!("Invalid path: {err}")))?,
                text: form.require("new_text")?.into(),
            },
            "list_rules" => Self::ListRules {
                selected: selected(),
            },
            "update_rule" => Self::UpdateRule {
                selector: form.require("selector")?.into(),
                declarations: form.keyed("properties"),
            },
            "list_functions" => Self::ListFunctions {
                selected: selected(),
            },
            "function_content" => Self::FunctionContent {
                name: form.require("function_name")?.into(),
            },
            "update_function" => {
                let name = form.require("function_name")?;
                let body = form.require("function_content")?;
                if body.trim().is_empty() {
                    return Err(AdminError::invalid_input("Function content cannot be empty."));
                }
                Self::UpdateFunction {
                    name: name.into(),
                    body: body.into(),
                }
            }
            "list_media" => Self::ListMedia,
            "replace_media" => Self::ReplaceMedia {
                key: form
                    .get("key")
                    .ok_or_else(|| AdminError::invalid_input("Missing key or new media file"))?
                    .into(),
                upload: form
                    .get("new_media")
                    .ok_or_else(|| AdminError::invalid_input("Missing key or new media file"))?
                    .into(),
            },
            "delete_media" => Self::DeleteMedia {
                key: form
                    .get("key")
                    .ok_or_else(|| AdminError::invalid_input("Missing key for deletion"))?
                    .into(),
            },
            "list_gallery" => Self::ListGallery,
            "upload_images" => Self::UploadImages(uploads(form).context("invalid upload")?),
            "delete_image" => Self::DeleteImage(match form.require("delete")? {
                "all" => ImageTarget::All,
                id => ImageTarget::One(id.into()),
            }),
            action => {
                return Err(AdminError::invalid_input(format!(
                    "Invalid action specified: {action}"
                )))
            }
        })
    }
}

/// Pairs each `images[]` file with the `imageNames[]` and `imageDescriptions[]` values
/// at the same position.
fn uploads(form: &Form) -> Result<Vec<Upload>> {
    let mut names = form.all("imageNames[]");
    let mut descriptions = form.all("imageDescriptions[]");

    let uploads: Vec<_> = form
        .all("images[]")
        .map(|source| Upload {
            custom_name: names.next().unwrap_or_default().into(),
            description: descriptions.next().unwrap_or_default().into(),
            ..Upload::from_path(source)
        })
        .collect();

    if uploads.is_empty() {
        return Err(AdminError::invalid_input("No images were uploaded"));
    }

    Ok(uploads)
}

#[cfg(test)]
mod test {
    use super::{Form, ImageTarget, Request};
    use crate::AdminError;

    fn form<const N: usize>(fields: [(&str, &str); N]) -> Form {
        fields.into_iter().collect()
    }

    fn invalid_input_message(form: &Form) -> String {
        let Err(err) = Request::from_form(form) else {
            panic!("request should be rejected");
        };
        match err.downcast_ref::<AdminError>() {
            Some(AdminError::InvalidInput(message)) => message.clone(),
            _ => panic!("error should be classified as invalid input: {err:#}"),
        }
    }

    #[test]
    fn from_args() {
        let form = Form::from_args(
            ["update_text", "xpath=/div[@id='x']/p", "new_text=a = b"].map(String::from),
        )
        .expect("arguments should be accepted");

        assert_eq!(form.get("action"), Some("update_text"));
        assert_eq!(form.get("xpath"), Some("/div[@id='x']/p"));
        // Only the first `=` separates name and value
        assert_eq!(form.get("new_text"), Some("a = b"));

        assert!(Form::from_args(Vec::new()).is_err());
        assert!(Form::from_args(["list_text", "oops"].map(String::from)).is_err());
    }

    #[test]
    fn keyed_fields() {
        let form = form([
            ("selector", "a"),
            ("properties[color]", "blue"),
            ("properties[font-size]", "12px"),
            ("properties[]", "ignored"),
            ("other[color]", "ignored"),
        ]);

        let properties = form.keyed("properties");
        assert_eq!(
            properties.iter().collect::<Vec<_>>(),
            [
                (&"color".to_owned(), &"blue".to_owned()),
                (&"font-size".to_owned(), &"12px".to_owned())
            ]
        );
    }

    #[test]
    fn update_text() {
        let request = Request::from_form(&form([
            ("action", "update_text"),
            ("xpath", "/div[@id='x']/p"),
            ("new_text", "Hi"),
        ]))
        .expect("request should be accepted");

        let Request::UpdateText { path, text } = request else {
            panic!("request should be a text update");
        };
        assert_eq!(path.to_string(), "/div[@id='x']/p");
        assert_eq!(text, "Hi");

        assert!(invalid_input_message(&form([
            ("action", "update_text"),
            ("xpath", "div"),
            ("new_text", "Hi"),
        ]))
        .starts_with("Invalid path"));
        assert_eq!(
            invalid_input_message(&form([("action", "update_text"), ("xpath", "/p")])),
            "Missing field `new_text`"
        );
    }

    #[test]
    fn selection_round_trip() {
        let Ok(Request::ListRules { selected }) =
            Request::from_form(&form([("action", "list_rules"), ("selected", ".hero")]))
        else {
            panic!("request should list rules");
        };
        assert_eq!(selected.as_deref(), Some(".hero"));

        let Ok(Request::ListFunctions { selected }) =
            Request::from_form(&form([("action", "list_functions")]))
        else {
            panic!("request should list functions");
        };
        assert_eq!(selected, None);
    }

    #[test]
    fn empty_function_body() {
        assert_eq!(
            invalid_input_message(&form([
                ("action", "update_function"),
                ("function_name", "foo"),
                ("function_content", "  \n "),
            ])),
            "Function content cannot be empty."
        );
    }

    #[test]
    fn uploads() {
        let Ok(Request::UploadImages(uploads)) = Request::from_form(&form([
            ("action", "upload_images"),
            ("images[]", "/tmp/a.png"),
            ("imageNames[]", "First"),
            ("imageDescriptions[]", "First image"),
            ("images[]", "/tmp/b.jpg"),
        ])) else {
            panic!("request should upload images");
        };

        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].name, "a.png");
        assert_eq!(uploads[0].custom_name, "First");
        assert_eq!(uploads[0].description, "First image");
        assert_eq!(uploads[1].source, "/tmp/b.jpg");
        assert_eq!(uploads[1].custom_name, "");

        assert!(Request::from_form(&form([("action", "upload_images")])).is_err());
    }

    #[test]
    fn delete_targets() {
        let Ok(Request::DeleteImage(target)) =
            Request::from_form(&form([("action", "delete_image"), ("delete", "all")]))
        else {
            panic!("request should delete images");
        };
        assert_eq!(target, ImageTarget::All);

        let Ok(Request::DeleteImage(target)) =
            Request::from_form(&form([("action", "delete_image"), ("delete", "65f1c0a2")]))
        else {
            panic!("request should delete an image");
        };
        assert_eq!(target, ImageTarget::One("65f1c0a2".into()));
    }

    #[test]
    fn unknown_action() {
        assert_eq!(
            invalid_input_message(&form([("action", "format_disk")])),
            "Invalid action specified: format_disk"
        );
        assert_eq!(
            invalid_input_message(&Form::new()),
            "Missing field `action`"
        );
        assert_eq!(
            invalid_input_message(&form([("action", "replace_media"), ("key", "hero")])),
            "Missing key or new media file"
        );
    }
}
