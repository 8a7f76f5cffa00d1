mod config;
mod document;
mod error;
mod gallery;
mod media;
mod outcome;
mod path;
mod request;
mod rules;
mod script;
mod site;
mod stylesheet;

pub use config::Config;
pub use document::{Document, TextEditor};
pub use error::AdminError;
pub use gallery::{sanitize_file_name, Gallery, GalleryEntry, Upload, UploadReport};
pub use media::{default_slots, MediaLibrary, DEFAULT_SLOTS};
pub use outcome::{Outcome, Status};
pub use path::{Discriminator, NodePath, PathParseError, PathSegment};
pub use request::{Form, ImageTarget, Request};
pub use rules::{blocks, Block};
pub use script::{
    function_body, function_names, render_function, replace_function, ScriptEditor,
};
pub use site::Site;
pub use stylesheet::{
    parse_declarations, parse_rules, render_rule, replace_rule, selectors, Declarations,
    StyleEditor,
};

/// Whether an edit found its target. An edit without a target leaves the file untouched.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    Updated,
    NoMatch,
}
