//! Utilities shared between all crates in this workspace.

mod escape;
mod store;

pub use escape::{add_slashes, escape_html, strip_slashes};
pub use store::{move_file, write_atomic, FileStore, Store};
