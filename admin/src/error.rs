//! Failure classes that are reported back to whoever submitted a request.
//! Anything that is not one of these is treated as an I/O failure of the request.

use std::io::{self, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    /// A required resource (file, rule, entry) does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request itself is unusable: missing fields, unknown keys, disallowed file types.
    #[error("{0}")]
    InvalidInput(String),
}

impl AdminError {
    pub(crate) fn not_found(message: impl Into<String>) -> anyhow::Error {
        Self::NotFound(message.into()).into()
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> anyhow::Error {
        Self::InvalidInput(message.into()).into()
    }
}

/// Returns `true` if any cause in the error chain is an I/O error for a missing file.
pub(crate) fn is_missing_file(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|cause| cause.kind() == ErrorKind::NotFound)
}
