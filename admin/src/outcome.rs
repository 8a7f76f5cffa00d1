//! The response sent back for every request, successful or not.

use crate::{error::is_missing_file, AdminError};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    /// The request was valid but addressed nothing; no file was changed.
    NoMatch,
    NotFound,
    InvalidInput,
    IoFailure,
}

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Outcome {
    #[must_use]
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            success: status == Status::Success,
            status,
            message: message.into(),
            selected: None,
            payload: None,
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Status::Success, message)
    }

    #[must_use]
    pub fn no_match(message: impl Into<String>) -> Self {
        Self::new(Status::NoMatch, message)
    }

    /// Classifies a failed request. The message includes every cause in the chain.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        let status = match err.downcast_ref::<AdminError>() {
            Some(AdminError::NotFound(_)) => Status::NotFound,
            Some(AdminError::InvalidInput(_)) => Status::InvalidInput,
            None if is_missing_file(err) => Status::NotFound,
            None => Status::IoFailure,
        };

        Self::new(status, format!("{err:#}"))
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_selected(mut self, selected: Option<String>) -> Self {
        self.selected = selected;
        self
    }
}
