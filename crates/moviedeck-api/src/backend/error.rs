//! Backend error type.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;

/// Field-level validation messages (`{"email": ["already taken"]}`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Error returned by backend calls.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum BackendError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// `message` field of a JSON error body.
        message: Option<String>,
        /// `errors` field of a JSON error body.
        errors: Option<FieldErrors>,
        /// Raw response body.
        body: String,
    },
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// An endpoint URL could not be built.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    /// No locally cached user to answer from.
    #[error("no cached user data")]
    MissingUser,
}

impl BackendError {
    /// Builds a `Status` error, extracting `message` and `errors` from a JSON body.
    pub(crate) fn from_response(status: StatusCode, body: String) -> Self {
        let parsed = serde_json::from_str::<Value>(&body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(String::from);
        let errors = parsed
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(|v| serde_json::from_value::<FieldErrors>(v.clone()).ok());

        Self::Status {
            status: status.as_u16(),
            message,
            errors,
            body,
        }
    }

    /// HTTP status for `Status` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the bearer token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }
}
