//! Store error taxonomy.

use moviedeck_api::backend::{BackendError, FieldErrors, ValidationError};

/// Failure returned by every store operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum StoreError {
    /// Input rejected before reaching the store.
    #[error("{0}")]
    Validation(String),
    /// No session token.
    #[error("Not authenticated")]
    AuthenticationRequired,
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    RemoteRequestFailed {
        /// HTTP status code.
        status: u16,
        /// User-facing message.
        message: String,
        /// Field-level validation messages.
        errors: Option<FieldErrors>,
    },
    /// The backend rejected the token while refreshing the profile.
    #[error("Session expired, please sign in again.")]
    SessionExpired,
    /// The request never produced a usable response.
    #[error("Network error: {0}")]
    NetworkFault(String),
    /// No cached profile to answer from.
    #[error("No user data found")]
    NoData,
    /// Local storage read or write failed.
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    /// Translates a backend failure of the operation named `context`
    /// (`Login`, `Registration`, ...).
    ///
    /// A non-2xx status without a `message` becomes `"<context> failed (<status>)"`.
    pub(crate) fn from_backend(err: BackendError, context: &str) -> Self {
        match err {
            BackendError::Status {
                status,
                message,
                errors,
                ..
            } => Self::RemoteRequestFailed {
                status,
                message: message.unwrap_or_else(|| format!("{context} failed ({status})")),
                errors,
            },
            BackendError::MissingUser => Self::NoData,
            other => Self::NetworkFault(other.to_string()),
        }
    }

    /// Translates a failed my-list mutation. Status failures carry the raw
    /// body: `"Add failed: 500 <body>"`.
    pub(crate) fn rejected_mutation(err: BackendError, context: &str) -> Self {
        match err {
            BackendError::Status { status, body, .. } => Self::RemoteRequestFailed {
                status,
                message: format!("{context}: {status} {body}"),
                errors: None,
            },
            other => Self::from_backend(other, context),
        }
    }

    /// Wraps a storage-layer failure.
    pub(crate) fn storage(err: &anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }

    /// Field-level validation messages of a rejected registration.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::RemoteRequestFailed {
                errors: Some(errors),
                ..
            } => Some(errors),
            _ => None,
        }
    }

    /// HTTP status of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn status(status: u16, message: Option<&str>, body: &str) -> BackendError {
        BackendError::Status {
            status,
            message: message.map(String::from),
            errors: None,
            body: String::from(body),
        }
    }

    #[test]
    fn test_from_backend_uses_server_message() {
        // Arrange
        let err = status(401, Some("Invalid credentials"), "{}");

        // Act
        let store_err = StoreError::from_backend(err, "Login");

        // Assert
        assert_eq!(store_err.to_string(), "Invalid credentials");
        assert_eq!(store_err.status(), Some(401));
    }

    #[test]
    fn test_from_backend_falls_back_to_status_message() {
        // Arrange
        let err = status(500, None, "<html>oops</html>");

        // Act
        let store_err = StoreError::from_backend(err, "Registration");

        // Assert
        assert_eq!(store_err.to_string(), "Registration failed (500)");
    }

    #[test]
    fn test_missing_user_is_no_data() {
        // Arrange & Act
        let store_err = StoreError::from_backend(BackendError::MissingUser, "Refresh");

        // Assert
        assert_eq!(store_err, StoreError::NoData);
        assert_eq!(store_err.to_string(), "No user data found");
    }

    #[test]
    fn test_rejected_mutation_includes_body() {
        // Arrange
        let err = status(422, Some("ignored"), "duplicate");

        // Act
        let store_err = StoreError::rejected_mutation(err, "Add failed");

        // Assert
        assert_eq!(store_err.to_string(), "Add failed: 422 duplicate");
    }

    #[test]
    fn test_field_errors_exposed() {
        // Arrange
        let mut errors = FieldErrors::new();
        errors.insert(
            String::from("email"),
            vec![String::from("The email has already been taken.")],
        );
        let store_err = StoreError::RemoteRequestFailed {
            status: 422,
            message: String::from("The given data was invalid."),
            errors: Some(errors),
        };

        // Act
        let fields = store_err.field_errors().unwrap();

        // Assert
        assert_eq!(fields["email"], vec!["The email has already been taken."]);
    }

    #[test]
    fn test_validation_error_converts() {
        // Arrange & Act
        let store_err = StoreError::from(ValidationError::PasswordMismatch);

        // Assert
        assert_eq!(store_err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_storage_keeps_context_chain() {
        // Arrange
        let err = anyhow::anyhow!("disk full").context("failed to write key: user");

        // Act
        let store_err = StoreError::storage(&err);

        // Assert
        assert_eq!(
            store_err.to_string(),
            "Storage failure: failed to write key: user: disk full"
        );
    }
}
