//! Typed error types for the ratewise-core service layer.

use thiserror::Error;

use crate::store::{RemoteError, RemoteErrorKind};

/// Result type alias for core service operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the ratewise-core service layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No signed-in user for an operation that needs one.
    #[error("Not authenticated. Sign in or pass --user first.")]
    NotAuthenticated,

    /// A review is not in the loaded list (or no longer exists remotely).
    #[error("Review not found: {review_id}")]
    ReviewNotFound { review_id: String },

    /// A company slug matched nothing.
    #[error("Company not found: {slug}")]
    CompanyNotFound { slug: String },

    /// A required field was empty or null.
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A field value is outside its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// A referenced row (company, review, parent comment) does not exist.
    #[error("Invalid reference: {detail}")]
    InvalidReference { detail: String },

    /// The backend or a local identity check rejected the caller.
    #[error("Permission denied: {detail}")]
    PermissionDenied { detail: String },

    /// A backend table has not been set up.
    #[error("Table '{table}' is missing. Run 'ratewise init' first.")]
    TableMissing { table: String },

    /// Any other remote failure.
    #[error("Failed to {operation}: {message}")]
    Remote { operation: String, message: String },

    /// Profile fields failed validation; one message per violation.
    #[error("Invalid profile: {}", .0.join("; "))]
    InvalidProfile(Vec<String>),
}

impl CoreError {
    /// Map a remote failure of `operation` (e.g., "add review") to a typed error.
    pub(crate) fn from_remote(operation: &str, err: RemoteError) -> Self {
        match err.kind {
            RemoteErrorKind::NotNullViolation => Self::MissingRequiredField {
                field: err.details.unwrap_or(err.message),
            },
            RemoteErrorKind::ForeignKeyViolation => Self::InvalidReference {
                detail: format!("{operation}: {}", err.message),
            },
            RemoteErrorKind::CheckViolation => Self::InvalidValue {
                field: err.details.unwrap_or_else(|| "value".to_string()),
                reason: err.message,
            },
            RemoteErrorKind::PermissionDenied => Self::PermissionDenied {
                detail: err.message,
            },
            RemoteErrorKind::MissingTable => Self::TableMissing {
                table: err.details.unwrap_or(err.message),
            },
            RemoteErrorKind::UniqueViolation
            | RemoteErrorKind::NotFound
            | RemoteErrorKind::Other => Self::Remote {
                operation: operation.to_string(),
                message: err.message,
            },
        }
    }

    /// Short machine-readable kind, used in CLI JSON error output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::ReviewNotFound { .. } | Self::CompanyNotFound { .. } => "not_found",
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::InvalidValue { .. } => "invalid_value",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::TableMissing { .. } => "table_missing",
            Self::Remote { .. } => "remote_error",
            Self::InvalidProfile(_) => "invalid_profile",
        }
    }
}
