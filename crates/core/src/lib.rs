//! Shared primitives for all Rust crates in pls.

#![forbid(unsafe_code)]

/// Acting-identity primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::Principal;

/// Result type used across pls crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A permission instance disagrees with its permission definition.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No acting identity was supplied.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Actor lacks the permission or scope required by the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The backing store could not be reached or the transaction failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the caller may retry the operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn only_store_failures_are_retryable() {
        assert!(AppError::StoreUnavailable("connection reset".to_owned()).is_retryable());
        assert!(!AppError::Conflict("members".to_owned()).is_retryable());
        assert!(!AppError::Forbidden("denied".to_owned()).is_retryable());
    }
}
