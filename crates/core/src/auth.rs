use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// External identity performing an operation.
///
/// The service never authenticates callers itself; the string is supplied by
/// the login collaborator in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    subject: String,
}

impl Principal {
    /// Creates a principal from a non-blank identity string.
    pub fn new(subject: impl Into<String>) -> AppResult<Self> {
        let subject = subject.into();
        let trimmed = subject.trim();
        if trimmed.is_empty() {
            return Err(AppError::Unauthorized(
                "acting identity must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            subject: trimmed.to_owned(),
        })
    }

    /// Returns the external identity string.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::Principal;

    #[test]
    fn principal_trims_surrounding_whitespace() {
        let principal = Principal::new("  turetek ");
        assert!(principal.is_ok());
        assert_eq!(
            principal.map(|value| value.subject().to_owned()).ok(),
            Some("turetek".to_owned())
        );
    }

    #[test]
    fn blank_principal_is_unauthorized() {
        assert!(matches!(
            Principal::new(""),
            Err(crate::AppError::Unauthorized(_))
        ));
    }
}
