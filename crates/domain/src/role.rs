use pls_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Validates a stable role key.
///
/// Role ids are external slugs: non-empty, no whitespace, and never the
/// wildcard scope value.
pub fn validate_role_id(value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Validation("role id must not be empty".to_owned()));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "role id '{value}' must not contain whitespace"
        )));
    }

    if value == crate::WILDCARD_SCOPE {
        return Err(AppError::Validation(
            "role id must not be the wildcard '*'".to_owned(),
        ));
    }

    Ok(())
}

/// Named node in the authorization graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    role_id: String,
    display_name: NonEmptyString,
    description: String,
}

impl Role {
    /// Creates a validated role.
    pub fn new(
        role_id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> AppResult<Self> {
        let role_id = role_id.into();
        validate_role_id(role_id.as_str())?;

        Ok(Self {
            role_id,
            display_name: NonEmptyString::new(display_name)?,
            description: description.into(),
        })
    }

    /// Returns the stable role key.
    #[must_use]
    pub fn role_id(&self) -> &str {
        self.role_id.as_str()
    }

    /// Returns the human readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the free-form description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Applies a partial update, leaving absent fields unchanged.
    pub fn apply(&self, update: &RoleUpdate) -> AppResult<Self> {
        let display_name = match &update.display_name {
            Some(value) => NonEmptyString::new(value.clone())?,
            None => self.display_name.clone(),
        };
        let description = update
            .description
            .clone()
            .unwrap_or_else(|| self.description.clone());

        Ok(Self {
            role_id: self.role_id.clone(),
            display_name,
            description,
        })
    }
}

/// Partial role update.
///
/// `None` leaves the field unchanged; `Some` replaces it, including with an
/// empty description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    /// Replacement display name.
    pub display_name: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
}

impl RoleUpdate {
    /// Returns whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.description.is_none()
    }
}

/// Directed edge: members of `subrole_id` inherit every grant of `superrole_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleEdge {
    /// Role whose grants flow down.
    pub superrole_id: String,
    /// Role that belongs under the superrole.
    pub subrole_id: String,
}

impl RoleEdge {
    /// Creates an edge between two role ids.
    #[must_use]
    pub fn new(superrole_id: impl Into<String>, subrole_id: impl Into<String>) -> Self {
        Self {
            superrole_id: superrole_id.into(),
            subrole_id: subrole_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RoleUpdate, validate_role_id};

    #[test]
    fn role_id_rejects_whitespace_and_wildcard() {
        assert!(validate_role_id("d-sys").is_ok());
        assert!(validate_role_id("d sys").is_err());
        assert!(validate_role_id("*").is_err());
        assert!(validate_role_id("").is_err());
    }

    #[test]
    fn apply_distinguishes_absent_from_empty() {
        let Ok(role) = Role::new("dfunk", "DFunk", "Funktionärer") else {
            panic!("valid role must construct");
        };

        let unchanged = role.apply(&RoleUpdate::default());
        assert_eq!(unchanged.ok().as_ref(), Some(&role));

        let cleared = role.apply(&RoleUpdate {
            display_name: None,
            description: Some(String::new()),
        });
        let Ok(cleared) = cleared else {
            panic!("clearing the description must succeed");
        };
        assert_eq!(cleared.description(), "");
        assert_eq!(cleared.display_name(), "DFunk");
    }

    #[test]
    fn apply_rejects_blank_display_name() {
        let Ok(role) = Role::new("dfunk", "DFunk", "") else {
            panic!("valid role must construct");
        };
        let result = role.apply(&RoleUpdate {
            display_name: Some("  ".to_owned()),
            description: None,
        });
        assert!(result.is_err());
    }
}
