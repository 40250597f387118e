use std::str::FromStr;

use pls_core::AppError;
use serde::{Deserialize, Serialize};

/// System id under which the service manages its own authorization.
pub const PLS_SYSTEM: &str = "pls";

/// Scope value granting a permission for every possible scope.
pub const WILDCARD_SCOPE: &str = "*";

/// Role created for the configured bootstrap administrator.
pub const BOOTSTRAP_ADMIN_ROLE: &str = "pls-admin";

/// Permissions of the `pls` system, enforced by the service on itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfPermission {
    /// Scoped by role id: edit a role, its members and subroles.
    Role,
    /// Create new roles; combined with `Role` it also allows deletion.
    CreateRole,
    /// Scoped by system id: manage definitions and grants of that system.
    System,
    /// Create and delete systems.
    ManageSystems,
}

impl SelfPermission {
    /// Returns the stored permission id.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::CreateRole => "create-role",
            Self::System => "system",
            Self::ManageSystems => "manage-systems",
        }
    }

    /// Returns whether grants of this permission carry a scope.
    #[must_use]
    pub fn has_scope(&self) -> bool {
        matches!(self, Self::Role | Self::System)
    }

    /// Returns all self permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SelfPermission] = &[
            SelfPermission::Role,
            SelfPermission::CreateRole,
            SelfPermission::System,
            SelfPermission::ManageSystems,
        ];

        ALL
    }
}

impl FromStr for SelfPermission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "role" => Ok(Self::Role),
            "create-role" => Ok(Self::CreateRole),
            "system" => Ok(Self::System),
            "manage-systems" => Ok(Self::ManageSystems),
            _ => Err(AppError::Validation(format!(
                "unknown pls permission '{value}'"
            ))),
        }
    }
}
