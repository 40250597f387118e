use chrono::{DateTime, Utc};
use pls_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::WILDCARD_SCOPE;

/// Validates a system or permission key.
pub fn validate_key(kind: &str, value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{kind} must not be empty")));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "{kind} '{value}' must not contain whitespace"
        )));
    }

    Ok(())
}

/// Treats blank scopes as absent.
#[must_use]
pub fn normalize_scope(scope: Option<String>) -> Option<String> {
    scope
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Scope-matching law: a granted scope matches a request when it is the
/// wildcard or equal to the requested value.
#[must_use]
pub fn scope_matches(granted: &str, requested: &str) -> bool {
    granted == WILDCARD_SCOPE || granted == requested
}

/// Permission-name matching used for API tokens: exact, or a granted name
/// ending in `*` matches every requested name sharing its prefix.
#[must_use]
pub fn permission_name_matches(granted: &str, requested: &str) -> bool {
    if granted == requested {
        return true;
    }

    granted
        .strip_suffix('*')
        .is_some_and(|prefix| requested.starts_with(prefix))
}

/// Declares that a permission exists within a system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Owning system.
    pub system_id: String,
    /// Permission name.
    pub permission_id: String,
    /// Whether instances must carry a scope.
    pub has_scope: bool,
}

impl PermissionDefinition {
    /// Ensures `scope` presence agrees with `has_scope`.
    pub fn check_instance_scope(&self, scope: Option<&str>) -> AppResult<()> {
        match (self.has_scope, scope) {
            (true, None) => Err(AppError::InvariantViolation(format!(
                "permission '{}/{}' requires a scope",
                self.system_id, self.permission_id
            ))),
            (false, Some(scope)) => Err(AppError::InvariantViolation(format!(
                "permission '{}/{}' does not take a scope, got '{scope}'",
                self.system_id, self.permission_id
            ))),
            _ => Ok(()),
        }
    }
}

/// Concrete grantable `(system, permission, scope)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInstance {
    /// Stable instance id.
    pub instance_id: Uuid,
    /// Owning system.
    pub system_id: String,
    /// Permission name.
    pub permission_id: String,
    /// Optional scope; `*` matches every scope.
    pub scope: Option<String>,
}

/// Input for a new permission instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermissionInstance {
    /// Owning system.
    pub system_id: String,
    /// Permission name.
    pub permission_id: String,
    /// Normalized scope.
    pub scope: Option<String>,
}

impl NewPermissionInstance {
    /// Creates an instance input with a normalized scope.
    pub fn new(
        system_id: impl Into<String>,
        permission_id: impl Into<String>,
        scope: Option<String>,
    ) -> AppResult<Self> {
        let system_id = system_id.into();
        let permission_id = permission_id.into();
        validate_key("system id", system_id.as_str())?;
        validate_key("permission id", permission_id.as_str())?;

        Ok(Self {
            system_id,
            permission_id,
            scope: normalize_scope(scope),
        })
    }
}

/// Holder of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Grantee {
    /// A role; its authority flows to members and superroles.
    Role(String),
    /// An API token, bypassing the role graph.
    ApiToken(Uuid),
}

impl Grantee {
    /// Human readable label for messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Role(role_id) => format!("role '{role_id}'"),
            Self::ApiToken(token_id) => format!("api token '{token_id}'"),
        }
    }
}

/// Grant row as read for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    /// Role holding the grant.
    pub role_id: String,
    /// Permission name.
    pub permission_id: String,
    /// Optional scope.
    pub scope: Option<String>,
}

/// Permission instances of one role, grouped by system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPermissionInstances {
    /// System id.
    pub system_id: String,
    /// Instances ordered by permission.
    pub permissions: Vec<PermissionInstance>,
}

/// Groups instances by system, ordering by system then permission then scope.
#[must_use]
pub fn group_by_system(
    mut instances: Vec<PermissionInstance>,
) -> Vec<SystemPermissionInstances> {
    instances.sort_by(|left, right| {
        (&left.system_id, &left.permission_id, &left.scope).cmp(&(
            &right.system_id,
            &right.permission_id,
            &right.scope,
        ))
    });

    let mut grouped: Vec<SystemPermissionInstances> = Vec::new();
    for instance in instances {
        match grouped.last_mut() {
            Some(group) if group.system_id == instance.system_id => {
                group.permissions.push(instance);
            }
            _ => grouped.push(SystemPermissionInstances {
                system_id: instance.system_id.clone(),
                permissions: vec![instance],
            }),
        }
    }

    grouped
}

/// API token metadata. The secret itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiToken {
    /// Stable token id.
    pub token_id: Uuid,
    /// Free-form description.
    pub description: String,
    /// Identity that created the token.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful check, if any.
    pub last_used_at: Option<DateTime<Utc>>,
}
