use pls_domain::PermissionDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateSystemRequest {
    pub system_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionDefinitionRequest {
    pub permission_id: String,
    #[serde(default)]
    pub has_scope: bool,
}

/// Scope assigned to existing unscoped instances when a permission becomes
/// scoped.
#[derive(Debug, Deserialize)]
pub struct AddScopeRequest {
    pub default_scope: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionDefinitionResponse {
    pub system_id: String,
    pub permission_id: String,
    pub has_scope: bool,
}

impl From<PermissionDefinition> for PermissionDefinitionResponse {
    fn from(value: PermissionDefinition) -> Self {
        Self {
            system_id: value.system_id,
            permission_id: value.permission_id,
            has_scope: value.has_scope,
        }
    }
}
