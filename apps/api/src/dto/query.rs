use pls_domain::PermissionScopes;
use serde::{Deserialize, Serialize};

/// Identity, system and permission triple used by check and scope queries.
#[derive(Debug, Deserialize)]
pub struct UserPermissionRequest {
    pub identity: String,
    pub system: String,
    pub permission: String,
}

/// Identity and system pair used by listings.
#[derive(Debug, Deserialize)]
pub struct UserSystemRequest {
    pub identity: String,
    pub system: String,
}

/// Candidate permissions to reduce to the held subset.
#[derive(Debug, Deserialize)]
pub struct FilterPermissionsRequest {
    pub identity: String,
    pub system: String,
    pub permissions: Vec<String>,
}

/// Raw token secret plus the permission it should grant.
#[derive(Debug, Deserialize)]
pub struct TokenCheckRequest {
    pub token: String,
    pub system: String,
    pub permission: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub struct ScopesResponse {
    pub scopes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FilterPermissionsResponse {
    pub permissions: Vec<String>,
}

/// One held permission with its scopes.
#[derive(Debug, Serialize)]
pub struct PermissionScopesResponse {
    pub permission: String,
    pub scopes: Vec<String>,
}

impl From<PermissionScopes> for PermissionScopesResponse {
    fn from(value: PermissionScopes) -> Self {
        Self {
            permission: value.permission_id,
            scopes: value.scopes,
        }
    }
}
