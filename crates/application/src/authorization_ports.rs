use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pls_core::AppResult;
use pls_domain::{GrantedPermission, RoleEdge, RoleGrant};

/// Role graph inputs for one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleInputs {
    /// Roles held through at least one active membership.
    pub direct_roles: Vec<String>,
    /// Complete superrole/subrole edge set.
    pub role_edges: Vec<RoleEdge>,
}

/// Everything the resolver needs for one identity and system, read from one
/// consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionInputs {
    /// Directly held roles and the edge set.
    pub roles: RoleInputs,
    /// Every role grant within the requested system.
    pub grants: Vec<RoleGrant>,
}

/// Grants of one API token within one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTokenGrants {
    /// Token id, used for last-used bookkeeping.
    pub token_id: Uuid,
    /// Granted pairs within the requested system.
    pub grants: Vec<GrantedPermission>,
}

/// Read port used by the resolver.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Loads the identity's directly held roles at `at` and the role edge set.
    async fn load_role_inputs(&self, identity: &str, at: DateTime<Utc>) -> AppResult<RoleInputs>;

    /// Loads role inputs and all role grants of `system_id` from one snapshot.
    async fn load_resolution_inputs(
        &self,
        identity: &str,
        system_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ResolutionInputs>;

    /// Finds a token by secret hash and returns its grants within `system_id`.
    async fn find_api_token_grants(
        &self,
        secret_hash: &str,
        system_id: &str,
    ) -> AppResult<Option<ApiTokenGrants>>;

    /// Records a successful token check.
    async fn record_api_token_use(&self, token_id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}
