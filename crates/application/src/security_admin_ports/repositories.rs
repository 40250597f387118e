use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pls_core::AppResult;
use pls_domain::{
    ApiToken, Grantee, Membership, MembershipUpdate, NewPermissionInstance, PermissionDefinition,
    PermissionInstance, Role, RoleEdge, RoleUpdate,
};

use super::members::NewMembership;
use super::roles::{AdministratorBootstrap, RoleOverview};

/// Repository port for roles and the role graph.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists every role ordered by display name.
    async fn list_roles(&self, at: DateTime<Utc>) -> AppResult<Vec<RoleOverview>>;

    /// Finds one role.
    async fn find_role(&self, role_id: &str, at: DateTime<Utc>)
    -> AppResult<Option<RoleOverview>>;

    /// Lists every role id.
    async fn list_role_ids(&self) -> AppResult<Vec<String>>;

    /// Atomically inserts the role, its `pls/role` instance and the grant of
    /// that instance to `owner_role_id`.
    async fn create_role(&self, role: &Role, owner_role_id: &str) -> AppResult<()>;

    /// Applies a partial update and returns the stored role.
    async fn update_role(&self, role_id: &str, update: &RoleUpdate) -> AppResult<Role>;

    /// Removes the role's superrole edges, the role and its `pls/role`
    /// instance. Remaining dependents surface as `Conflict`.
    async fn delete_role(&self, role_id: &str) -> AppResult<()>;

    /// Lists direct subroles of a role.
    async fn list_subroles(&self, role_id: &str, at: DateTime<Utc>)
    -> AppResult<Vec<RoleOverview>>;

    /// Lists the complete edge set.
    async fn list_role_edges(&self) -> AppResult<Vec<RoleEdge>>;

    /// Inserts an edge; idempotent. Missing roles surface as `NotFound`.
    async fn add_subrole(&self, edge: &RoleEdge) -> AppResult<()>;

    /// Removes an edge; `NotFound` when absent.
    async fn remove_subrole(&self, edge: &RoleEdge) -> AppResult<()>;

    /// Seeds the administrator role, its grants and membership. Returns
    /// whether a membership row was added.
    async fn ensure_administrator(&self, input: &AdministratorBootstrap) -> AppResult<bool>;
}

/// Repository port for the membership ledger.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Inserts a membership row.
    async fn add_membership(
        &self,
        input: NewMembership,
        at: DateTime<Utc>,
    ) -> AppResult<Membership>;

    /// Applies a partial window update to a row of `role_id`.
    async fn update_membership(
        &self,
        role_id: &str,
        membership_id: Uuid,
        update: &MembershipUpdate,
        modified_by: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Membership>;

    /// Deletes a row of `role_id`.
    async fn remove_membership(&self, role_id: &str, membership_id: Uuid) -> AppResult<()>;

    /// Lists every row, expired or not, of the given roles.
    async fn list_memberships(&self, role_ids: &[String]) -> AppResult<Vec<Membership>>;
}

/// Repository port for systems, permission definitions, instances and grants.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Lists system ids.
    async fn list_systems(&self) -> AppResult<Vec<String>>;

    /// Creates a system.
    async fn create_system(&self, system_id: &str) -> AppResult<()>;

    /// Deletes a system without permission definitions.
    async fn delete_system(&self, system_id: &str) -> AppResult<()>;

    /// Lists definitions of one system.
    async fn list_permission_definitions(
        &self,
        system_id: &str,
    ) -> AppResult<Vec<PermissionDefinition>>;

    /// Creates a definition.
    async fn create_permission_definition(&self, definition: &PermissionDefinition)
    -> AppResult<()>;

    /// Deletes a definition together with its instances and their grants.
    async fn delete_permission_definition(
        &self,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<()>;

    /// Toggles `has_scope`. `Some(default)` marks the permission scoped and
    /// sets every instance scope to `default`; `None` marks it unscoped and
    /// merges its instances into one unscoped instance.
    async fn set_permission_scope(
        &self,
        system_id: &str,
        permission_id: &str,
        default_scope: Option<&str>,
    ) -> AppResult<()>;

    /// Atomically finds or creates the instance and grants it to `grantee`.
    async fn create_granted_instance(
        &self,
        instance: &NewPermissionInstance,
        grantee: &Grantee,
    ) -> AppResult<PermissionInstance>;

    /// Grants an existing instance; idempotent.
    async fn grant_instance(&self, instance_id: Uuid, grantee: &Grantee) -> AppResult<()>;

    /// Removes one grant; the instance is deleted once no grant remains.
    async fn ungrant_instance(&self, instance_id: Uuid, grantee: &Grantee) -> AppResult<()>;

    /// Finds one instance.
    async fn find_permission_instance(
        &self,
        instance_id: Uuid,
    ) -> AppResult<Option<PermissionInstance>>;

    /// Deletes the instance and every grant referencing it.
    async fn revoke_permission_instance(&self, instance_id: Uuid) -> AppResult<()>;

    /// Lists instances granted to one grantee.
    async fn list_grants(&self, grantee: &Grantee) -> AppResult<Vec<PermissionInstance>>;
}

/// Repository port for API tokens.
#[async_trait]
pub trait ApiTokenRepository: Send + Sync {
    /// Stores a token by its secret hash.
    async fn create_api_token(
        &self,
        secret_hash: &str,
        description: &str,
        created_by: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ApiToken>;

    /// Lists tokens ordered by creation time.
    async fn list_api_tokens(&self) -> AppResult<Vec<ApiToken>>;

    /// Deletes a token and its grants.
    async fn delete_api_token(&self, token_id: Uuid) -> AppResult<()>;
}
