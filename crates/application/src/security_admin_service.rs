use std::sync::Arc;

use pls_core::{AppError, AppResult, Principal};
use pls_domain::{ApiToken, PermissionInstance, SelfPermission};
use uuid::Uuid;

use crate::{
    ApiTokenRepository, AuthorizationService, MembershipRepository, PermissionRepository,
    RoleRepository,
};

mod api_tokens;
mod bootstrap;
mod members;
mod permissions;
mod roles;
mod subroles;
mod systems;


/// Newly created API token with its one-time secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedApiToken {
    /// Stored token metadata.
    pub token: ApiToken,
    /// Raw secret. Only its hash is stored, so it cannot be shown again.
    pub secret: String,
}

/// Application service for every authorization mutation.
///
/// Each operation authorizes the actor through the resolver before touching
/// storage and fails with `Forbidden` when the actor lacks authority.
#[derive(Clone)]
pub struct SecurityAdminService {
    authorization_service: AuthorizationService,
    roles: Arc<dyn RoleRepository>,
    memberships: Arc<dyn MembershipRepository>,
    permissions: Arc<dyn PermissionRepository>,
    api_tokens: Arc<dyn ApiTokenRepository>,
}

impl SecurityAdminService {
    /// Creates a security admin service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        roles: Arc<dyn RoleRepository>,
        memberships: Arc<dyn MembershipRepository>,
        permissions: Arc<dyn PermissionRepository>,
        api_tokens: Arc<dyn ApiTokenRepository>,
    ) -> Self {
        Self {
            authorization_service,
            roles,
            memberships,
            permissions,
            api_tokens,
        }
    }

    async fn require_role_scope(&self, actor: &Principal, role_id: &str) -> AppResult<()> {
        self.authorization_service
            .require_self_scope(actor, SelfPermission::Role, role_id)
            .await
    }

    async fn require_system_scope(&self, actor: &Principal, system_id: &str) -> AppResult<()> {
        self.authorization_service
            .require_self_scope(actor, SelfPermission::System, system_id)
            .await
    }

    async fn require_token_admin(&self, actor: &Principal) -> AppResult<()> {
        self.authorization_service
            .require_self_permission(actor, SelfPermission::System)
            .await
    }

    async fn require_instance_authority(
        &self,
        actor: &Principal,
        instance_id: Uuid,
    ) -> AppResult<PermissionInstance> {
        let instance = self
            .permissions
            .find_permission_instance(instance_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission instance '{instance_id}' does not exist"))
            })?;

        self.require_system_scope(actor, &instance.system_id).await?;
        Ok(instance)
    }
}
