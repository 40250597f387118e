use chrono::Utc;
use pls_core::{AppError, AppResult, Principal};
use pls_domain::{PLS_SYSTEM, SelfPermission};

use super::AuthorizationService;

impl AuthorizationService {
    /// Requires that the actor holds a permission for any scope.
    pub async fn require_permission(
        &self,
        actor: &Principal,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<()> {
        if self
            .check_permission(actor.subject(), system_id, permission_id)
            .await?
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "'{}' lacks permission '{system_id}/{permission_id}'",
            actor.subject()
        )))
    }

    /// Requires that the actor holds a permission for `scope` or `*`.
    pub async fn require_scope(
        &self,
        actor: &Principal,
        system_id: &str,
        permission_id: &str,
        scope: &str,
    ) -> AppResult<()> {
        if self
            .has_scope(actor.subject(), system_id, permission_id, scope)
            .await?
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "'{}' lacks permission '{system_id}/{permission_id}' for '{scope}'",
            actor.subject()
        )))
    }

    /// Requires an unscoped permission of the `pls` system.
    pub async fn require_self_permission(
        &self,
        actor: &Principal,
        permission: SelfPermission,
    ) -> AppResult<()> {
        self.require_permission(actor, PLS_SYSTEM, permission.as_str())
            .await
    }

    /// Requires a scoped permission of the `pls` system.
    pub async fn require_self_scope(
        &self,
        actor: &Principal,
        permission: SelfPermission,
        scope: &str,
    ) -> AppResult<()> {
        self.require_scope(actor, PLS_SYSTEM, permission.as_str(), scope)
            .await
    }

    /// Requires that the actor currently holds `role_id`, directly or through
    /// a superrole.
    pub async fn require_held_role(&self, actor: &Principal, role_id: &str) -> AppResult<()> {
        if self
            .held_roles(actor.subject(), Utc::now())
            .await?
            .contains(role_id)
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "'{}' does not have role '{role_id}'",
            actor.subject()
        )))
    }
}
