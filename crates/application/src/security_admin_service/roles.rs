use chrono::Utc;
use pls_domain::{PLS_SYSTEM, Role, RoleUpdate, SelfPermission, scope_matches};

use super::*;

use crate::{CreateRoleInput, RoleOverview};

impl SecurityAdminService {
    /// Lists every role with relation counts.
    pub async fn list_roles(&self) -> AppResult<Vec<RoleOverview>> {
        self.roles.list_roles(Utc::now()).await
    }

    /// Returns one role.
    pub async fn get_role(&self, role_id: &str) -> AppResult<RoleOverview> {
        self.roles
            .find_role(role_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    /// Creates a role owned by a role the actor currently holds.
    ///
    /// The owner receives `pls/role` scoped to the new role in the same
    /// transaction that creates it.
    pub async fn create_role(&self, actor: &Principal, input: CreateRoleInput) -> AppResult<Role> {
        self.authorization_service
            .require_self_permission(actor, SelfPermission::CreateRole)
            .await?;
        self.authorization_service
            .require_held_role(actor, &input.owner_role_id)
            .await?;

        let role = Role::new(input.role_id, input.display_name, input.description)?;
        self.roles.create_role(&role, &input.owner_role_id).await?;

        tracing::info!(
            actor = %actor.subject(),
            role_id = %role.role_id(),
            owner_role_id = %input.owner_role_id,
            "created role"
        );

        Ok(role)
    }

    /// Updates display name and description.
    pub async fn update_role(
        &self,
        actor: &Principal,
        role_id: &str,
        update: RoleUpdate,
    ) -> AppResult<Role> {
        self.require_role_scope(actor, role_id).await?;

        let role = self.roles.update_role(role_id, &update).await?;
        tracing::info!(actor = %actor.subject(), role_id, "updated role");
        Ok(role)
    }

    /// Deletes a role without members, subroles or grants.
    ///
    /// Requires both `create-role` and `role` scoped to the target.
    pub async fn delete_role(&self, actor: &Principal, role_id: &str) -> AppResult<()> {
        self.authorization_service
            .require_self_permission(actor, SelfPermission::CreateRole)
            .await?;
        self.require_role_scope(actor, role_id).await?;

        self.roles.delete_role(role_id).await?;
        tracing::info!(actor = %actor.subject(), role_id, "deleted role");
        Ok(())
    }

    /// Roles the actor may delete. Empty without `create-role`.
    pub async fn deletable_roles(&self, actor: &Principal) -> AppResult<Vec<String>> {
        let effective = self
            .authorization_service
            .effective_permission_instances(actor.subject(), PLS_SYSTEM, Utc::now())
            .await?;
        if !effective.has_permission(SelfPermission::CreateRole.as_str()) {
            return Ok(Vec::new());
        }

        let scopes = effective.scopes(SelfPermission::Role.as_str());

        Ok(self
            .roles
            .list_role_ids()
            .await?
            .into_iter()
            .filter(|role_id| scopes.iter().any(|scope| scope_matches(scope, role_id)))
            .collect())
    }
}
