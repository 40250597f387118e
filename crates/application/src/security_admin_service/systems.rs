use pls_domain::{PLS_SYSTEM, PermissionDefinition, normalize_scope, validate_key};

use super::*;

fn ensure_not_engine_system(system_id: &str) -> AppResult<()> {
    if system_id == PLS_SYSTEM {
        return Err(AppError::InvariantViolation(format!(
            "system '{PLS_SYSTEM}' is seeded by the engine and cannot be changed"
        )));
    }

    Ok(())
}

impl SecurityAdminService {
    /// Lists system ids.
    pub async fn list_systems(&self) -> AppResult<Vec<String>> {
        self.permissions.list_systems().await
    }

    /// Registers a system.
    pub async fn create_system(&self, actor: &Principal, system_id: &str) -> AppResult<()> {
        validate_key("system id", system_id)?;
        self.authorization_service
            .require_self_permission(actor, SelfPermission::ManageSystems)
            .await?;

        self.permissions.create_system(system_id).await?;
        tracing::info!(actor = %actor.subject(), system_id, "created system");
        Ok(())
    }

    /// Deletes a system that has no permission definitions left.
    pub async fn delete_system(&self, actor: &Principal, system_id: &str) -> AppResult<()> {
        ensure_not_engine_system(system_id)?;
        self.authorization_service
            .require_self_permission(actor, SelfPermission::ManageSystems)
            .await?;

        self.permissions.delete_system(system_id).await?;
        tracing::info!(actor = %actor.subject(), system_id, "deleted system");
        Ok(())
    }

    /// Lists permission definitions of a system.
    pub async fn list_permission_definitions(
        &self,
        system_id: &str,
    ) -> AppResult<Vec<PermissionDefinition>> {
        self.permissions
            .list_permission_definitions(system_id)
            .await
    }

    /// Declares a permission within a system.
    pub async fn create_permission_definition(
        &self,
        actor: &Principal,
        definition: PermissionDefinition,
    ) -> AppResult<()> {
        validate_key("system id", &definition.system_id)?;
        validate_key("permission id", &definition.permission_id)?;
        ensure_not_engine_system(&definition.system_id)?;
        self.require_system_scope(actor, &definition.system_id)
            .await?;

        self.permissions
            .create_permission_definition(&definition)
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            system_id = %definition.system_id,
            permission_id = %definition.permission_id,
            has_scope = definition.has_scope,
            "created permission definition"
        );
        Ok(())
    }

    /// Deletes a definition together with its instances and grants.
    pub async fn delete_permission_definition(
        &self,
        actor: &Principal,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<()> {
        ensure_not_engine_system(system_id)?;
        self.require_system_scope(actor, system_id).await?;

        self.permissions
            .delete_permission_definition(system_id, permission_id)
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            system_id,
            permission_id,
            "deleted permission definition"
        );
        Ok(())
    }

    /// Makes a permission scoped; existing instances receive `default_scope`.
    pub async fn add_scope_to_permission(
        &self,
        actor: &Principal,
        system_id: &str,
        permission_id: &str,
        default_scope: &str,
    ) -> AppResult<()> {
        let Some(default_scope) = normalize_scope(Some(default_scope.to_owned())) else {
            return Err(AppError::Validation(
                "default scope must not be empty".to_owned(),
            ));
        };
        ensure_not_engine_system(system_id)?;
        self.require_system_scope(actor, system_id).await?;

        self.permissions
            .set_permission_scope(system_id, permission_id, Some(default_scope.as_str()))
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            system_id,
            permission_id,
            default_scope = %default_scope,
            "added scope to permission"
        );
        Ok(())
    }

    /// Makes a permission unscoped; existing instances lose their scope.
    pub async fn remove_scope_from_permission(
        &self,
        actor: &Principal,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<()> {
        ensure_not_engine_system(system_id)?;
        self.require_system_scope(actor, system_id).await?;

        self.permissions
            .set_permission_scope(system_id, permission_id, None)
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            system_id,
            permission_id,
            "removed scope from permission"
        );
        Ok(())
    }
}
