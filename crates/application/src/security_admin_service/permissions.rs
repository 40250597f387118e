use pls_domain::{
    Grantee, NewPermissionInstance, PermissionInstance, SystemPermissionInstances,
    group_by_system, validate_role_id,
};

use super::*;

impl SecurityAdminService {
    /// Lists a role's grants grouped by system.
    pub async fn list_role_permissions(
        &self,
        role_id: &str,
    ) -> AppResult<Vec<SystemPermissionInstances>> {
        let instances = self
            .permissions
            .list_grants(&Grantee::Role(role_id.to_owned()))
            .await?;
        Ok(group_by_system(instances))
    }

    /// Creates (or reuses) a permission instance and grants it in one step.
    ///
    /// Authority comes from `pls/system` scoped to the instance's system,
    /// independent of any authority over the grantee.
    pub async fn create_permission_instance(
        &self,
        actor: &Principal,
        instance: NewPermissionInstance,
        grantee: Grantee,
    ) -> AppResult<PermissionInstance> {
        if let Grantee::Role(role_id) = &grantee {
            validate_role_id(role_id)?;
        }
        self.require_system_scope(actor, &instance.system_id)
            .await?;

        let created = self
            .permissions
            .create_granted_instance(&instance, &grantee)
            .await?;

        tracing::info!(
            actor = %actor.subject(),
            instance_id = %created.instance_id,
            system_id = %created.system_id,
            permission_id = %created.permission_id,
            grantee = %grantee.describe(),
            "granted permission"
        );
        Ok(created)
    }

    /// Grants an existing instance to another grantee.
    pub async fn grant_instance(
        &self,
        actor: &Principal,
        instance_id: Uuid,
        grantee: Grantee,
    ) -> AppResult<()> {
        self.require_instance_authority(actor, instance_id).await?;

        self.permissions
            .grant_instance(instance_id, &grantee)
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            instance_id = %instance_id,
            grantee = %grantee.describe(),
            "granted permission instance"
        );
        Ok(())
    }

    /// Removes one grantee's grant of an instance.
    pub async fn remove_grant(
        &self,
        actor: &Principal,
        instance_id: Uuid,
        grantee: Grantee,
    ) -> AppResult<()> {
        self.require_instance_authority(actor, instance_id).await?;

        self.permissions
            .ungrant_instance(instance_id, &grantee)
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            instance_id = %instance_id,
            grantee = %grantee.describe(),
            "removed permission grant"
        );
        Ok(())
    }

    /// Deletes an instance and every grant referencing it.
    pub async fn revoke_permission(&self, actor: &Principal, instance_id: Uuid) -> AppResult<()> {
        self.require_instance_authority(actor, instance_id).await?;

        self.permissions
            .revoke_permission_instance(instance_id)
            .await?;
        tracing::info!(actor = %actor.subject(), instance_id = %instance_id, "revoked permission");
        Ok(())
    }
}
