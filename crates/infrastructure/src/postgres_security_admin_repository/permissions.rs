use async_trait::async_trait;
use pls_application::PermissionRepository;

use super::*;

use crate::postgres_support::{begin, commit};

#[async_trait]
impl PermissionRepository for PostgresSecurityAdminRepository {
    async fn list_systems(&self) -> AppResult<Vec<String>> {
        self.list_systems_impl().await
    }

    async fn create_system(&self, system_id: &str) -> AppResult<()> {
        self.create_system_impl(system_id).await
    }

    async fn delete_system(&self, system_id: &str) -> AppResult<()> {
        self.delete_system_impl(system_id).await
    }

    async fn list_permission_definitions(
        &self,
        system_id: &str,
    ) -> AppResult<Vec<PermissionDefinition>> {
        self.list_permission_definitions_impl(system_id).await
    }

    async fn create_permission_definition(
        &self,
        definition: &PermissionDefinition,
    ) -> AppResult<()> {
        self.create_permission_definition_impl(definition).await
    }

    async fn delete_permission_definition(
        &self,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<()> {
        self.delete_permission_definition_impl(system_id, permission_id)
            .await
    }

    async fn set_permission_scope(
        &self,
        system_id: &str,
        permission_id: &str,
        default_scope: Option<&str>,
    ) -> AppResult<()> {
        self.set_permission_scope_impl(system_id, permission_id, default_scope)
            .await
    }

    async fn create_granted_instance(
        &self,
        instance: &NewPermissionInstance,
        grantee: &Grantee,
    ) -> AppResult<PermissionInstance> {
        let mut transaction = begin(&self.pool).await?;

        let created = upsert_instance(&mut transaction, instance).await?;
        link_grantee(&mut transaction, created.instance_id, grantee).await?;

        commit(transaction).await?;
        Ok(created)
    }

    async fn grant_instance(&self, instance_id: Uuid, grantee: &Grantee) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;
        link_grantee(&mut transaction, instance_id, grantee).await?;
        commit(transaction).await
    }

    async fn ungrant_instance(&self, instance_id: Uuid, grantee: &Grantee) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let result = match grantee {
            Grantee::Role(role_id) => {
                sqlx::query("DELETE FROM role_grants WHERE role_id = $1 AND instance_id = $2")
                    .bind(role_id.as_str())
                    .bind(instance_id)
                    .execute(&mut *transaction)
                    .await
            }
            Grantee::ApiToken(token_id) => {
                sqlx::query(
                    "DELETE FROM api_token_grants WHERE token_id = $1 AND instance_id = $2",
                )
                .bind(token_id)
                .bind(instance_id)
                .execute(&mut *transaction)
                .await
            }
        }
        .map_err(|error| store_error("failed to remove grant", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} does not hold permission instance '{instance_id}'",
                grantee.describe()
            )));
        }

        sqlx::query(
            r#"
            DELETE FROM permission_instances AS instances
            WHERE instances.id = $1
                AND NOT EXISTS (SELECT 1 FROM role_grants WHERE instance_id = $1)
                AND NOT EXISTS (SELECT 1 FROM api_token_grants WHERE instance_id = $1)
            "#,
        )
        .bind(instance_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to delete orphaned instance", error))?;

        commit(transaction).await
    }

    async fn find_permission_instance(
        &self,
        instance_id: Uuid,
    ) -> AppResult<Option<PermissionInstance>> {
        let row = sqlx::query_as::<_, PermissionInstanceRow>(
            r#"
            SELECT id, system_id, permission_id, scope
            FROM permission_instances
            WHERE id = $1
            "#,
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("failed to find permission instance", error))?;

        Ok(row.map(PermissionInstance::from))
    }

    async fn revoke_permission_instance(&self, instance_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM permission_instances WHERE id = $1")
            .bind(instance_id)
            .execute(&self.pool)
            .await
            .map_err(|error| store_error("failed to revoke permission instance", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "permission instance '{instance_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn list_grants(&self, grantee: &Grantee) -> AppResult<Vec<PermissionInstance>> {
        let rows = match grantee {
            Grantee::Role(role_id) => {
                sqlx::query_as::<_, PermissionInstanceRow>(
                    r#"
                    SELECT instances.id, instances.system_id, instances.permission_id, instances.scope
                    FROM role_grants AS grants
                    INNER JOIN permission_instances AS instances
                        ON instances.id = grants.instance_id
                    WHERE grants.role_id = $1
                    ORDER BY instances.system_id, instances.permission_id, instances.scope
                    "#,
                )
                .bind(role_id.as_str())
                .fetch_all(&self.pool)
                .await
            }
            Grantee::ApiToken(token_id) => {
                sqlx::query_as::<_, PermissionInstanceRow>(
                    r#"
                    SELECT instances.id, instances.system_id, instances.permission_id, instances.scope
                    FROM api_token_grants AS grants
                    INNER JOIN permission_instances AS instances
                        ON instances.id = grants.instance_id
                    WHERE grants.token_id = $1
                    ORDER BY instances.system_id, instances.permission_id, instances.scope
                    "#,
                )
                .bind(token_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|error| store_error("failed to list grants", error))?;

        Ok(rows.into_iter().map(PermissionInstance::from).collect())
    }
}
