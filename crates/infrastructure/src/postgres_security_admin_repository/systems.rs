use pls_domain::PermissionDefinition;

use super::*;

use crate::postgres_support::{UNIQUE_VIOLATION, begin, commit};

impl PostgresSecurityAdminRepository {
    pub(super) async fn list_systems_impl(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT id FROM systems ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error("failed to list systems", error))
    }

    pub(super) async fn create_system_impl(&self, system_id: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO systems (id) VALUES ($1)")
            .bind(system_id)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if database_code(&error).as_deref() == Some(UNIQUE_VIOLATION) {
                    return AppError::Conflict(format!("system '{system_id}' already exists"));
                }

                store_error("failed to create system", error)
            })?;

        Ok(())
    }

    pub(super) async fn delete_system_impl(&self, system_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM systems WHERE id = $1")
            .bind(system_id)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if database_code(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    return AppError::Conflict(format!(
                        "system '{system_id}' still has permission definitions; remove them first"
                    ));
                }

                store_error("failed to delete system", error)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "system '{system_id}' does not exist"
            )));
        }

        Ok(())
    }

    pub(super) async fn list_permission_definitions_impl(
        &self,
        system_id: &str,
    ) -> AppResult<Vec<PermissionDefinition>> {
        let rows = sqlx::query_as::<_, (String, String, bool)>(
            r#"
            SELECT system_id, id, has_scope
            FROM permissions
            WHERE system_id = $1
            ORDER BY id
            "#,
        )
        .bind(system_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to list permission definitions", error))?;

        Ok(rows
            .into_iter()
            .map(|(system_id, permission_id, has_scope)| PermissionDefinition {
                system_id,
                permission_id,
                has_scope,
            })
            .collect())
    }

    pub(super) async fn create_permission_definition_impl(
        &self,
        definition: &PermissionDefinition,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permissions (system_id, id, has_scope)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(definition.system_id.as_str())
        .bind(definition.permission_id.as_str())
        .bind(definition.has_scope)
        .execute(&self.pool)
        .await
        .map_err(|error| match database_code(&error).as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict(format!(
                "permission '{}/{}' already exists",
                definition.system_id, definition.permission_id
            )),
            Some(FOREIGN_KEY_VIOLATION) => AppError::NotFound(format!(
                "system '{}' does not exist",
                definition.system_id
            )),
            _ => store_error("failed to create permission definition", error),
        })?;

        Ok(())
    }

    pub(super) async fn delete_permission_definition_impl(
        &self,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM permissions WHERE system_id = $1 AND id = $2")
            .bind(system_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await
            .map_err(|error| store_error("failed to delete permission definition", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{system_id}/{permission_id}' does not exist"
            )));
        }

        Ok(())
    }

    pub(super) async fn set_permission_scope_impl(
        &self,
        system_id: &str,
        permission_id: &str,
        default_scope: Option<&str>,
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE permissions
            SET has_scope = $3
            WHERE system_id = $1 AND id = $2
            "#,
        )
        .bind(system_id)
        .bind(permission_id)
        .bind(default_scope.is_some())
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to update permission definition", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{system_id}/{permission_id}' does not exist"
            )));
        }

        match default_scope {
            Some(default_scope) => {
                sqlx::query(
                    r#"
                    UPDATE permission_instances
                    SET scope = $3
                    WHERE system_id = $1 AND permission_id = $2 AND scope IS NULL
                    "#,
                )
                .bind(system_id)
                .bind(permission_id)
                .bind(default_scope)
                .execute(&mut *transaction)
                .await
                .map_err(|error| store_error("failed to default instance scopes", error))?;
            }
            None => {
                merge_into_unscoped_instance(&mut transaction, system_id, permission_id).await?;
            }
        }

        commit(transaction).await
    }
}

/// Collapses every instance of a permission into one unscoped instance,
/// moving grants onto the survivor.
async fn merge_into_unscoped_instance(
    connection: &mut PgConnection,
    system_id: &str,
    permission_id: &str,
) -> AppResult<()> {
    let survivor = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM permission_instances
        WHERE system_id = $1 AND permission_id = $2
        ORDER BY scope NULLS FIRST, id
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(system_id)
    .bind(permission_id)
    .fetch_optional(&mut *connection)
    .await
    .map_err(|error| store_error("failed to select surviving instance", error))?;

    let Some(survivor) = survivor else {
        return Ok(());
    };

    for statement in [
        r#"
        INSERT INTO role_grants (role_id, instance_id)
        SELECT grants.role_id, $3
        FROM role_grants AS grants
        INNER JOIN permission_instances AS instances ON instances.id = grants.instance_id
        WHERE instances.system_id = $1 AND instances.permission_id = $2
        ON CONFLICT (role_id, instance_id) DO NOTHING
        "#,
        r#"
        INSERT INTO api_token_grants (token_id, instance_id)
        SELECT grants.token_id, $3
        FROM api_token_grants AS grants
        INNER JOIN permission_instances AS instances ON instances.id = grants.instance_id
        WHERE instances.system_id = $1 AND instances.permission_id = $2
        ON CONFLICT (token_id, instance_id) DO NOTHING
        "#,
        r#"
        DELETE FROM permission_instances
        WHERE system_id = $1 AND permission_id = $2 AND id <> $3
        "#,
        r#"
        UPDATE permission_instances
        SET scope = NULL
        WHERE system_id = $1 AND permission_id = $2 AND id = $3
        "#,
    ] {
        sqlx::query(statement)
            .bind(system_id)
            .bind(permission_id)
            .bind(survivor)
            .execute(&mut *connection)
            .await
            .map_err(|error| store_error("failed to merge permission instances", error))?;
    }

    Ok(())
}
