use async_trait::async_trait;
use pls_application::{AdministratorBootstrap, RoleRepository};
use pls_domain::{
    DependentRelation, PLS_SYSTEM, RoleEdge, RoleUpdate, SelfPermission,
};

use super::*;

use crate::postgres_support::{UNIQUE_VIOLATION, begin, commit, violated_table};

#[derive(Debug, FromRow)]
struct RoleRow {
    id: String,
    display_name: String,
    description: String,
}

#[async_trait]
impl RoleRepository for PostgresSecurityAdminRepository {
    async fn list_roles(&self, at: DateTime<Utc>) -> AppResult<Vec<RoleOverview>> {
        let statement = format!(
            "SELECT {ROLE_OVERVIEW_COLUMNS} FROM roles ORDER BY roles.display_name, roles.id"
        );

        sqlx::query_as::<_, RoleOverviewRow>(statement.as_str())
            .bind(at)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error("failed to list roles", error))?
            .into_iter()
            .map(RoleOverviewRow::into_overview)
            .collect()
    }

    async fn find_role(
        &self,
        role_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Option<RoleOverview>> {
        let statement = format!("SELECT {ROLE_OVERVIEW_COLUMNS} FROM roles WHERE roles.id = $2");

        sqlx::query_as::<_, RoleOverviewRow>(statement.as_str())
            .bind(at)
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| store_error("failed to find role", error))?
            .map(RoleOverviewRow::into_overview)
            .transpose()
    }

    async fn list_role_ids(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT id FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error("failed to list role ids", error))
    }

    async fn create_role(&self, role: &Role, owner_role_id: &str) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO roles (id, display_name, description)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(role.role_id())
        .bind(role.display_name())
        .bind(role.description())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if database_code(&error).as_deref() == Some(UNIQUE_VIOLATION) {
                return AppError::Conflict(format!("role '{}' already exists", role.role_id()));
            }

            store_error("failed to create role", error)
        })?;

        let instance = upsert_instance(
            &mut transaction,
            &NewPermissionInstance::new(
                PLS_SYSTEM,
                SelfPermission::Role.as_str(),
                Some(role.role_id().to_owned()),
            )?,
        )
        .await?;
        link_grantee(
            &mut transaction,
            instance.instance_id,
            &Grantee::Role(owner_role_id.to_owned()),
        )
        .await?;

        commit(transaction).await
    }

    async fn update_role(&self, role_id: &str, update: &RoleUpdate) -> AppResult<Role> {
        let mut transaction = begin(&self.pool).await?;

        let current = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, display_name, description
            FROM roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to load role", error))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        let updated = decode_role(current.id, current.display_name, current.description)?
            .apply(update)?;

        sqlx::query(
            r#"
            UPDATE roles
            SET display_name = $2, description = $3
            WHERE id = $1
            "#,
        )
        .bind(role_id)
        .bind(updated.display_name())
        .bind(updated.description())
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to update role", error))?;

        commit(transaction).await?;
        Ok(updated)
    }

    async fn delete_role(&self, role_id: &str) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let exists = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id
            FROM roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to lock role", error))?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        sqlx::query("DELETE FROM role_edges WHERE subrole_id = $1")
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error("failed to remove superrole edges", error))?;

        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                if database_code(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    let relation = violated_table(&error)
                        .map(|table| DependentRelation::from_table(&table))
                        .unwrap_or_else(|| DependentRelation::Other("dependents".to_owned()));
                    return AppError::Conflict(relation.blocking_message(role_id));
                }

                store_error("failed to delete role", error)
            })?;

        sqlx::query(
            r#"
            DELETE FROM permission_instances
            WHERE system_id = $1 AND permission_id = $2 AND scope = $3
            "#,
        )
        .bind(PLS_SYSTEM)
        .bind(SelfPermission::Role.as_str())
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to delete role permission instance", error))?;

        commit(transaction).await
    }

    async fn list_subroles(
        &self,
        role_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<RoleOverview>> {
        let statement = format!(
            r#"
            SELECT {ROLE_OVERVIEW_COLUMNS}
            FROM role_edges AS parent
            INNER JOIN roles ON roles.id = parent.subrole_id
            WHERE parent.superrole_id = $2
            ORDER BY roles.display_name, roles.id
            "#
        );

        sqlx::query_as::<_, RoleOverviewRow>(statement.as_str())
            .bind(at)
            .bind(role_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error("failed to list subroles", error))?
            .into_iter()
            .map(RoleOverviewRow::into_overview)
            .collect()
    }

    async fn list_role_edges(&self) -> AppResult<Vec<RoleEdge>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT superrole_id, subrole_id FROM role_edges ORDER BY superrole_id, subrole_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to list role edges", error))?;

        Ok(rows
            .into_iter()
            .map(|(superrole_id, subrole_id)| RoleEdge::new(superrole_id, subrole_id))
            .collect())
    }

    async fn add_subrole(&self, edge: &RoleEdge) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_edges (superrole_id, subrole_id)
            VALUES ($1, $2)
            ON CONFLICT (superrole_id, subrole_id) DO NOTHING
            "#,
        )
        .bind(edge.superrole_id.as_str())
        .bind(edge.subrole_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if database_code(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                return AppError::NotFound(format!(
                    "role '{}' or '{}' does not exist",
                    edge.superrole_id, edge.subrole_id
                ));
            }

            store_error("failed to add subrole", error)
        })?;

        Ok(())
    }

    async fn remove_subrole(&self, edge: &RoleEdge) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_edges
            WHERE superrole_id = $1 AND subrole_id = $2
            "#,
        )
        .bind(edge.superrole_id.as_str())
        .bind(edge.subrole_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("failed to remove subrole", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{}' is not a subrole of '{}'",
                edge.subrole_id, edge.superrole_id
            )));
        }

        Ok(())
    }

    async fn ensure_administrator(&self, input: &AdministratorBootstrap) -> AppResult<bool> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO roles (id, display_name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(input.role.role_id())
        .bind(input.role.display_name())
        .bind(input.role.description())
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to ensure administrator role", error))?;

        let grantee = Grantee::Role(input.role.role_id().to_owned());
        for grant in &input.grants {
            let instance = upsert_instance(&mut transaction, grant).await?;
            link_grantee(&mut transaction, instance.instance_id, &grantee).await?;
        }

        let has_active_membership = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_memberships
                WHERE role_id = $1
                    AND identity = $2
                    AND start_at <= $3
                    AND $3 <= end_at
            )
            "#,
        )
        .bind(input.role.role_id())
        .bind(input.identity.as_str())
        .bind(input.window.start())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to check administrator membership", error))?;

        if !has_active_membership {
            sqlx::query(
                r#"
                INSERT INTO role_memberships
                    (id, role_id, identity, start_at, end_at, modified_by, modified_at)
                VALUES ($1, $2, $3, $4, $5, 'bootstrap', $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(input.role.role_id())
            .bind(input.identity.as_str())
            .bind(input.window.start())
            .bind(input.window.end())
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error("failed to add administrator membership", error))?;
        }

        commit(transaction).await?;
        Ok(!has_active_membership)
    }
}
