use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use pls_application::{ApiTokenGrants, AuthorizationRepository, ResolutionInputs, RoleInputs};
use pls_core::AppResult;
use pls_domain::{GrantedPermission, RoleEdge, RoleGrant, RoleGraph};

use crate::postgres_support::{begin_snapshot, commit, store_error};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for resolver reads.
///
/// Role inputs and grants are read inside one repeatable-read, read-only
/// transaction so a concurrent mutation is either fully visible or not at all.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EdgeRow {
    superrole_id: String,
    subrole_id: String,
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role_id: String,
    permission_id: String,
    scope: Option<String>,
}

#[derive(Debug, FromRow)]
struct TokenGrantRow {
    permission_id: String,
    scope: Option<String>,
}

async fn load_role_inputs(
    connection: &mut PgConnection,
    identity: &str,
    at: DateTime<Utc>,
) -> AppResult<RoleInputs> {
    let direct_roles = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT role_id
        FROM role_memberships
        WHERE identity = $1
            AND start_at <= $2
            AND $2 <= end_at
        ORDER BY role_id
        "#,
    )
    .bind(identity)
    .bind(at)
    .fetch_all(&mut *connection)
    .await
    .map_err(|error| store_error("failed to load active roles", error))?;

    let role_edges = sqlx::query_as::<_, EdgeRow>(
        r#"
        SELECT superrole_id, subrole_id
        FROM role_edges
        "#,
    )
    .fetch_all(&mut *connection)
    .await
    .map_err(|error| store_error("failed to load role edges", error))?
    .into_iter()
    .map(|row| RoleEdge::new(row.superrole_id, row.subrole_id))
    .collect();

    Ok(RoleInputs {
        direct_roles,
        role_edges,
    })
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn load_role_inputs(&self, identity: &str, at: DateTime<Utc>) -> AppResult<RoleInputs> {
        let mut transaction = begin_snapshot(&self.pool).await?;
        let inputs = load_role_inputs(&mut *transaction, identity, at).await?;
        commit(transaction).await?;

        Ok(inputs)
    }

    async fn load_resolution_inputs(
        &self,
        identity: &str,
        system_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ResolutionInputs> {
        let mut transaction = begin_snapshot(&self.pool).await?;
        let roles = load_role_inputs(&mut *transaction, identity, at).await?;

        let held_roles: Vec<String> = RoleGraph::from_edges(&roles.role_edges)
            .ancestors_of_all(roles.direct_roles.iter().map(String::as_str))
            .into_iter()
            .collect();

        let grants = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT
                grants.role_id,
                instances.permission_id,
                instances.scope
            FROM role_grants AS grants
            INNER JOIN permission_instances AS instances
                ON instances.id = grants.instance_id
            WHERE instances.system_id = $1
                AND grants.role_id = ANY($2)
            ORDER BY instances.permission_id, instances.scope
            "#,
        )
        .bind(system_id)
        .bind(&held_roles)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to load role grants", error))?
        .into_iter()
        .map(|row| RoleGrant {
            role_id: row.role_id,
            permission_id: row.permission_id,
            scope: row.scope,
        })
        .collect();

        commit(transaction).await?;

        Ok(ResolutionInputs { roles, grants })
    }

    async fn find_api_token_grants(
        &self,
        secret_hash: &str,
        system_id: &str,
    ) -> AppResult<Option<ApiTokenGrants>> {
        let mut transaction = begin_snapshot(&self.pool).await?;

        let token_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM api_tokens
            WHERE secret_hash = $1
            "#,
        )
        .bind(secret_hash)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to find api token", error))?;

        let Some(token_id) = token_id else {
            commit(transaction).await?;
            return Ok(None);
        };

        let grants = sqlx::query_as::<_, TokenGrantRow>(
            r#"
            SELECT instances.permission_id, instances.scope
            FROM api_token_grants AS grants
            INNER JOIN permission_instances AS instances
                ON instances.id = grants.instance_id
            WHERE grants.token_id = $1
                AND instances.system_id = $2
            "#,
        )
        .bind(token_id)
        .bind(system_id)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to load api token grants", error))?
        .into_iter()
        .map(|row| GrantedPermission::new(row.permission_id, row.scope))
        .collect();

        commit(transaction).await?;

        Ok(Some(ApiTokenGrants { token_id, grants }))
    }

    async fn record_api_token_use(&self, token_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE api_tokens
            SET last_used_at = $2
            WHERE id = $1
            "#,
        )
        .bind(token_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("failed to record api token use", error))?;

        Ok(())
    }
}
