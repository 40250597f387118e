use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use pls_application::RoleOverview;
use pls_core::{AppError, AppResult};
use pls_domain::{
    Grantee, Membership, MembershipWindow, NewPermissionInstance, PermissionDefinition,
    PermissionInstance, Role,
};

use crate::postgres_support::{FOREIGN_KEY_VIOLATION, database_code, store_error};

mod api_tokens;
mod members;
mod permissions;
mod roles;
mod systems;


/// PostgreSQL-backed repository for every authorization mutation.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleOverviewRow {
    role_id: String,
    display_name: String,
    description: String,
    subrole_count: i64,
    active_member_count: i64,
}

impl RoleOverviewRow {
    fn into_overview(self) -> AppResult<RoleOverview> {
        Ok(RoleOverview {
            role: decode_role(self.role_id, self.display_name, self.description)?,
            subrole_count: self.subrole_count,
            active_member_count: self.active_member_count,
        })
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    id: Uuid,
    role_id: String,
    identity: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    modified_by: String,
    modified_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self) -> AppResult<Membership> {
        let window = MembershipWindow::new(self.start_at, self.end_at).map_err(|error| {
            AppError::Internal(format!(
                "stored membership '{}' has an invalid window: {error}",
                self.id
            ))
        })?;

        Ok(Membership {
            membership_id: self.id,
            role_id: self.role_id,
            identity: self.identity,
            window,
            modified_by: self.modified_by,
            modified_at: self.modified_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PermissionInstanceRow {
    id: Uuid,
    system_id: String,
    permission_id: String,
    scope: Option<String>,
}

impl From<PermissionInstanceRow> for PermissionInstance {
    fn from(row: PermissionInstanceRow) -> Self {
        Self {
            instance_id: row.id,
            system_id: row.system_id,
            permission_id: row.permission_id,
            scope: row.scope,
        }
    }
}

const ROLE_OVERVIEW_COLUMNS: &str = r#"
    roles.id AS role_id,
    roles.display_name,
    roles.description,
    (
        SELECT COUNT(*)
        FROM role_edges AS edges
        WHERE edges.superrole_id = roles.id
    ) AS subrole_count,
    (
        SELECT COUNT(*)
        FROM role_memberships AS memberships
        WHERE memberships.role_id = roles.id
            AND memberships.start_at <= $1
            AND $1 <= memberships.end_at
    ) AS active_member_count
"#;

fn decode_role(role_id: String, display_name: String, description: String) -> AppResult<Role> {
    Role::new(role_id.clone(), display_name, description).map_err(|error| {
        AppError::Internal(format!("stored role '{role_id}' is invalid: {error}"))
    })
}

/// Finds or creates the instance for a triple after checking its definition.
async fn upsert_instance(
    connection: &mut PgConnection,
    instance: &NewPermissionInstance,
) -> AppResult<PermissionInstance> {
    let definition = sqlx::query_as::<_, (String, String, bool)>(
        r#"
        SELECT system_id, id, has_scope
        FROM permissions
        WHERE system_id = $1 AND id = $2
        FOR SHARE
        "#,
    )
    .bind(instance.system_id.as_str())
    .bind(instance.permission_id.as_str())
    .fetch_optional(&mut *connection)
    .await
    .map_err(|error| store_error("failed to load permission definition", error))?
    .map(|(system_id, permission_id, has_scope)| PermissionDefinition {
        system_id,
        permission_id,
        has_scope,
    })
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "permission '{}/{}' does not exist",
            instance.system_id, instance.permission_id
        ))
    })?;

    definition.check_instance_scope(instance.scope.as_deref())?;

    let row = sqlx::query_as::<_, PermissionInstanceRow>(
        r#"
        INSERT INTO permission_instances (id, system_id, permission_id, scope)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (system_id, permission_id, (COALESCE(scope, ''))) DO UPDATE
        SET scope = EXCLUDED.scope
        RETURNING id, system_id, permission_id, scope
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(instance.system_id.as_str())
    .bind(instance.permission_id.as_str())
    .bind(instance.scope.as_deref())
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| store_error("failed to persist permission instance", error))?;

    Ok(row.into())
}

/// Links an instance to a grantee; idempotent.
async fn link_grantee(
    connection: &mut PgConnection,
    instance_id: Uuid,
    grantee: &Grantee,
) -> AppResult<()> {
    let result = match grantee {
        Grantee::Role(role_id) => {
            sqlx::query(
                r#"
                INSERT INTO role_grants (role_id, instance_id)
                VALUES ($1, $2)
                ON CONFLICT (role_id, instance_id) DO NOTHING
                "#,
            )
            .bind(role_id.as_str())
            .bind(instance_id)
            .execute(&mut *connection)
            .await
        }
        Grantee::ApiToken(token_id) => {
            sqlx::query(
                r#"
                INSERT INTO api_token_grants (token_id, instance_id)
                VALUES ($1, $2)
                ON CONFLICT (token_id, instance_id) DO NOTHING
                "#,
            )
            .bind(token_id)
            .bind(instance_id)
            .execute(&mut *connection)
            .await
        }
    };

    result.map(|_| ()).map_err(|error| {
        if database_code(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return AppError::NotFound(format!(
                "{} or permission instance '{instance_id}' does not exist",
                grantee.describe()
            ));
        }

        store_error("failed to persist grant", error)
    })
}
