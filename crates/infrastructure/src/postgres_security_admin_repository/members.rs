use async_trait::async_trait;
use pls_application::{MembershipRepository, NewMembership};
use pls_domain::MembershipUpdate;

use super::*;

use crate::postgres_support::{CHECK_VIOLATION, begin, commit};

fn map_membership_write_error(error: sqlx::Error, role_id: &str) -> AppError {
    match database_code(&error).as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => {
            AppError::NotFound(format!("role '{role_id}' does not exist"))
        }
        Some(CHECK_VIOLATION) => {
            AppError::Validation(format!("invalid membership for role '{role_id}': {error}"))
        }
        _ => store_error("failed to persist membership", error),
    }
}

#[async_trait]
impl MembershipRepository for PostgresSecurityAdminRepository {
    async fn add_membership(
        &self,
        input: NewMembership,
        at: DateTime<Utc>,
    ) -> AppResult<Membership> {
        sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO role_memberships
                (id, role_id, identity, start_at, end_at, modified_by, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, role_id, identity, start_at, end_at, modified_by, modified_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.role_id.as_str())
        .bind(input.identity.as_str())
        .bind(input.window.start())
        .bind(input.window.end())
        .bind(input.granted_by.as_str())
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_membership_write_error(error, input.role_id.as_str()))?
        .into_membership()
    }

    async fn update_membership(
        &self,
        role_id: &str,
        membership_id: Uuid,
        update: &MembershipUpdate,
        modified_by: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Membership> {
        let mut transaction = begin(&self.pool).await?;

        let current = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, role_id, identity, start_at, end_at, modified_by, modified_at
            FROM role_memberships
            WHERE id = $1 AND role_id = $2
            FOR UPDATE
            "#,
        )
        .bind(membership_id)
        .bind(role_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to load membership", error))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "membership '{membership_id}' of role '{role_id}' does not exist"
            ))
        })?
        .into_membership()?;

        let window = current.window.apply(update)?;

        let updated = sqlx::query_as::<_, MembershipRow>(
            r#"
            UPDATE role_memberships
            SET start_at = $2, end_at = $3, modified_by = $4, modified_at = $5
            WHERE id = $1
            RETURNING id, role_id, identity, start_at, end_at, modified_by, modified_at
            "#,
        )
        .bind(membership_id)
        .bind(window.start())
        .bind(window.end())
        .bind(modified_by)
        .bind(at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_membership_write_error(error, role_id))?
        .into_membership()?;

        commit(transaction).await?;
        Ok(updated)
    }

    async fn remove_membership(&self, role_id: &str, membership_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_memberships
            WHERE id = $1 AND role_id = $2
            "#,
        )
        .bind(membership_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error("failed to remove membership", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "membership '{membership_id}' of role '{role_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn list_memberships(&self, role_ids: &[String]) -> AppResult<Vec<Membership>> {
        sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, role_id, identity, start_at, end_at, modified_by, modified_at
            FROM role_memberships
            WHERE role_id = ANY($1)
            ORDER BY identity, start_at
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to list memberships", error))?
        .into_iter()
        .map(MembershipRow::into_membership)
        .collect()
    }
}
