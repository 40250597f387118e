use async_trait::async_trait;
use pls_application::ApiTokenRepository;
use pls_domain::ApiToken;

use super::*;

#[derive(Debug, FromRow)]
struct ApiTokenRow {
    id: Uuid,
    description: String,
    created_by: String,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiTokenRow> for ApiToken {
    fn from(row: ApiTokenRow) -> Self {
        Self {
            token_id: row.id,
            description: row.description,
            created_by: row.created_by,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

#[async_trait]
impl ApiTokenRepository for PostgresSecurityAdminRepository {
    async fn create_api_token(
        &self,
        secret_hash: &str,
        description: &str,
        created_by: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ApiToken> {
        let row = sqlx::query_as::<_, ApiTokenRow>(
            r#"
            INSERT INTO api_tokens (id, secret_hash, description, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, description, created_by, created_at, last_used_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(secret_hash)
        .bind(description)
        .bind(created_by)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| store_error("failed to create api token", error))?;

        Ok(row.into())
    }

    async fn list_api_tokens(&self) -> AppResult<Vec<ApiToken>> {
        let rows = sqlx::query_as::<_, ApiTokenRow>(
            r#"
            SELECT id, description, created_by, created_at, last_used_at
            FROM api_tokens
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to list api tokens", error))?;

        Ok(rows.into_iter().map(ApiToken::from).collect())
    }

    async fn delete_api_token(&self, token_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(|error| store_error("failed to delete api token", error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "api token '{token_id}' does not exist"
            )));
        }

        Ok(())
    }
}
