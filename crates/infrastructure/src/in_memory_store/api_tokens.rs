use async_trait::async_trait;
use pls_application::ApiTokenRepository;

use super::*;

#[async_trait]
impl ApiTokenRepository for InMemoryPlsStore {
    async fn create_api_token(
        &self,
        secret_hash: &str,
        description: &str,
        created_by: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ApiToken> {
        let mut state = self.state.write().await;
        if state
            .api_tokens
            .values()
            .any(|stored| stored.secret_hash == secret_hash)
        {
            return Err(AppError::Conflict(
                "an api token with the same secret already exists".to_owned(),
            ));
        }

        let token = ApiToken {
            token_id: Uuid::new_v4(),
            description: description.to_owned(),
            created_by: created_by.to_owned(),
            created_at: at,
            last_used_at: None,
        };
        state.api_tokens.insert(
            token.token_id,
            StoredApiToken {
                secret_hash: secret_hash.to_owned(),
                token: token.clone(),
            },
        );

        Ok(token)
    }

    async fn list_api_tokens(&self) -> AppResult<Vec<ApiToken>> {
        let state = self.state.read().await;
        let mut tokens: Vec<ApiToken> = state
            .api_tokens
            .values()
            .map(|stored| stored.token.clone())
            .collect();
        tokens.sort_by_key(|token| (token.created_at, token.token_id));

        Ok(tokens)
    }

    async fn delete_api_token(&self, token_id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.api_tokens.remove(&token_id).is_none() {
            return Err(AppError::NotFound(format!(
                "api token '{token_id}' does not exist"
            )));
        }

        state
            .token_grants
            .retain(|(granted_token, _)| *granted_token != token_id);
        Ok(())
    }
}
