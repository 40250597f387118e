use chrono::Utc;
use pls_domain::{Grantee, SystemPermissionInstances, group_by_system};

use super::*;

use crate::token_crypto::generate_token;

impl SecurityAdminService {
    /// Creates an API token and returns its secret once.
    pub async fn create_api_token(
        &self,
        actor: &Principal,
        description: &str,
    ) -> AppResult<CreatedApiToken> {
        self.require_token_admin(actor).await?;

        let (secret, secret_hash) = generate_token()?;
        let token = self
            .api_tokens
            .create_api_token(&secret_hash, description.trim(), actor.subject(), Utc::now())
            .await?;

        tracing::info!(
            actor = %actor.subject(),
            token_id = %token.token_id,
            "created api token"
        );
        Ok(CreatedApiToken { token, secret })
    }

    /// Lists API tokens.
    pub async fn list_api_tokens(&self, actor: &Principal) -> AppResult<Vec<ApiToken>> {
        self.require_token_admin(actor).await?;
        self.api_tokens.list_api_tokens().await
    }

    /// Lists a token's grants grouped by system.
    pub async fn list_api_token_permissions(
        &self,
        actor: &Principal,
        token_id: Uuid,
    ) -> AppResult<Vec<SystemPermissionInstances>> {
        self.require_token_admin(actor).await?;

        let instances = self
            .permissions
            .list_grants(&Grantee::ApiToken(token_id))
            .await?;
        Ok(group_by_system(instances))
    }

    /// Deletes a token and its grants.
    pub async fn delete_api_token(&self, actor: &Principal, token_id: Uuid) -> AppResult<()> {
        self.require_token_admin(actor).await?;

        self.api_tokens.delete_api_token(token_id).await?;
        tracing::info!(actor = %actor.subject(), token_id = %token_id, "deleted api token");
        Ok(())
    }
}
