use chrono::Utc;
use pls_core::AppResult;
use pls_domain::EffectivePermissions;

use crate::hash_token;

use super::AuthorizationService;

impl AuthorizationService {
    /// Whether the raw token secret grants `permission_id` in `system_id`.
    ///
    /// Stored permission names may end in `*` to match by prefix. Last-used
    /// bookkeeping is best effort and never changes the answer.
    pub async fn check_token(
        &self,
        secret: &str,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<bool> {
        let secret_hash = hash_token(secret);
        let Some(token) = self
            .repository
            .find_api_token_grants(&secret_hash, system_id)
            .await?
        else {
            return Ok(false);
        };

        let effective = EffectivePermissions::from_grants(token.grants);
        if !effective.matches_permission_name(permission_id) {
            return Ok(false);
        }

        if let Err(error) = self
            .repository
            .record_api_token_use(token.token_id, Utc::now())
            .await
        {
            tracing::warn!(
                token_id = %token.token_id,
                error = %error,
                "failed to record api token use"
            );
        }

        Ok(true)
    }
}
