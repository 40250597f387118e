use pls_application::CreatedApiToken;
use pls_domain::ApiToken;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateApiTokenRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ApiTokenResponse {
    pub token_id: String,
    pub description: String,
    pub created_by: String,
    pub created_at: String,
    pub last_used_at: Option<String>,
}

/// Newly created token. `secret` is returned only here.
#[derive(Debug, Serialize)]
pub struct CreatedApiTokenResponse {
    pub token: ApiTokenResponse,
    pub secret: String,
}

impl From<ApiToken> for ApiTokenResponse {
    fn from(value: ApiToken) -> Self {
        Self {
            token_id: value.token_id.to_string(),
            description: value.description,
            created_by: value.created_by,
            created_at: value.created_at.to_rfc3339(),
            last_used_at: value.last_used_at.map(|value| value.to_rfc3339()),
        }
    }
}

impl From<CreatedApiToken> for CreatedApiTokenResponse {
    fn from(value: CreatedApiToken) -> Self {
        Self {
            token: ApiTokenResponse::from(value.token),
            secret: value.secret,
        }
    }
}
