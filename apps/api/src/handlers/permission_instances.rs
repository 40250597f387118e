use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pls_core::Principal;
use uuid::Uuid;

use crate::dto::GrantInstanceRequest;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(instance_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .revoke_permission(&actor, instance_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_instance_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(instance_id): Path<Uuid>,
    Json(payload): Json<GrantInstanceRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .grant_instance(&actor, instance_id, payload.grantee)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
