use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pls_core::Principal;
use pls_domain::{Grantee, NewPermissionInstance};
use uuid::Uuid;

use crate::dto::{
    ApiTokenResponse, CreateApiTokenRequest, CreatedApiTokenResponse, GrantPermissionRequest,
    PermissionInstanceResponse, SystemPermissionsResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_api_tokens_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
) -> ApiResult<Json<Vec<ApiTokenResponse>>> {
    let tokens = state
        .security_admin_service
        .list_api_tokens(&actor)
        .await?
        .into_iter()
        .map(ApiTokenResponse::from)
        .collect();

    Ok(Json(tokens))
}

pub async fn create_api_token_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Json(payload): Json<CreateApiTokenRequest>,
) -> ApiResult<(StatusCode, Json<CreatedApiTokenResponse>)> {
    let created = state
        .security_admin_service
        .create_api_token(&actor, &payload.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedApiTokenResponse::from(created)),
    ))
}

pub async fn delete_api_token_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(token_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .delete_api_token(&actor, token_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_api_token_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(token_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SystemPermissionsResponse>>> {
    let grouped = state
        .security_admin_service
        .list_api_token_permissions(&actor, token_id)
        .await?
        .into_iter()
        .map(SystemPermissionsResponse::from)
        .collect();

    Ok(Json(grouped))
}

pub async fn grant_api_token_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(token_id): Path<Uuid>,
    Json(payload): Json<GrantPermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionInstanceResponse>)> {
    let instance =
        NewPermissionInstance::new(payload.system_id, payload.permission_id, payload.scope)?;
    let created = state
        .security_admin_service
        .create_permission_instance(&actor, instance, Grantee::ApiToken(token_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionInstanceResponse::from(created)),
    ))
}

pub async fn remove_api_token_grant_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((token_id, instance_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .remove_grant(&actor, instance_id, Grantee::ApiToken(token_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
