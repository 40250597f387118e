use axum::Json;
use axum::extract::State;

use crate::dto::{
    CheckResponse, FilterPermissionsRequest, FilterPermissionsResponse, PermissionScopesResponse,
    ScopesResponse, TokenCheckRequest, UserPermissionRequest, UserSystemRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Json(payload): Json<UserPermissionRequest>,
) -> ApiResult<Json<CheckResponse>> {
    let allowed = state
        .authorization_service
        .check_permission(&payload.identity, &payload.system, &payload.permission)
        .await?;

    Ok(Json(CheckResponse { allowed }))
}

pub async fn get_scopes_handler(
    State(state): State<AppState>,
    Json(payload): Json<UserPermissionRequest>,
) -> ApiResult<Json<ScopesResponse>> {
    let scopes = state
        .authorization_service
        .get_scopes(&payload.identity, &payload.system, &payload.permission)
        .await?;

    Ok(Json(ScopesResponse { scopes }))
}

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Json(payload): Json<UserSystemRequest>,
) -> ApiResult<Json<Vec<PermissionScopesResponse>>> {
    let permissions = state
        .authorization_service
        .list_permissions(&payload.identity, &payload.system)
        .await?
        .into_iter()
        .map(PermissionScopesResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn filter_permissions_handler(
    State(state): State<AppState>,
    Json(payload): Json<FilterPermissionsRequest>,
) -> ApiResult<Json<FilterPermissionsResponse>> {
    let permissions = state
        .authorization_service
        .filter_permissions(&payload.identity, &payload.system, &payload.permissions)
        .await?;

    Ok(Json(FilterPermissionsResponse { permissions }))
}

pub async fn check_token_handler(
    State(state): State<AppState>,
    Json(payload): Json<TokenCheckRequest>,
) -> ApiResult<Json<CheckResponse>> {
    let allowed = state
        .authorization_service
        .check_token(&payload.token, &payload.system, &payload.permission)
        .await?;

    Ok(Json(CheckResponse { allowed }))
}
