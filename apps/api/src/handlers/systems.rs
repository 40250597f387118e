use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pls_core::Principal;
use pls_domain::PermissionDefinition;

use crate::dto::{
    AddScopeRequest, CreatePermissionDefinitionRequest, CreateSystemRequest,
    PermissionDefinitionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_systems_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.security_admin_service.list_systems().await?))
}

pub async fn create_system_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Json(payload): Json<CreateSystemRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .create_system(&actor, &payload.system_id)
        .await?;

    Ok(StatusCode::CREATED)
}

pub async fn delete_system_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(system_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .delete_system(&actor, &system_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_permission_definitions_handler(
    State(state): State<AppState>,
    Path(system_id): Path<String>,
) -> ApiResult<Json<Vec<PermissionDefinitionResponse>>> {
    let definitions = state
        .security_admin_service
        .list_permission_definitions(&system_id)
        .await?
        .into_iter()
        .map(PermissionDefinitionResponse::from)
        .collect();

    Ok(Json(definitions))
}

pub async fn create_permission_definition_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(system_id): Path<String>,
    Json(payload): Json<CreatePermissionDefinitionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionDefinitionResponse>)> {
    let definition = PermissionDefinition {
        system_id,
        permission_id: payload.permission_id,
        has_scope: payload.has_scope,
    };
    state
        .security_admin_service
        .create_permission_definition(&actor, definition.clone())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionDefinitionResponse::from(definition)),
    ))
}

pub async fn delete_permission_definition_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((system_id, permission_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .delete_permission_definition(&actor, &system_id, &permission_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_scope_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((system_id, permission_id)): Path<(String, String)>,
    Json(payload): Json<AddScopeRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .add_scope_to_permission(&actor, &system_id, &permission_id, &payload.default_scope)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_scope_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((system_id, permission_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .remove_scope_from_permission(&actor, &system_id, &permission_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
