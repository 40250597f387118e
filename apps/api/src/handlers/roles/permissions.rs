use super::*;

pub async fn list_role_permissions_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<Vec<SystemPermissionsResponse>>> {
    let grouped = state
        .security_admin_service
        .list_role_permissions(&role_id)
        .await?
        .into_iter()
        .map(SystemPermissionsResponse::from)
        .collect();

    Ok(Json(grouped))
}

pub async fn grant_role_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<GrantPermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionInstanceResponse>)> {
    let instance =
        NewPermissionInstance::new(payload.system_id, payload.permission_id, payload.scope)?;
    let created = state
        .security_admin_service
        .create_permission_instance(&actor, instance, Grantee::Role(role_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionInstanceResponse::from(created)),
    ))
}

pub async fn remove_role_grant_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((role_id, instance_id)): Path<(String, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .remove_grant(&actor, instance_id, Grantee::Role(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
