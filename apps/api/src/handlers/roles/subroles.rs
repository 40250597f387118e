use super::*;

pub async fn list_subroles_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<Vec<RoleSummaryResponse>>> {
    let subroles = state
        .security_admin_service
        .list_subroles(&role_id)
        .await?
        .into_iter()
        .map(RoleSummaryResponse::from)
        .collect();

    Ok(Json(subroles))
}

pub async fn add_subrole_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<AddSubroleRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .add_subrole(&actor, &role_id, &payload.subrole_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_subrole_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((role_id, subrole_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .remove_subrole(&actor, &role_id, &subrole_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
