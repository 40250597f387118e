use super::*;

pub async fn list_members_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Query(params): Query<MemberListParams>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let members = state
        .security_admin_service
        .list_members(
            &role_id,
            MemberListQuery {
                include_expired: params.include_expired,
                include_indirect: params.include_indirect,
            },
        )
        .await?
        .into_iter()
        .map(MemberResponse::from)
        .collect();

    Ok(Json(members))
}

pub async fn add_member_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MembershipResponse>)> {
    let window = MembershipWindow::new(payload.start.unwrap_or_else(Utc::now), payload.end)?;
    let membership = state
        .security_admin_service
        .add_member(&actor, &role_id, &payload.identity, window)
        .await?;

    Ok((StatusCode::CREATED, Json(MembershipResponse::from(membership))))
}

pub async fn update_member_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((role_id, membership_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = state
        .security_admin_service
        .update_member(
            &actor,
            &role_id,
            membership_id,
            MembershipUpdate {
                start: payload.start,
                end: payload.end,
            },
        )
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path((role_id, membership_id)): Path<(String, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .remove_member(&actor, &role_id, membership_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
