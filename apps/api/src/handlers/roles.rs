use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use pls_application::{CreateRoleInput, MemberListQuery};
use pls_core::Principal;
use pls_domain::{Grantee, MembershipUpdate, MembershipWindow, NewPermissionInstance, RoleUpdate};
use uuid::Uuid;

use crate::dto::{
    AddMemberRequest, AddSubroleRequest, CreateRoleRequest, GrantPermissionRequest,
    HeldRolesResponse, MemberListParams, MemberResponse, MembershipResponse,
    PermissionInstanceResponse, RoleResponse, RoleSummaryResponse, SystemPermissionsResponse,
    UpdateMemberRequest, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod members;
mod permissions;
mod subroles;

pub use members::{
    add_member_handler, list_members_handler, remove_member_handler, update_member_handler,
};
pub use permissions::{
    grant_role_permission_handler, list_role_permissions_handler, remove_role_grant_handler,
};
pub use subroles::{add_subrole_handler, list_subroles_handler, remove_subrole_handler};

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RoleSummaryResponse>>> {
    let roles = state
        .security_admin_service
        .list_roles()
        .await?
        .into_iter()
        .map(RoleSummaryResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleSummaryResponse>> {
    let role = state.security_admin_service.get_role(&role_id).await?;
    Ok(Json(RoleSummaryResponse::from(role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .security_admin_service
        .create_role(
            &actor,
            CreateRoleInput {
                role_id: payload.role_id,
                display_name: payload.display_name,
                description: payload.description,
                owner_role_id: payload.owner_role_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .security_admin_service
        .update_role(
            &actor,
            &role_id,
            RoleUpdate {
                display_name: payload.display_name,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .delete_role(&actor, &role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Principal>,
) -> ApiResult<Json<HeldRolesResponse>> {
    let roles = state
        .authorization_service
        .held_roles(actor.subject(), Utc::now())
        .await?
        .into_iter()
        .collect();
    let deletable = state
        .security_admin_service
        .deletable_roles(&actor)
        .await?;

    Ok(Json(HeldRolesResponse { roles, deletable }))
}
