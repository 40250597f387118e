use chrono::{DateTime, Utc};
use pls_application::RoleOverview;
use pls_domain::{
    Grantee, Membership, PermissionInstance, Role, RoleMember, SystemPermissionInstances,
};
use serde::{Deserialize, Serialize};

/// Incoming payload for role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub role_id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub owner_role_id: String,
}

/// Partial role update; absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub display_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSubroleRequest {
    pub subrole_id: String,
}

/// Member listing switches.
#[derive(Debug, Default, Deserialize)]
pub struct MemberListParams {
    #[serde(default)]
    pub include_expired: bool,
    #[serde(default)]
    pub include_indirect: bool,
}

/// Incoming payload for a new membership. A missing start means now.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub identity: String,
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMemberRequest {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Permission to grant, created on first use.
#[derive(Debug, Deserialize)]
pub struct GrantPermissionRequest {
    pub system_id: String,
    pub permission_id: String,
    pub scope: Option<String>,
}

/// Grantee receiving an existing instance.
#[derive(Debug, Deserialize)]
pub struct GrantInstanceRequest {
    pub grantee: Grantee,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub display_name: String,
    pub description: String,
}

/// Role listing row with relation counts.
#[derive(Debug, Serialize)]
pub struct RoleSummaryResponse {
    pub role_id: String,
    pub display_name: String,
    pub description: String,
    pub subrole_count: i64,
    pub active_member_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub membership_id: Option<String>,
    pub identity: String,
    pub modified_by: Option<String>,
    pub modified_at: String,
    pub start: String,
    pub end: String,
    pub indirect: bool,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub membership_id: String,
    pub role_id: String,
    pub identity: String,
    pub start: String,
    pub end: String,
    pub modified_by: String,
    pub modified_at: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionInstanceResponse {
    pub instance_id: String,
    pub system_id: String,
    pub permission_id: String,
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemPermissionsResponse {
    pub system_id: String,
    pub permissions: Vec<PermissionInstanceResponse>,
}

/// Roles of the calling identity.
#[derive(Debug, Serialize)]
pub struct HeldRolesResponse {
    pub roles: Vec<String>,
    pub deletable: Vec<String>,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.role_id().to_owned(),
            display_name: value.display_name().to_owned(),
            description: value.description().to_owned(),
        }
    }
}

impl From<RoleOverview> for RoleSummaryResponse {
    fn from(value: RoleOverview) -> Self {
        Self {
            role_id: value.role.role_id().to_owned(),
            display_name: value.role.display_name().to_owned(),
            description: value.role.description().to_owned(),
            subrole_count: value.subrole_count,
            active_member_count: value.active_member_count,
        }
    }
}

impl From<RoleMember> for MemberResponse {
    fn from(value: RoleMember) -> Self {
        Self {
            membership_id: value.membership_id.map(|id| id.to_string()),
            identity: value.identity,
            modified_by: value.modified_by,
            modified_at: value.modified_at.to_rfc3339(),
            start: value.start.to_rfc3339(),
            end: value.end.to_rfc3339(),
            indirect: value.indirect,
        }
    }
}

impl From<Membership> for MembershipResponse {
    fn from(value: Membership) -> Self {
        Self {
            membership_id: value.membership_id.to_string(),
            role_id: value.role_id,
            identity: value.identity,
            start: value.window.start().to_rfc3339(),
            end: value.window.end().to_rfc3339(),
            modified_by: value.modified_by,
            modified_at: value.modified_at.to_rfc3339(),
        }
    }
}

impl From<PermissionInstance> for PermissionInstanceResponse {
    fn from(value: PermissionInstance) -> Self {
        Self {
            instance_id: value.instance_id.to_string(),
            system_id: value.system_id,
            permission_id: value.permission_id,
            scope: value.scope,
        }
    }
}

impl From<SystemPermissionInstances> for SystemPermissionsResponse {
    fn from(value: SystemPermissionInstances) -> Self {
        Self {
            system_id: value.system_id,
            permissions: value
                .permissions
                .into_iter()
                .map(PermissionInstanceResponse::from)
                .collect(),
        }
    }
}
