use pls_domain::{MembershipWindow, NewPermissionInstance, Role};

/// Role projection with relation counts for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleOverview {
    /// The role itself.
    pub role: Role,
    /// Number of direct subroles.
    pub subrole_count: i64,
    /// Number of currently active membership rows.
    pub active_member_count: i64,
}

/// Input payload for creating a role under an owner role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Stable role key.
    pub role_id: String,
    /// Human readable name.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
    /// Role receiving the bootstrap `pls/role` grant over the new role.
    pub owner_role_id: String,
}

/// Everything needed to idempotently seed the bootstrap administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdministratorBootstrap {
    /// Administrator role.
    pub role: Role,
    /// Grants held by the administrator role.
    pub grants: Vec<NewPermissionInstance>,
    /// Identity receiving the role.
    pub identity: String,
    /// Membership window used when no active membership exists.
    pub window: MembershipWindow,
}
