use pls_domain::MembershipWindow;

/// Input payload for adding a membership row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    /// Target role.
    pub role_id: String,
    /// External identity receiving the role.
    pub identity: String,
    /// Active window.
    pub window: MembershipWindow,
    /// Acting identity.
    pub granted_by: String,
}

/// Query parameters for member listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberListQuery {
    /// Include direct rows outside their window.
    pub include_expired: bool,
    /// Include active members of descendant roles.
    pub include_indirect: bool,
}
