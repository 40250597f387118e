//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod dependents;
mod effective;
mod membership;
mod permission;
mod role;
mod role_graph;
mod security;

pub use dependents::DependentRelation;
pub use effective::{EffectivePermissions, GrantedPermission, PermissionScopes};
pub use membership::{
    Membership, MembershipUpdate, MembershipWindow, RoleMember, collect_role_members,
};
pub use permission::{
    ApiToken, Grantee, NewPermissionInstance, PermissionDefinition, PermissionInstance,
    RoleGrant, SystemPermissionInstances, group_by_system, normalize_scope,
    permission_name_matches, scope_matches, validate_key,
};
pub use role::{Role, RoleEdge, RoleUpdate, validate_role_id};
pub use role_graph::RoleGraph;
pub use security::{BOOTSTRAP_ADMIN_ROLE, PLS_SYSTEM, SelfPermission, WILDCARD_SCOPE};
