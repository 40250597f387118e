mod members;
mod repositories;
mod roles;

pub use members::{MemberListQuery, NewMembership};
pub use repositories::{
    ApiTokenRepository, MembershipRepository, PermissionRepository, RoleRepository,
};
pub use roles::{AdministratorBootstrap, CreateRoleInput, RoleOverview};
