//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_ports;
mod authorization_service;
mod security_admin_ports;
mod security_admin_service;
mod token_crypto;

pub use authorization_ports::{
    ApiTokenGrants, AuthorizationRepository, ResolutionInputs, RoleInputs,
};
pub use authorization_service::AuthorizationService;
pub use security_admin_ports::{
    AdministratorBootstrap, ApiTokenRepository, CreateRoleInput, MemberListQuery,
    MembershipRepository, NewMembership, PermissionRepository, RoleOverview, RoleRepository,
};
pub use security_admin_service::{CreatedApiToken, SecurityAdminService};
pub use token_crypto::hash_token;
