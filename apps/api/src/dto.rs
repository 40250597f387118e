mod common;
mod query;
mod roles;
mod systems;
mod tokens;

pub use common::HealthResponse;
pub use query::{
    CheckResponse, FilterPermissionsRequest, FilterPermissionsResponse, PermissionScopesResponse,
    ScopesResponse, TokenCheckRequest, UserPermissionRequest, UserSystemRequest,
};
pub use roles::{
    AddMemberRequest, AddSubroleRequest, CreateRoleRequest, GrantInstanceRequest,
    GrantPermissionRequest, HeldRolesResponse, MemberListParams, MemberResponse,
    MembershipResponse, PermissionInstanceResponse, RoleResponse, RoleSummaryResponse,
    SystemPermissionsResponse, UpdateMemberRequest, UpdateRoleRequest,
};
pub use systems::{
    AddScopeRequest, CreatePermissionDefinitionRequest, CreateSystemRequest,
    PermissionDefinitionResponse,
};
pub use tokens::{ApiTokenResponse, CreateApiTokenRequest, CreatedApiTokenResponse};
