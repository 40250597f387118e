pub mod health;
pub mod permission_instances;
pub mod query;
pub mod roles;
pub mod systems;
pub mod tokens;
