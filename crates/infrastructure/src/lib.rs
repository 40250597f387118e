//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_store;
mod postgres_authorization_repository;
mod postgres_security_admin_repository;
mod postgres_support;

pub use in_memory_store::InMemoryPlsStore;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_security_admin_repository::PostgresSecurityAdminRepository;
