use std::sync::Arc;

use pls_application::{AuthorizationService, SecurityAdminService};
use pls_infrastructure::{PostgresAuthorizationRepository, PostgresSecurityAdminRepository};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let authorization_service = AuthorizationService::new(authorization_repository);

    let security_admin_repository = Arc::new(PostgresSecurityAdminRepository::new(pool));
    let security_admin_service = SecurityAdminService::new(
        authorization_service.clone(),
        security_admin_repository.clone(),
        security_admin_repository.clone(),
        security_admin_repository.clone(),
        security_admin_repository,
    );

    AppState {
        authorization_service,
        security_admin_service,
        actor_header: config.actor_header.clone(),
    }
}
