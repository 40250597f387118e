use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};


pub fn build_router(app_state: AppState) -> Router {
    let query_routes = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/user/check",
            post(handlers::query::check_permission_handler),
        )
        .route("/api/user/scopes", post(handlers::query::get_scopes_handler))
        .route(
            "/api/user/list",
            post(handlers::query::list_permissions_handler),
        )
        .route(
            "/api/user/filter",
            post(handlers::query::filter_permissions_handler),
        )
        .route(
            "/api/token/check",
            post(handlers::query::check_token_handler),
        );

    let admin_routes = Router::new()
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .patch(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/roles/{role_id}/subroles",
            get(handlers::roles::list_subroles_handler).post(handlers::roles::add_subrole_handler),
        )
        .route(
            "/api/roles/{role_id}/subroles/{subrole_id}",
            delete(handlers::roles::remove_subrole_handler),
        )
        .route(
            "/api/roles/{role_id}/members",
            get(handlers::roles::list_members_handler).post(handlers::roles::add_member_handler),
        )
        .route(
            "/api/roles/{role_id}/members/{membership_id}",
            put(handlers::roles::update_member_handler)
                .delete(handlers::roles::remove_member_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            get(handlers::roles::list_role_permissions_handler)
                .post(handlers::roles::grant_role_permission_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions/{instance_id}",
            delete(handlers::roles::remove_role_grant_handler),
        )
        .route(
            "/api/permission-instances/{instance_id}",
            delete(handlers::permission_instances::revoke_permission_handler),
        )
        .route(
            "/api/permission-instances/{instance_id}/grants",
            post(handlers::permission_instances::grant_instance_handler),
        )
        .route(
            "/api/systems",
            get(handlers::systems::list_systems_handler)
                .post(handlers::systems::create_system_handler),
        )
        .route(
            "/api/systems/{system_id}",
            delete(handlers::systems::delete_system_handler),
        )
        .route(
            "/api/systems/{system_id}/permissions",
            get(handlers::systems::list_permission_definitions_handler)
                .post(handlers::systems::create_permission_definition_handler),
        )
        .route(
            "/api/systems/{system_id}/permissions/{permission_id}",
            delete(handlers::systems::delete_permission_definition_handler),
        )
        .route(
            "/api/systems/{system_id}/permissions/{permission_id}/scope",
            put(handlers::systems::add_scope_handler).delete(handlers::systems::remove_scope_handler),
        )
        .route(
            "/api/tokens",
            get(handlers::tokens::list_api_tokens_handler)
                .post(handlers::tokens::create_api_token_handler),
        )
        .route(
            "/api/tokens/{token_id}",
            delete(handlers::tokens::delete_api_token_handler),
        )
        .route(
            "/api/tokens/{token_id}/permissions",
            get(handlers::tokens::list_api_token_permissions_handler)
                .post(handlers::tokens::grant_api_token_permission_handler),
        )
        .route(
            "/api/tokens/{token_id}/permissions/{instance_id}",
            delete(handlers::tokens::remove_api_token_grant_handler),
        )
        .route("/api/me/roles", get(handlers::roles::my_roles_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_actor,
        ));

    Router::new()
        .merge(query_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
