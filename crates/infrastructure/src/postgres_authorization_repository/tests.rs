use chrono::{Duration, Utc};
use pls_application::{AuthorizationRepository, AuthorizationService};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresAuthorizationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres authorization tests: {error}");
    }

    Some(pool)
}

async fn execute(pool: &PgPool, statement: &str, binds: &[&str]) {
    let mut query = sqlx::query(statement);
    for bind in binds {
        query = query.bind(*bind);
    }

    let result = query.execute(pool).await;
    assert!(result.is_ok(), "statement failed: {statement}: {result:?}");
}

/// Seeds `<prefix>-admin` above `<prefix>-lead` with one wiki grant each.
async fn seed_graph(pool: &PgPool, prefix: &str) -> (String, String, String) {
    let admin = format!("{prefix}-admin");
    let lead = format!("{prefix}-lead");
    let system = format!("{prefix}-wiki");

    for role in [&admin, &lead] {
        execute(
            pool,
            "INSERT INTO roles (id, display_name) VALUES ($1, $1)",
            &[role.as_str()],
        )
        .await;
    }
    execute(
        pool,
        "INSERT INTO role_edges (superrole_id, subrole_id) VALUES ($1, $2)",
        &[admin.as_str(), lead.as_str()],
    )
    .await;
    execute(pool, "INSERT INTO systems (id) VALUES ($1)", &[system.as_str()]).await;
    for permission in ["edit", "delete"] {
        execute(
            pool,
            "INSERT INTO permissions (system_id, id) VALUES ($1, $2)",
            &[system.as_str(), permission],
        )
        .await;
    }

    for (role, permission) in [(&admin, "delete"), (&lead, "edit")] {
        let instance_id = Uuid::new_v4().to_string();
        execute(
            pool,
            r#"
            INSERT INTO permission_instances (id, system_id, permission_id)
            VALUES ($1::uuid, $2, $3)
            "#,
            &[instance_id.as_str(), system.as_str(), permission],
        )
        .await;
        execute(
            pool,
            "INSERT INTO role_grants (role_id, instance_id) VALUES ($1, $2::uuid)",
            &[role.as_str(), instance_id.as_str()],
        )
        .await;
    }

    (admin, lead, system)
}

async fn add_membership(
    pool: &PgPool,
    role_id: &str,
    identity: &str,
    days_from: i64,
    days_to: i64,
) {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO role_memberships (id, role_id, identity, start_at, end_at, modified_by)
        VALUES ($1, $2, $3, $4, $5, 'test')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(role_id)
    .bind(identity)
    .bind(now + Duration::days(days_from))
    .bind(now + Duration::days(days_to))
    .execute(pool)
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn resolution_inputs_follow_superrole_edges() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let prefix = Uuid::new_v4().simple().to_string();
    let (_, lead, system) = seed_graph(&pool, &prefix).await;
    let identity = format!("{prefix}-user");
    add_membership(&pool, &lead, &identity, -1, 30).await;

    let service = AuthorizationService::new(std::sync::Arc::new(
        PostgresAuthorizationRepository::new(pool),
    ));

    assert_eq!(
        service.check_permission(&identity, &system, "delete").await.ok(),
        Some(true)
    );
    assert_eq!(
        service.check_permission(&identity, &system, "edit").await.ok(),
        Some(true)
    );
}

#[tokio::test]
async fn expired_memberships_are_not_active_roles() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let prefix = Uuid::new_v4().simple().to_string();
    let (admin, lead, _) = seed_graph(&pool, &prefix).await;
    let identity = format!("{prefix}-user");
    add_membership(&pool, &lead, &identity, -30, -1).await;
    add_membership(&pool, &admin, &identity, -1, 1).await;

    let repository = PostgresAuthorizationRepository::new(pool);
    let inputs = repository.load_role_inputs(&identity, Utc::now()).await;

    assert!(inputs.is_ok_and(|inputs| inputs.direct_roles == vec![admin]));
}

#[tokio::test]
async fn unknown_token_hash_yields_no_grants() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAuthorizationRepository::new(pool);
    let found = repository
        .find_api_token_grants(&Uuid::new_v4().to_string(), "pls")
        .await;

    assert!(matches!(found, Ok(None)));
}
