use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use pls_core::{AppError, AppResult, Principal};
use pls_domain::{GrantedPermission, RoleEdge, RoleGrant, SelfPermission};

use crate::{ApiTokenGrants, AuthorizationRepository, ResolutionInputs, RoleInputs, hash_token};

use super::AuthorizationService;

struct FakeMembership {
    identity: &'static str,
    role_id: &'static str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

struct FakeToken {
    token_id: Uuid,
    grants: HashMap<&'static str, Vec<GrantedPermission>>,
}

#[derive(Default)]
struct FakeAuthorizationRepository {
    memberships: Vec<FakeMembership>,
    edges: Vec<RoleEdge>,
    grants: HashMap<&'static str, Vec<RoleGrant>>,
    tokens: HashMap<String, FakeToken>,
    fail_token_bookkeeping: bool,
    token_uses: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn load_role_inputs(&self, identity: &str, at: DateTime<Utc>) -> AppResult<RoleInputs> {
        Ok(RoleInputs {
            direct_roles: self
                .memberships
                .iter()
                .filter(|membership| membership.identity == identity)
                .filter(|membership| membership.start <= at && at <= membership.end)
                .map(|membership| membership.role_id.to_owned())
                .collect(),
            role_edges: self.edges.clone(),
        })
    }

    async fn load_resolution_inputs(
        &self,
        identity: &str,
        system_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ResolutionInputs> {
        Ok(ResolutionInputs {
            roles: self.load_role_inputs(identity, at).await?,
            grants: self.grants.get(system_id).cloned().unwrap_or_default(),
        })
    }

    async fn find_api_token_grants(
        &self,
        secret_hash: &str,
        system_id: &str,
    ) -> AppResult<Option<ApiTokenGrants>> {
        Ok(self.tokens.get(secret_hash).map(|token| ApiTokenGrants {
            token_id: token.token_id,
            grants: token.grants.get(system_id).cloned().unwrap_or_default(),
        }))
    }

    async fn record_api_token_use(&self, token_id: Uuid, _at: DateTime<Utc>) -> AppResult<()> {
        if self.fail_token_bookkeeping {
            return Err(AppError::StoreUnavailable("store is read only".to_owned()));
        }

        self.token_uses.lock().await.push(token_id);
        Ok(())
    }
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn always(identity: &'static str, role_id: &'static str) -> FakeMembership {
    FakeMembership {
        identity,
        role_id,
        start: date(2000, 1, 1),
        end: date(2999, 1, 1),
    }
}

fn grant(role_id: &str, permission_id: &str, scope: Option<&str>) -> RoleGrant {
    RoleGrant {
        role_id: role_id.to_owned(),
        permission_id: permission_id.to_owned(),
        scope: scope.map(str::to_owned),
    }
}

fn principal(subject: &str) -> Principal {
    let Ok(principal) = Principal::new(subject) else {
        panic!("test principal must be valid");
    };
    principal
}

/// Two-level graph: `project-lead` sits under `sys-admin`, so members of
/// `project-lead` also hold everything granted to `sys-admin`.
fn organization() -> FakeAuthorizationRepository {
    FakeAuthorizationRepository {
        memberships: vec![
            FakeMembership {
                identity: "u1",
                role_id: "project-lead",
                start: date(2024, 1, 1),
                end: date(2099, 1, 1),
            },
            always("u2", "sys-admin"),
        ],
        edges: vec![RoleEdge::new("sys-admin", "project-lead")],
        grants: HashMap::from([
            (
                "pls",
                vec![
                    grant("sys-admin", "system", Some("*")),
                    grant("project-lead", "role", Some("project-lead")),
                ],
            ),
            (
                "wiki",
                vec![
                    grant("project-lead", "edit", None),
                    grant("sys-admin", "delete", None),
                ],
            ),
        ]),
        ..FakeAuthorizationRepository::default()
    }
}

#[tokio::test]
async fn subrole_members_inherit_superrole_grants() {
    let service = AuthorizationService::new(Arc::new(organization()));

    assert_eq!(
        service.check_permission("u1", "wiki", "delete").await.ok(),
        Some(true)
    );
    assert_eq!(
        service.check_permission("u2", "wiki", "edit").await.ok(),
        Some(false)
    );
}

#[tokio::test]
async fn inherited_wildcard_scope_is_returned_verbatim() {
    let service = AuthorizationService::new(Arc::new(organization()));

    let scopes = service
        .effective_permission_instances("u1", "pls", date(2024, 6, 1))
        .await
        .map(|effective| effective.scopes("system"));

    assert_eq!(scopes.ok(), Some(vec!["*".to_owned()]));
}

#[tokio::test]
async fn wildcard_scope_covers_any_requested_scope() {
    let service = AuthorizationService::new(Arc::new(organization()));

    assert_eq!(
        service
            .has_scope("u1", "pls", "system", "anything")
            .await
            .ok(),
        Some(true)
    );
    assert_eq!(
        service.has_scope("u1", "pls", "role", "sys-admin").await.ok(),
        Some(false)
    );
    assert_eq!(
        service
            .has_scope("u1", "pls", "role", "project-lead")
            .await
            .ok(),
        Some(true)
    );
}

#[tokio::test]
async fn unscoped_grants_contribute_no_scopes() {
    let service = AuthorizationService::new(Arc::new(organization()));

    assert_eq!(
        service.get_scopes("u1", "wiki", "edit").await.ok(),
        Some(Vec::new())
    );
    assert_eq!(
        service.has_scope("u1", "wiki", "edit", "page").await.ok(),
        Some(false)
    );
}

#[tokio::test]
async fn identity_without_memberships_holds_nothing() {
    let service = AuthorizationService::new(Arc::new(organization()));

    assert_eq!(
        service.list_permissions("nobody", "pls").await.ok(),
        Some(Vec::new())
    );
    assert_eq!(
        service.check_permission("nobody", "wiki", "edit").await.ok(),
        Some(false)
    );
}

#[tokio::test]
async fn memberships_outside_their_window_are_ignored() {
    let service = AuthorizationService::new(Arc::new(organization()));

    let before = service
        .effective_permission_instances("u1", "wiki", date(2023, 12, 31))
        .await;
    let during = service
        .effective_permission_instances("u1", "wiki", date(2024, 6, 1))
        .await;
    let boundary = service
        .effective_permission_instances("u1", "wiki", date(2099, 1, 1))
        .await;

    assert!(before.is_ok_and(|effective| effective.is_empty()));
    assert!(during.is_ok_and(|effective| effective.has_permission("delete")));
    assert!(boundary.is_ok_and(|effective| effective.has_permission("edit")));
}

#[tokio::test]
async fn list_permissions_groups_scopes_per_permission() {
    let service = AuthorizationService::new(Arc::new(organization()));

    let Ok(listing) = service.list_permissions("u1", "pls").await else {
        panic!("listing should succeed");
    };

    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].permission_id, "role");
    assert_eq!(listing[0].scopes, vec!["project-lead".to_owned()]);
    assert_eq!(listing[1].permission_id, "system");
    assert_eq!(listing[1].scopes, vec!["*".to_owned()]);
}

#[tokio::test]
async fn filter_permissions_keeps_request_order() {
    let service = AuthorizationService::new(Arc::new(organization()));

    let result = service
        .filter_permissions(
            "u1",
            "wiki",
            &["delete".to_owned(), "view".to_owned(), "edit".to_owned()],
        )
        .await;

    assert_eq!(
        result.ok(),
        Some(vec!["delete".to_owned(), "edit".to_owned()])
    );
}

#[tokio::test]
async fn filter_permissions_honors_stored_name_wildcard() {
    let mut repository = organization();
    repository
        .grants
        .insert("reports", vec![grant("project-lead", "export-*", None)]);
    let service = AuthorizationService::new(Arc::new(repository));

    let result = service
        .filter_permissions(
            "u1",
            "reports",
            &["export-csv".to_owned(), "import-csv".to_owned()],
        )
        .await;

    assert_eq!(result.ok(), Some(vec!["export-csv".to_owned()]));
}

#[tokio::test]
async fn held_roles_include_ancestors_and_cycles_terminate() {
    let mut repository = organization();
    repository
        .edges
        .push(RoleEdge::new("project-lead", "sys-admin"));
    let service = AuthorizationService::new(Arc::new(repository));

    let Ok(roles) = service.held_roles("u2", Utc::now()).await else {
        panic!("held roles should resolve");
    };

    assert!(roles.contains("project-lead"));
    assert!(roles.contains("sys-admin"));
    assert_eq!(
        service.active_roles_of("u1", Utc::now()).await.ok(),
        Some(vec!["project-lead".to_owned()])
    );
}

#[tokio::test]
async fn require_scope_returns_forbidden_without_grant() {
    let service = AuthorizationService::new(Arc::new(organization()));

    let denied = service
        .require_self_scope(&principal("u2"), SelfPermission::Role, "project-lead")
        .await;
    let allowed = service
        .require_self_scope(&principal("u1"), SelfPermission::Role, "project-lead")
        .await;

    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert!(allowed.is_ok());
}

#[tokio::test]
async fn require_held_role_walks_superroles() {
    let service = AuthorizationService::new(Arc::new(organization()));

    let inherited = service
        .require_held_role(&principal("u1"), "sys-admin")
        .await;
    let missing = service
        .require_held_role(&principal("u2"), "project-lead")
        .await;

    assert!(inherited.is_ok());
    assert!(matches!(missing, Err(AppError::Forbidden(_))));
}

fn token_repository(fail_token_bookkeeping: bool) -> (FakeAuthorizationRepository, Uuid) {
    let token_id = Uuid::new_v4();
    let repository = FakeAuthorizationRepository {
        tokens: HashMap::from([(
            hash_token("secret-1"),
            FakeToken {
                token_id,
                grants: HashMap::from([(
                    "wiki",
                    vec![
                        GrantedPermission::new("read", None),
                        GrantedPermission::new("admin-*", None),
                    ],
                )]),
            },
        )]),
        fail_token_bookkeeping,
        ..FakeAuthorizationRepository::default()
    };

    (repository, token_id)
}

#[tokio::test]
async fn check_token_matches_exact_and_prefix_names() {
    let (repository, token_id) = token_repository(false);
    let repository = Arc::new(repository);
    let service = AuthorizationService::new(repository.clone());

    assert_eq!(
        service.check_token("secret-1", "wiki", "read").await.ok(),
        Some(true)
    );
    assert_eq!(
        service
            .check_token("secret-1", "wiki", "admin-users")
            .await
            .ok(),
        Some(true)
    );
    assert_eq!(
        service.check_token("secret-1", "wiki", "write").await.ok(),
        Some(false)
    );
    assert_eq!(
        service.check_token("secret-1", "other", "read").await.ok(),
        Some(false)
    );
    assert_eq!(
        service.check_token("unknown", "wiki", "read").await.ok(),
        Some(false)
    );

    assert_eq!(*repository.token_uses.lock().await, vec![token_id, token_id]);
}

#[tokio::test]
async fn check_token_answer_survives_bookkeeping_failure() {
    let (repository, _) = token_repository(true);
    let service = AuthorizationService::new(Arc::new(repository));

    assert_eq!(
        service.check_token("secret-1", "wiki", "read").await.ok(),
        Some(true)
    );
}

#[tokio::test]
async fn current_time_resolution_uses_active_window() {
    let now = Utc::now();
    let repository = FakeAuthorizationRepository {
        memberships: vec![FakeMembership {
            identity: "u3",
            role_id: "project-lead",
            start: now - Duration::days(10),
            end: now - Duration::days(1),
        }],
        ..organization()
    };
    let service = AuthorizationService::new(Arc::new(repository));

    assert_eq!(
        service.check_permission("u3", "wiki", "edit").await.ok(),
        Some(false)
    );
}
