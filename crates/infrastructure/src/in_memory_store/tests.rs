use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pls_application::{
    AuthorizationService, CreateRoleInput, MemberListQuery, PermissionRepository,
    SecurityAdminService,
};
use pls_core::{AppError, Principal};
use pls_domain::{
    BOOTSTRAP_ADMIN_ROLE, Grantee, MembershipWindow, NewPermissionInstance, PLS_SYSTEM,
    PermissionDefinition,
};

use super::InMemoryPlsStore;

struct Harness {
    store: Arc<InMemoryPlsStore>,
    authorization: AuthorizationService,
    admin: SecurityAdminService,
    root: Principal,
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn principal(subject: &str) -> Principal {
    let Ok(principal) = Principal::new(subject) else {
        panic!("test principal must be valid");
    };
    principal
}

fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> MembershipWindow {
    let Ok(window) = MembershipWindow::new(start, end) else {
        panic!("test window must be ordered");
    };
    window
}

fn long_window() -> MembershipWindow {
    window(date(2024, 1, 1), date(2099, 1, 1))
}

fn instance(system_id: &str, permission_id: &str, scope: Option<&str>) -> NewPermissionInstance {
    let Ok(instance) =
        NewPermissionInstance::new(system_id, permission_id, scope.map(str::to_owned))
    else {
        panic!("test instance must be valid");
    };
    instance
}

fn role_grantee(role_id: &str) -> Grantee {
    Grantee::Role(role_id.to_owned())
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryPlsStore::new());
    let authorization = AuthorizationService::new(store.clone());
    let admin = SecurityAdminService::new(
        authorization.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );

    let bootstrapped = admin.bootstrap_administrator("root").await;
    assert!(matches!(bootstrapped, Ok(true)));

    Harness {
        store,
        authorization,
        admin,
        root: principal("root"),
    }
}

impl Harness {
    async fn create_role(&self, role_id: &str) {
        let created = self
            .admin
            .create_role(
                &self.root,
                CreateRoleInput {
                    role_id: role_id.to_owned(),
                    display_name: role_id.to_owned(),
                    description: String::new(),
                    owner_role_id: BOOTSTRAP_ADMIN_ROLE.to_owned(),
                },
            )
            .await;
        assert!(created.is_ok(), "role '{role_id}' must be created");
    }

    async fn add_member(&self, role_id: &str, identity: &str) -> uuid::Uuid {
        let Ok(membership) = self
            .admin
            .add_member(&self.root, role_id, identity, long_window())
            .await
        else {
            panic!("membership must be added");
        };
        membership.membership_id
    }

    async fn define(&self, system_id: &str, permission_id: &str, has_scope: bool) {
        if !self
            .admin
            .list_systems()
            .await
            .unwrap_or_default()
            .iter()
            .any(|existing| existing == system_id)
        {
            assert!(self.admin.create_system(&self.root, system_id).await.is_ok());
        }

        let defined = self
            .admin
            .create_permission_definition(
                &self.root,
                PermissionDefinition {
                    system_id: system_id.to_owned(),
                    permission_id: permission_id.to_owned(),
                    has_scope,
                },
            )
            .await;
        assert!(defined.is_ok());
    }

    async fn grant(
        &self,
        role_id: &str,
        system_id: &str,
        permission_id: &str,
        scope: Option<&str>,
    ) -> uuid::Uuid {
        let Ok(created) = self
            .admin
            .create_permission_instance(
                &self.root,
                instance(system_id, permission_id, scope),
                role_grantee(role_id),
            )
            .await
        else {
            panic!("grant must succeed");
        };
        created.instance_id
    }
}

#[tokio::test]
async fn superrole_grants_reach_members_of_subroles() {
    let harness = harness().await;
    harness.create_role("sys-admin").await;
    harness.create_role("project-lead").await;
    assert!(
        harness
            .admin
            .add_subrole(&harness.root, "sys-admin", "project-lead")
            .await
            .is_ok()
    );
    harness.grant("sys-admin", PLS_SYSTEM, "system", Some("*")).await;
    harness.add_member("project-lead", "u1").await;

    let scopes = harness
        .authorization
        .get_scopes("u1", PLS_SYSTEM, "system")
        .await;
    assert_eq!(scopes.ok(), Some(vec!["*".to_owned()]));

    let allowed = harness
        .authorization
        .has_scope("u1", PLS_SYSTEM, "system", "wiki")
        .await;
    assert!(matches!(allowed, Ok(true)));

    let before_membership = harness
        .authorization
        .effective_permission_instances("u1", PLS_SYSTEM, date(2023, 6, 1))
        .await;
    assert!(before_membership.is_ok_and(|effective| effective.is_empty()));
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let harness = harness().await;

    let again = harness.admin.bootstrap_administrator("root").await;
    assert!(matches!(again, Ok(false)));

    let members = harness
        .admin
        .list_members(BOOTSTRAP_ADMIN_ROLE, MemberListQuery::default())
        .await;
    assert!(members.is_ok_and(|members| members.len() == 1));
}

#[tokio::test]
async fn created_role_is_editable_by_its_owner_only() {
    let harness = harness().await;
    harness.create_role("leads").await;
    harness.add_member("leads", "lead").await;
    harness
        .grant("leads", PLS_SYSTEM, "create-role", None)
        .await;
    let lead = principal("lead");

    let created = harness
        .admin
        .create_role(
            &lead,
            CreateRoleInput {
                role_id: "interns".to_owned(),
                display_name: "Interns".to_owned(),
                description: String::new(),
                owner_role_id: "leads".to_owned(),
            },
        )
        .await;
    assert!(created.is_ok());

    let added = harness
        .admin
        .add_member(&lead, "interns", "intern-1", long_window())
        .await;
    assert!(added.is_ok());

    let foreign = harness
        .admin
        .add_member(&lead, BOOTSTRAP_ADMIN_ROLE, "intruder", long_window())
        .await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    let unowned = harness
        .admin
        .create_role(
            &lead,
            CreateRoleInput {
                role_id: "mallory".to_owned(),
                display_name: "Mallory".to_owned(),
                description: String::new(),
                owner_role_id: BOOTSTRAP_ADMIN_ROLE.to_owned(),
            },
        )
        .await;
    assert!(matches!(unowned, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn role_with_dependents_cannot_be_deleted() {
    let harness = harness().await;
    harness.create_role("editors").await;
    let membership_id = harness.add_member("editors", "u1").await;

    let blocked = harness.admin.delete_role(&harness.root, "editors").await;
    assert!(matches!(blocked, Err(AppError::Conflict(message)) if message.contains("members")));

    assert!(
        harness
            .admin
            .remove_member(&harness.root, "editors", membership_id)
            .await
            .is_ok()
    );
    assert!(harness.admin.delete_role(&harness.root, "editors").await.is_ok());

    let owner_grants = harness
        .store
        .list_grants(&role_grantee(BOOTSTRAP_ADMIN_ROLE))
        .await
        .unwrap_or_default();
    assert!(
        owner_grants
            .iter()
            .all(|grant| grant.scope.as_deref() != Some("editors"))
    );
}

#[tokio::test]
async fn deleting_a_subrole_drops_its_superrole_edges() {
    let harness = harness().await;
    harness.create_role("parent").await;
    harness.create_role("child").await;
    assert!(
        harness
            .admin
            .add_subrole(&harness.root, "parent", "child")
            .await
            .is_ok()
    );

    let blocked = harness.admin.delete_role(&harness.root, "parent").await;
    assert!(matches!(blocked, Err(AppError::Conflict(message)) if message.contains("subroles")));

    assert!(harness.admin.delete_role(&harness.root, "child").await.is_ok());
    assert!(harness.admin.delete_role(&harness.root, "parent").await.is_ok());
}

#[tokio::test]
async fn revoke_removes_instance_from_every_grantee() {
    let harness = harness().await;
    harness.define("wiki", "edit", true).await;
    harness.create_role("a").await;
    harness.create_role("b").await;
    harness.add_member("a", "alice").await;
    harness.add_member("b", "bob").await;

    let first = harness.grant("a", "wiki", "edit", Some("docs")).await;
    let second = harness.grant("b", "wiki", "edit", Some("docs")).await;
    assert_eq!(first, second);

    assert!(harness.admin.revoke_permission(&harness.root, first).await.is_ok());

    for identity in ["alice", "bob"] {
        let allowed = harness
            .authorization
            .check_permission(identity, "wiki", "edit")
            .await;
        assert!(matches!(allowed, Ok(false)));
    }
}

#[tokio::test]
async fn removing_the_last_grant_deletes_the_instance() {
    let harness = harness().await;
    harness.define("wiki", "read", false).await;
    harness.create_role("a").await;
    harness.create_role("b").await;

    let instance_id = harness.grant("a", "wiki", "read", None).await;
    assert!(
        harness
            .admin
            .grant_instance(&harness.root, instance_id, role_grantee("b"))
            .await
            .is_ok()
    );

    assert!(
        harness
            .admin
            .remove_grant(&harness.root, instance_id, role_grantee("a"))
            .await
            .is_ok()
    );
    let still_held = harness.store.find_permission_instance(instance_id).await;
    assert!(matches!(still_held, Ok(Some(_))));

    assert!(
        harness
            .admin
            .remove_grant(&harness.root, instance_id, role_grantee("b"))
            .await
            .is_ok()
    );
    let orphaned = harness.store.find_permission_instance(instance_id).await;
    assert!(matches!(orphaned, Ok(None)));
}

#[tokio::test]
async fn scope_mismatch_is_rejected_without_side_effects() {
    let harness = harness().await;
    harness.define("wiki", "edit", true).await;
    harness.create_role("a").await;

    let unscoped = harness
        .admin
        .create_permission_instance(
            &harness.root,
            instance("wiki", "edit", None),
            role_grantee("a"),
        )
        .await;
    assert!(matches!(unscoped, Err(AppError::InvariantViolation(_))));

    let missing_role = harness
        .admin
        .create_permission_instance(
            &harness.root,
            instance("wiki", "edit", Some("docs")),
            role_grantee("ghost"),
        )
        .await;
    assert!(matches!(missing_role, Err(AppError::NotFound(_))));

    let state = harness.store.state.read().await;
    assert!(
        state
            .instances
            .values()
            .all(|instance| instance.system_id != "wiki")
    );
}

#[tokio::test]
async fn removing_scope_merges_instances() {
    let harness = harness().await;
    harness.define("wiki", "edit", true).await;
    harness.create_role("a").await;
    harness.create_role("b").await;
    harness.add_member("a", "alice").await;
    harness.add_member("b", "bob").await;
    harness.grant("a", "wiki", "edit", Some("docs")).await;
    harness.grant("b", "wiki", "edit", Some("blog")).await;

    assert!(
        harness
            .admin
            .remove_scope_from_permission(&harness.root, "wiki", "edit")
            .await
            .is_ok()
    );

    let a_grants = harness.store.list_grants(&role_grantee("a")).await.unwrap_or_default();
    let b_grants = harness.store.list_grants(&role_grantee("b")).await.unwrap_or_default();
    assert_eq!(a_grants.len(), 1);
    assert_eq!(a_grants, b_grants);
    assert_eq!(a_grants[0].scope, None);

    let allowed = harness
        .authorization
        .check_permission("bob", "wiki", "edit")
        .await;
    assert!(matches!(allowed, Ok(true)));
    let scopes = harness
        .authorization
        .get_scopes("bob", "wiki", "edit")
        .await;
    assert_eq!(scopes.ok(), Some(Vec::new()));
}

#[tokio::test]
async fn adding_scope_defaults_unscoped_instances() {
    let harness = harness().await;
    harness.define("wiki", "edit", false).await;
    harness.create_role("a").await;
    harness.add_member("a", "alice").await;
    harness.grant("a", "wiki", "edit", None).await;

    assert!(
        harness
            .admin
            .add_scope_to_permission(&harness.root, "wiki", "edit", "docs")
            .await
            .is_ok()
    );

    let scopes = harness
        .authorization
        .get_scopes("alice", "wiki", "edit")
        .await;
    assert_eq!(scopes.ok(), Some(vec!["docs".to_owned()]));
}

#[tokio::test]
async fn system_with_definitions_cannot_be_deleted() {
    let harness = harness().await;
    harness.define("wiki", "edit", false).await;

    let blocked = harness.admin.delete_system(&harness.root, "wiki").await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    assert!(
        harness
            .admin
            .delete_permission_definition(&harness.root, "wiki", "edit")
            .await
            .is_ok()
    );
    assert!(harness.admin.delete_system(&harness.root, "wiki").await.is_ok());

    let engine = harness.admin.delete_system(&harness.root, PLS_SYSTEM).await;
    assert!(matches!(engine, Err(AppError::InvariantViolation(_))));
}

#[tokio::test]
async fn token_checks_match_prefix_names_and_record_use() {
    let harness = harness().await;
    harness.define("ci", "admin-*", false).await;

    let Ok(created) = harness
        .admin
        .create_api_token(&harness.root, "  deploy bot ")
        .await
    else {
        panic!("token must be created");
    };
    assert_eq!(created.token.description, "deploy bot");

    let granted = harness
        .admin
        .create_permission_instance(
            &harness.root,
            instance("ci", "admin-*", None),
            Grantee::ApiToken(created.token.token_id),
        )
        .await;
    assert!(granted.is_ok());

    let allowed = harness
        .authorization
        .check_token(&created.secret, "ci", "admin-deploy")
        .await;
    assert!(matches!(allowed, Ok(true)));

    let other_system = harness
        .authorization
        .check_token(&created.secret, "wiki", "admin-deploy")
        .await;
    assert!(matches!(other_system, Ok(false)));

    let unknown = harness
        .authorization
        .check_token("not-a-token", "ci", "admin-deploy")
        .await;
    assert!(matches!(unknown, Ok(false)));

    let tokens = harness.admin.list_api_tokens(&harness.root).await;
    assert!(tokens.is_ok_and(|tokens| tokens[0].last_used_at.is_some()));

    assert!(
        harness
            .admin
            .delete_api_token(&harness.root, created.token.token_id)
            .await
            .is_ok()
    );
    let revoked = harness
        .authorization
        .check_token(&created.secret, "ci", "admin-deploy")
        .await;
    assert!(matches!(revoked, Ok(false)));
}

#[tokio::test]
async fn cyclic_roles_resolve_and_share_grants() {
    let harness = harness().await;
    harness.define("wiki", "edit", false).await;
    harness.create_role("a").await;
    harness.create_role("b").await;
    for (superrole, subrole) in [("a", "b"), ("b", "a")] {
        assert!(
            harness
                .admin
                .add_subrole(&harness.root, superrole, subrole)
                .await
                .is_ok()
        );
    }
    harness.grant("a", "wiki", "edit", None).await;
    harness.add_member("b", "bob").await;

    let allowed = harness
        .authorization
        .check_permission("bob", "wiki", "edit")
        .await;
    assert!(matches!(allowed, Ok(true)));
}

#[tokio::test]
async fn indirect_members_come_from_active_descendant_memberships() {
    let harness = harness().await;
    harness.create_role("parent").await;
    harness.create_role("child").await;
    assert!(
        harness
            .admin
            .add_subrole(&harness.root, "parent", "child")
            .await
            .is_ok()
    );
    harness.add_member("child", "carol").await;
    let now = Utc::now();
    let expired = harness
        .admin
        .add_member(
            &harness.root,
            "child",
            "dave",
            window(now - Duration::days(30), now - Duration::days(1)),
        )
        .await;
    assert!(expired.is_ok());

    let direct_only = harness
        .admin
        .list_members("parent", MemberListQuery::default())
        .await;
    assert!(direct_only.is_ok_and(|members| members.is_empty()));

    let Ok(with_indirect) = harness
        .admin
        .list_members(
            "parent",
            MemberListQuery {
                include_expired: true,
                include_indirect: true,
            },
        )
        .await
    else {
        panic!("listing must succeed");
    };
    assert_eq!(with_indirect.len(), 1);
    assert_eq!(with_indirect[0].identity, "carol");
    assert!(with_indirect[0].indirect);
}

#[tokio::test]
async fn expired_membership_grants_nothing() {
    let harness = harness().await;
    harness.define("wiki", "edit", false).await;
    harness.create_role("a").await;
    harness.grant("a", "wiki", "edit", None).await;
    let now = Utc::now();
    let added = harness
        .admin
        .add_member(
            &harness.root,
            "a",
            "eve",
            window(now - Duration::days(10), now - Duration::days(5)),
        )
        .await;
    assert!(added.is_ok());

    let allowed = harness
        .authorization
        .check_permission("eve", "wiki", "edit")
        .await;
    assert!(matches!(allowed, Ok(false)));
}
