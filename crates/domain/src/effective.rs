use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{RoleGraph, RoleGrant, permission_name_matches, scope_matches};

/// One effective `(permission, scope)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantedPermission {
    /// Permission name.
    pub permission_id: String,
    /// Optional scope.
    pub scope: Option<String>,
}

impl GrantedPermission {
    /// Creates a granted pair.
    #[must_use]
    pub fn new(permission_id: impl Into<String>, scope: Option<String>) -> Self {
        Self {
            permission_id: permission_id.into(),
            scope,
        }
    }
}

/// Listing entry: one permission with every scope it is held for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionScopes {
    /// Permission name.
    pub permission_id: String,
    /// Held scopes; empty for unscoped permissions.
    pub scopes: Vec<String>,
}

/// Effective permission set of one grantee within one system.
///
/// Role-based and token-based grants share this type, so both paths use the
/// same scope-matching law.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissions {
    grants: BTreeSet<GrantedPermission>,
}

impl EffectivePermissions {
    /// Collects granted pairs.
    #[must_use]
    pub fn from_grants(grants: impl IntoIterator<Item = GrantedPermission>) -> Self {
        Self {
            grants: grants.into_iter().collect(),
        }
    }

    /// Resolves the permissions implied by directly held roles.
    ///
    /// Every directly held role is expanded to its ancestor closure and every
    /// grant held by a role in that closure is kept.
    #[must_use]
    pub fn resolve<'a>(
        direct_roles: impl IntoIterator<Item = &'a str>,
        graph: &RoleGraph,
        grants: impl IntoIterator<Item = RoleGrant>,
    ) -> Self {
        let held_roles = graph.ancestors_of_all(direct_roles);

        Self::from_grants(
            grants
                .into_iter()
                .filter(|grant| held_roles.contains(&grant.role_id))
                .map(|grant| GrantedPermission::new(grant.permission_id, grant.scope)),
        )
    }

    /// Returns every effective pair in order.
    pub fn iter(&self) -> impl Iterator<Item = &GrantedPermission> {
        self.grants.iter()
    }

    /// Returns whether no permission is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Whether `permission_id` is held for any scope.
    #[must_use]
    pub fn has_permission(&self, permission_id: &str) -> bool {
        self.grants
            .iter()
            .any(|grant| grant.permission_id == permission_id)
    }

    /// Scopes held for `permission_id`. Unscoped grants contribute nothing.
    #[must_use]
    pub fn scopes(&self, permission_id: &str) -> Vec<String> {
        self.grants
            .iter()
            .filter(|grant| grant.permission_id == permission_id)
            .filter_map(|grant| grant.scope.clone())
            .collect()
    }

    /// Whether `permission_id` is held for `requested_scope`, honoring `*`.
    #[must_use]
    pub fn allows_scope(&self, permission_id: &str, requested_scope: &str) -> bool {
        self.grants.iter().any(|grant| {
            grant.permission_id == permission_id
                && grant
                    .scope
                    .as_deref()
                    .is_some_and(|scope| scope_matches(scope, requested_scope))
        })
    }

    /// Whether any held permission name matches `permission_id`, allowing a
    /// trailing `*` on stored names.
    #[must_use]
    pub fn matches_permission_name(&self, permission_id: &str) -> bool {
        self.grants
            .iter()
            .any(|grant| permission_name_matches(grant.permission_id.as_str(), permission_id))
    }

    /// Lists held permissions with their scopes, ordered by permission.
    #[must_use]
    pub fn listing(&self) -> Vec<PermissionScopes> {
        let mut by_permission: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for grant in &self.grants {
            let scopes = by_permission
                .entry(grant.permission_id.as_str())
                .or_default();
            if let Some(scope) = &grant.scope {
                scopes.push(scope.clone());
            }
        }

        by_permission
            .into_iter()
            .map(|(permission_id, scopes)| PermissionScopes {
                permission_id: permission_id.to_owned(),
                scopes,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{EffectivePermissions, GrantedPermission};
    use crate::{RoleEdge, RoleGrant, RoleGraph};

    fn grant(role_id: &str, permission_id: &str, scope: Option<&str>) -> RoleGrant {
        RoleGrant {
            role_id: role_id.to_owned(),
            permission_id: permission_id.to_owned(),
            scope: scope.map(str::to_owned),
        }
    }

    #[test]
    fn resolve_collects_grants_of_ancestor_roles() {
        let graph = RoleGraph::from_edges(&[RoleEdge::new("sys-admin", "project-lead")]);
        let grants = vec![
            grant("sys-admin", "system", Some("*")),
            grant("unrelated", "create-role", None),
        ];

        let effective = EffectivePermissions::resolve(["project-lead"], &graph, grants);

        assert!(effective.has_permission("system"));
        assert!(!effective.has_permission("create-role"));
        assert_eq!(effective.scopes("system"), vec!["*".to_owned()]);
    }

    #[test]
    fn resolve_without_roles_is_empty() {
        let effective = EffectivePermissions::resolve(
            Vec::<&str>::new(),
            &RoleGraph::default(),
            vec![grant("dfunk", "role", Some("dfunk"))],
        );

        assert!(effective.is_empty());
        assert!(effective.scopes("role").is_empty());
    }

    #[test]
    fn wildcard_scope_allows_never_granted_values() {
        let effective = EffectivePermissions::from_grants([GrantedPermission::new(
            "role",
            Some("*".to_owned()),
        )]);

        for requested in ["dfunk", "drek", "a-role-that-does-not-exist"] {
            assert!(effective.allows_scope("role", requested));
        }
        assert!(!effective.allows_scope("system", "dfunk"));
    }

    #[test]
    fn exact_scope_only_allows_itself() {
        let effective = EffectivePermissions::from_grants([GrantedPermission::new(
            "role",
            Some("dfunk".to_owned()),
        )]);

        assert!(effective.allows_scope("role", "dfunk"));
        assert!(!effective.allows_scope("role", "drek"));
    }

    #[test]
    fn listing_groups_scopes_per_permission() {
        let effective = EffectivePermissions::from_grants([
            GrantedPermission::new("role", Some("drek".to_owned())),
            GrantedPermission::new("role", Some("dfunk".to_owned())),
            GrantedPermission::new("create-role", None),
        ]);

        let listing = effective.listing();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].permission_id, "create-role");
        assert!(listing[0].scopes.is_empty());
        assert_eq!(listing[1].scopes, vec!["dfunk".to_owned(), "drek".to_owned()]);
    }

    #[test]
    fn name_wildcard_is_separate_from_scope_wildcard() {
        let effective =
            EffectivePermissions::from_grants([GrantedPermission::new("read-*", None)]);

        assert!(effective.matches_permission_name("read-members"));
        assert!(!effective.has_permission("read-members"));
    }
}
