use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pls_core::AppResult;
use pls_domain::{EffectivePermissions, PermissionScopes, RoleGraph};

use crate::AuthorizationRepository;

mod guards;
mod tokens;

#[cfg(test)]
mod tests;

/// Application service resolving effective permissions.
///
/// Every query reads its inputs once and derives the answer from one
/// [`EffectivePermissions`] value, so answers for one request never mix
/// snapshots.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Roles the identity holds directly through memberships active at `at`.
    pub async fn active_roles_of(
        &self,
        identity: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        let inputs = self.repository.load_role_inputs(identity, at).await?;
        Ok(inputs.direct_roles)
    }

    /// Roles the identity holds at `at`, directly or through superroles.
    pub async fn held_roles(
        &self,
        identity: &str,
        at: DateTime<Utc>,
    ) -> AppResult<BTreeSet<String>> {
        let inputs = self.repository.load_role_inputs(identity, at).await?;
        let graph = RoleGraph::from_edges(&inputs.role_edges);

        Ok(graph.ancestors_of_all(inputs.direct_roles.iter().map(String::as_str)))
    }

    /// Effective permission instances of an identity within one system.
    pub async fn effective_permission_instances(
        &self,
        identity: &str,
        system_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<EffectivePermissions> {
        let inputs = self
            .repository
            .load_resolution_inputs(identity, system_id, at)
            .await?;
        let graph = RoleGraph::from_edges(&inputs.roles.role_edges);

        Ok(EffectivePermissions::resolve(
            inputs.roles.direct_roles.iter().map(String::as_str),
            &graph,
            inputs.grants,
        ))
    }

    /// Whether the identity holds `permission_id` for any scope right now.
    pub async fn check_permission(
        &self,
        identity: &str,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<bool> {
        let effective = self
            .effective_permission_instances(identity, system_id, Utc::now())
            .await?;
        Ok(effective.has_permission(permission_id))
    }

    /// Whether the identity holds `permission_id` for `scope`, honoring `*`.
    pub async fn has_scope(
        &self,
        identity: &str,
        system_id: &str,
        permission_id: &str,
        scope: &str,
    ) -> AppResult<bool> {
        let effective = self
            .effective_permission_instances(identity, system_id, Utc::now())
            .await?;
        Ok(effective.allows_scope(permission_id, scope))
    }

    /// Scopes held for `permission_id`. `*` is returned verbatim.
    pub async fn get_scopes(
        &self,
        identity: &str,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<Vec<String>> {
        let effective = self
            .effective_permission_instances(identity, system_id, Utc::now())
            .await?;
        Ok(effective.scopes(permission_id))
    }

    /// Every held permission of one system with its scopes.
    pub async fn list_permissions(
        &self,
        identity: &str,
        system_id: &str,
    ) -> AppResult<Vec<PermissionScopes>> {
        let effective = self
            .effective_permission_instances(identity, system_id, Utc::now())
            .await?;
        Ok(effective.listing())
    }

    /// Subset of `permission_ids` the identity holds, in request order.
    pub async fn filter_permissions(
        &self,
        identity: &str,
        system_id: &str,
        permission_ids: &[String],
    ) -> AppResult<Vec<String>> {
        let effective = self
            .effective_permission_instances(identity, system_id, Utc::now())
            .await?;

        Ok(permission_ids
            .iter()
            .filter(|permission_id| effective.matches_permission_name(permission_id))
            .cloned()
            .collect())
    }
}
