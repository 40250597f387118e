use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use pls_application::RoleOverview;
use pls_core::{AppError, AppResult};
use pls_domain::{
    ApiToken, Grantee, Membership, NewPermissionInstance, PLS_SYSTEM, PermissionDefinition,
    PermissionInstance, Role, RoleEdge, SelfPermission,
};
use tokio::sync::RwLock;
use uuid::Uuid;

mod api_tokens;
mod authorization;
mod members;
mod permissions;
mod roles;

#[cfg(test)]
mod tests;

/// In-memory implementation of every authorization port.
///
/// Multi-record mutations run against a copy of the state that replaces the
/// original only on success, so a failed mutation leaves nothing behind.
#[derive(Debug)]
pub struct InMemoryPlsStore {
    state: RwLock<StoreState>,
}

impl InMemoryPlsStore {
    /// Creates a store holding only the seeded `pls` system.
    #[must_use]
    pub fn new() -> Self {
        let mut state = StoreState::default();
        state.systems.insert(PLS_SYSTEM.to_owned());
        for permission in SelfPermission::all() {
            state.definitions.insert(
                (PLS_SYSTEM.to_owned(), permission.as_str().to_owned()),
                permission.has_scope(),
            );
        }

        Self {
            state: RwLock::new(state),
        }
    }

    async fn transact<T>(
        &self,
        mutation: impl FnOnce(&mut StoreState) -> AppResult<T> + Send,
    ) -> AppResult<T> {
        let mut state = self.state.write().await;
        let mut draft = state.clone();
        let result = mutation(&mut draft)?;
        *state = draft;

        Ok(result)
    }
}

impl Default for InMemoryPlsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct StoredApiToken {
    secret_hash: String,
    token: ApiToken,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    systems: BTreeSet<String>,
    definitions: BTreeMap<(String, String), bool>,
    instances: BTreeMap<Uuid, PermissionInstance>,
    roles: BTreeMap<String, Role>,
    edges: BTreeSet<RoleEdge>,
    memberships: BTreeMap<Uuid, Membership>,
    role_grants: BTreeSet<(String, Uuid)>,
    api_tokens: BTreeMap<Uuid, StoredApiToken>,
    token_grants: BTreeSet<(Uuid, Uuid)>,
}

impl StoreState {
    fn definition(
        &self,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<PermissionDefinition> {
        self.definitions
            .get(&(system_id.to_owned(), permission_id.to_owned()))
            .map(|has_scope| PermissionDefinition {
                system_id: system_id.to_owned(),
                permission_id: permission_id.to_owned(),
                has_scope: *has_scope,
            })
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "permission '{system_id}/{permission_id}' does not exist"
                ))
            })
    }

    fn upsert_instance(
        &mut self,
        instance: &NewPermissionInstance,
    ) -> AppResult<PermissionInstance> {
        self.definition(&instance.system_id, &instance.permission_id)?
            .check_instance_scope(instance.scope.as_deref())?;

        if let Some(existing) = self.instances.values().find(|existing| {
            existing.system_id == instance.system_id
                && existing.permission_id == instance.permission_id
                && existing.scope == instance.scope
        }) {
            return Ok(existing.clone());
        }

        let created = PermissionInstance {
            instance_id: Uuid::new_v4(),
            system_id: instance.system_id.clone(),
            permission_id: instance.permission_id.clone(),
            scope: instance.scope.clone(),
        };
        self.instances.insert(created.instance_id, created.clone());

        Ok(created)
    }

    fn link(&mut self, instance_id: Uuid, grantee: &Grantee) -> AppResult<()> {
        let grantee_exists = match grantee {
            Grantee::Role(role_id) => self.roles.contains_key(role_id),
            Grantee::ApiToken(token_id) => self.api_tokens.contains_key(token_id),
        };
        if !grantee_exists || !self.instances.contains_key(&instance_id) {
            return Err(AppError::NotFound(format!(
                "{} or permission instance '{instance_id}' does not exist",
                grantee.describe()
            )));
        }

        match grantee {
            Grantee::Role(role_id) => {
                self.role_grants.insert((role_id.clone(), instance_id));
            }
            Grantee::ApiToken(token_id) => {
                self.token_grants.insert((*token_id, instance_id));
            }
        }

        Ok(())
    }

    fn remove_instance(&mut self, instance_id: Uuid) -> bool {
        self.role_grants
            .retain(|(_, granted_instance)| *granted_instance != instance_id);
        self.token_grants
            .retain(|(_, granted_instance)| *granted_instance != instance_id);
        self.instances.remove(&instance_id).is_some()
    }

    fn is_granted(&self, instance_id: Uuid) -> bool {
        self.role_grants
            .iter()
            .any(|(_, granted_instance)| *granted_instance == instance_id)
            || self
                .token_grants
                .iter()
                .any(|(_, granted_instance)| *granted_instance == instance_id)
    }

    fn overview(&self, role: &Role, at: DateTime<Utc>) -> RoleOverview {
        let subrole_count = self
            .edges
            .iter()
            .filter(|edge| edge.superrole_id == role.role_id())
            .count();
        let active_member_count = self
            .memberships
            .values()
            .filter(|membership| {
                membership.role_id == role.role_id() && membership.is_active_at(at)
            })
            .count();

        RoleOverview {
            role: role.clone(),
            subrole_count: i64::try_from(subrole_count).unwrap_or(i64::MAX),
            active_member_count: i64::try_from(active_member_count).unwrap_or(i64::MAX),
        }
    }

    fn granted_instances<'a>(
        &'a self,
        instance_ids: impl Iterator<Item = Uuid> + 'a,
    ) -> Vec<PermissionInstance> {
        let mut instances: Vec<PermissionInstance> = instance_ids
            .filter_map(|instance_id| self.instances.get(&instance_id).cloned())
            .collect();
        instances.sort_by(|left, right| {
            (&left.system_id, &left.permission_id, &left.scope).cmp(&(
                &right.system_id,
                &right.permission_id,
                &right.scope,
            ))
        });

        instances
    }
}
