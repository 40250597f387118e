use async_trait::async_trait;
use pls_application::{AdministratorBootstrap, RoleRepository};
use pls_domain::{DependentRelation, RoleUpdate};

use super::*;

#[async_trait]
impl RoleRepository for InMemoryPlsStore {
    async fn list_roles(&self, at: DateTime<Utc>) -> AppResult<Vec<RoleOverview>> {
        let state = self.state.read().await;
        let mut roles: Vec<RoleOverview> = state
            .roles
            .values()
            .map(|role| state.overview(role, at))
            .collect();
        roles.sort_by(|left, right| {
            (left.role.display_name(), left.role.role_id())
                .cmp(&(right.role.display_name(), right.role.role_id()))
        });

        Ok(roles)
    }

    async fn find_role(
        &self,
        role_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Option<RoleOverview>> {
        let state = self.state.read().await;
        Ok(state.roles.get(role_id).map(|role| state.overview(role, at)))
    }

    async fn list_role_ids(&self) -> AppResult<Vec<String>> {
        Ok(self.state.read().await.roles.keys().cloned().collect())
    }

    async fn create_role(&self, role: &Role, owner_role_id: &str) -> AppResult<()> {
        let role = role.clone();
        let owner_role_id = owner_role_id.to_owned();

        self.transact(move |state| {
            if state.roles.contains_key(role.role_id()) {
                return Err(AppError::Conflict(format!(
                    "role '{}' already exists",
                    role.role_id()
                )));
            }
            state.roles.insert(role.role_id().to_owned(), role.clone());

            let instance = state.upsert_instance(&NewPermissionInstance::new(
                PLS_SYSTEM,
                SelfPermission::Role.as_str(),
                Some(role.role_id().to_owned()),
            )?)?;
            state.link(instance.instance_id, &Grantee::Role(owner_role_id))
        })
        .await
    }

    async fn update_role(&self, role_id: &str, update: &RoleUpdate) -> AppResult<Role> {
        let mut state = self.state.write().await;
        let role = state
            .roles
            .get_mut(role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        *role = role.apply(update)?;
        Ok(role.clone())
    }

    async fn delete_role(&self, role_id: &str) -> AppResult<()> {
        let role_id = role_id.to_owned();

        self.transact(move |state| {
            if !state.roles.contains_key(&role_id) {
                return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
            }

            state.edges.retain(|edge| edge.subrole_id != role_id);

            let blocking = if state.edges.iter().any(|edge| edge.superrole_id == role_id) {
                Some(DependentRelation::Subroles)
            } else if state
                .memberships
                .values()
                .any(|membership| membership.role_id == role_id)
            {
                Some(DependentRelation::Members)
            } else if state
                .role_grants
                .iter()
                .any(|(granted_role, _)| *granted_role == role_id)
            {
                Some(DependentRelation::Permissions)
            } else {
                None
            };
            if let Some(relation) = blocking {
                return Err(AppError::Conflict(relation.blocking_message(&role_id)));
            }

            state.roles.remove(&role_id);

            let bootstrap_instances: Vec<Uuid> = state
                .instances
                .values()
                .filter(|instance| {
                    instance.system_id == PLS_SYSTEM
                        && instance.permission_id == SelfPermission::Role.as_str()
                        && instance.scope.as_deref() == Some(role_id.as_str())
                })
                .map(|instance| instance.instance_id)
                .collect();
            for instance_id in bootstrap_instances {
                state.remove_instance(instance_id);
            }

            Ok(())
        })
        .await
    }

    async fn list_subroles(
        &self,
        role_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<RoleOverview>> {
        let state = self.state.read().await;
        let mut subroles: Vec<RoleOverview> = state
            .edges
            .iter()
            .filter(|edge| edge.superrole_id == role_id)
            .filter_map(|edge| state.roles.get(&edge.subrole_id))
            .map(|role| state.overview(role, at))
            .collect();
        subroles.sort_by(|left, right| {
            (left.role.display_name(), left.role.role_id())
                .cmp(&(right.role.display_name(), right.role.role_id()))
        });

        Ok(subroles)
    }

    async fn list_role_edges(&self) -> AppResult<Vec<RoleEdge>> {
        Ok(self.state.read().await.edges.iter().cloned().collect())
    }

    async fn add_subrole(&self, edge: &RoleEdge) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&edge.superrole_id)
            || !state.roles.contains_key(&edge.subrole_id)
        {
            return Err(AppError::NotFound(format!(
                "role '{}' or '{}' does not exist",
                edge.superrole_id, edge.subrole_id
            )));
        }

        state.edges.insert(edge.clone());
        Ok(())
    }

    async fn remove_subrole(&self, edge: &RoleEdge) -> AppResult<()> {
        if self.state.write().await.edges.remove(edge) {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "role '{}' is not a subrole of '{}'",
            edge.subrole_id, edge.superrole_id
        )))
    }

    async fn ensure_administrator(&self, input: &AdministratorBootstrap) -> AppResult<bool> {
        let input = input.clone();

        self.transact(move |state| {
            let role_id = input.role.role_id().to_owned();
            state
                .roles
                .entry(role_id.clone())
                .or_insert_with(|| input.role.clone());

            let grantee = Grantee::Role(role_id.clone());
            for grant in &input.grants {
                let instance = state.upsert_instance(grant)?;
                state.link(instance.instance_id, &grantee)?;
            }

            let at = input.window.start();
            let has_active_membership = state.memberships.values().any(|membership| {
                membership.role_id == role_id
                    && membership.identity == input.identity
                    && membership.is_active_at(at)
            });
            if has_active_membership {
                return Ok(false);
            }

            let membership = Membership {
                membership_id: Uuid::new_v4(),
                role_id,
                identity: input.identity.clone(),
                window: input.window,
                modified_by: "bootstrap".to_owned(),
                modified_at: at,
            };
            state
                .memberships
                .insert(membership.membership_id, membership);

            Ok(true)
        })
        .await
    }
}
