use async_trait::async_trait;
use pls_application::PermissionRepository;

use super::*;

impl StoreState {
    fn instance_ids_of(&self, system_id: &str, permission_id: &str) -> Vec<Uuid> {
        self.instances
            .values()
            .filter(|instance| {
                instance.system_id == system_id && instance.permission_id == permission_id
            })
            .map(|instance| instance.instance_id)
            .collect()
    }

    /// Collapses every instance of a permission into one unscoped instance,
    /// moving grants onto the survivor.
    fn merge_into_unscoped_instance(&mut self, system_id: &str, permission_id: &str) {
        let mut instances: Vec<PermissionInstance> = self
            .instances
            .values()
            .filter(|instance| {
                instance.system_id == system_id && instance.permission_id == permission_id
            })
            .cloned()
            .collect();
        instances.sort_by(|left, right| {
            (&left.scope, left.instance_id).cmp(&(&right.scope, right.instance_id))
        });

        let Some((survivor, merged)) = instances.split_first() else {
            return;
        };
        let merged: BTreeSet<Uuid> = merged.iter().map(|instance| instance.instance_id).collect();

        self.role_grants = std::mem::take(&mut self.role_grants)
            .into_iter()
            .map(|(role_id, instance_id)| {
                if merged.contains(&instance_id) {
                    (role_id, survivor.instance_id)
                } else {
                    (role_id, instance_id)
                }
            })
            .collect();
        self.token_grants = std::mem::take(&mut self.token_grants)
            .into_iter()
            .map(|(token_id, instance_id)| {
                if merged.contains(&instance_id) {
                    (token_id, survivor.instance_id)
                } else {
                    (token_id, instance_id)
                }
            })
            .collect();

        for instance_id in merged {
            self.instances.remove(&instance_id);
        }
        if let Some(instance) = self.instances.get_mut(&survivor.instance_id) {
            instance.scope = None;
        }
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPlsStore {
    async fn list_systems(&self) -> AppResult<Vec<String>> {
        Ok(self.state.read().await.systems.iter().cloned().collect())
    }

    async fn create_system(&self, system_id: &str) -> AppResult<()> {
        if self.state.write().await.systems.insert(system_id.to_owned()) {
            return Ok(());
        }

        Err(AppError::Conflict(format!(
            "system '{system_id}' already exists"
        )))
    }

    async fn delete_system(&self, system_id: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.systems.contains(system_id) {
            return Err(AppError::NotFound(format!(
                "system '{system_id}' does not exist"
            )));
        }
        if state
            .definitions
            .keys()
            .any(|(defined_system, _)| defined_system == system_id)
        {
            return Err(AppError::Conflict(format!(
                "system '{system_id}' still has permission definitions; remove them first"
            )));
        }

        state.systems.remove(system_id);
        Ok(())
    }

    async fn list_permission_definitions(
        &self,
        system_id: &str,
    ) -> AppResult<Vec<PermissionDefinition>> {
        let state = self.state.read().await;

        Ok(state
            .definitions
            .iter()
            .filter(|((defined_system, _), _)| defined_system == system_id)
            .map(|((system_id, permission_id), has_scope)| PermissionDefinition {
                system_id: system_id.clone(),
                permission_id: permission_id.clone(),
                has_scope: *has_scope,
            })
            .collect())
    }

    async fn create_permission_definition(
        &self,
        definition: &PermissionDefinition,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.systems.contains(&definition.system_id) {
            return Err(AppError::NotFound(format!(
                "system '{}' does not exist",
                definition.system_id
            )));
        }

        let key = (
            definition.system_id.clone(),
            definition.permission_id.clone(),
        );
        if state.definitions.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "permission '{}/{}' already exists",
                definition.system_id, definition.permission_id
            )));
        }

        state.definitions.insert(key, definition.has_scope);
        Ok(())
    }

    async fn delete_permission_definition(
        &self,
        system_id: &str,
        permission_id: &str,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let key = (system_id.to_owned(), permission_id.to_owned());
        if state.definitions.remove(&key).is_none() {
            return Err(AppError::NotFound(format!(
                "permission '{system_id}/{permission_id}' does not exist"
            )));
        }

        for instance_id in state.instance_ids_of(system_id, permission_id) {
            state.remove_instance(instance_id);
        }

        Ok(())
    }

    async fn set_permission_scope(
        &self,
        system_id: &str,
        permission_id: &str,
        default_scope: Option<&str>,
    ) -> AppResult<()> {
        let system_id = system_id.to_owned();
        let permission_id = permission_id.to_owned();
        let default_scope = default_scope.map(str::to_owned);

        self.transact(move |state| {
            let has_scope = state
                .definitions
                .get_mut(&(system_id.clone(), permission_id.clone()))
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "permission '{system_id}/{permission_id}' does not exist"
                    ))
                })?;
            *has_scope = default_scope.is_some();

            match default_scope {
                Some(default_scope) => {
                    for instance in state.instances.values_mut().filter(|instance| {
                        instance.system_id == system_id
                            && instance.permission_id == permission_id
                            && instance.scope.is_none()
                    }) {
                        instance.scope = Some(default_scope.clone());
                    }
                }
                None => state.merge_into_unscoped_instance(&system_id, &permission_id),
            }

            Ok(())
        })
        .await
    }

    async fn create_granted_instance(
        &self,
        instance: &NewPermissionInstance,
        grantee: &Grantee,
    ) -> AppResult<PermissionInstance> {
        let instance = instance.clone();
        let grantee = grantee.clone();

        self.transact(move |state| {
            let created = state.upsert_instance(&instance)?;
            state.link(created.instance_id, &grantee)?;
            Ok(created)
        })
        .await
    }

    async fn grant_instance(&self, instance_id: Uuid, grantee: &Grantee) -> AppResult<()> {
        self.state.write().await.link(instance_id, grantee)
    }

    async fn ungrant_instance(&self, instance_id: Uuid, grantee: &Grantee) -> AppResult<()> {
        let mut state = self.state.write().await;
        let removed = match grantee {
            Grantee::Role(role_id) => state.role_grants.remove(&(role_id.clone(), instance_id)),
            Grantee::ApiToken(token_id) => state.token_grants.remove(&(*token_id, instance_id)),
        };
        if !removed {
            return Err(AppError::NotFound(format!(
                "{} does not hold permission instance '{instance_id}'",
                grantee.describe()
            )));
        }

        if !state.is_granted(instance_id) {
            state.remove_instance(instance_id);
        }

        Ok(())
    }

    async fn find_permission_instance(
        &self,
        instance_id: Uuid,
    ) -> AppResult<Option<PermissionInstance>> {
        Ok(self.state.read().await.instances.get(&instance_id).cloned())
    }

    async fn revoke_permission_instance(&self, instance_id: Uuid) -> AppResult<()> {
        if self.state.write().await.remove_instance(instance_id) {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "permission instance '{instance_id}' does not exist"
        )))
    }

    async fn list_grants(&self, grantee: &Grantee) -> AppResult<Vec<PermissionInstance>> {
        let state = self.state.read().await;
        let instances = match grantee {
            Grantee::Role(role_id) => state.granted_instances(
                state
                    .role_grants
                    .iter()
                    .filter(|(granted_role, _)| granted_role == role_id)
                    .map(|(_, instance_id)| *instance_id),
            ),
            Grantee::ApiToken(token_id) => state.granted_instances(
                state
                    .token_grants
                    .iter()
                    .filter(|(granted_token, _)| granted_token == token_id)
                    .map(|(_, instance_id)| *instance_id),
            ),
        };

        Ok(instances)
    }
}
