use async_trait::async_trait;
use pls_application::{ApiTokenGrants, AuthorizationRepository, ResolutionInputs, RoleInputs};
use pls_domain::{GrantedPermission, RoleGrant};

use super::*;

impl StoreState {
    fn role_inputs(&self, identity: &str, at: DateTime<Utc>) -> RoleInputs {
        let direct_roles: BTreeSet<String> = self
            .memberships
            .values()
            .filter(|membership| membership.identity == identity && membership.is_active_at(at))
            .map(|membership| membership.role_id.clone())
            .collect();

        RoleInputs {
            direct_roles: direct_roles.into_iter().collect(),
            role_edges: self.edges.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryPlsStore {
    async fn load_role_inputs(&self, identity: &str, at: DateTime<Utc>) -> AppResult<RoleInputs> {
        Ok(self.state.read().await.role_inputs(identity, at))
    }

    async fn load_resolution_inputs(
        &self,
        identity: &str,
        system_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ResolutionInputs> {
        let state = self.state.read().await;

        let grants = state
            .role_grants
            .iter()
            .filter_map(|(role_id, instance_id)| {
                let instance = state.instances.get(instance_id)?;
                (instance.system_id == system_id).then(|| RoleGrant {
                    role_id: role_id.clone(),
                    permission_id: instance.permission_id.clone(),
                    scope: instance.scope.clone(),
                })
            })
            .collect();

        Ok(ResolutionInputs {
            roles: state.role_inputs(identity, at),
            grants,
        })
    }

    async fn find_api_token_grants(
        &self,
        secret_hash: &str,
        system_id: &str,
    ) -> AppResult<Option<ApiTokenGrants>> {
        let state = self.state.read().await;
        let Some(stored) = state
            .api_tokens
            .values()
            .find(|stored| stored.secret_hash == secret_hash)
        else {
            return Ok(None);
        };

        let token_id = stored.token.token_id;
        let grants = state
            .token_grants
            .iter()
            .filter(|(granted_token, _)| *granted_token == token_id)
            .filter_map(|(_, instance_id)| state.instances.get(instance_id))
            .filter(|instance| instance.system_id == system_id)
            .map(|instance| {
                GrantedPermission::new(instance.permission_id.clone(), instance.scope.clone())
            })
            .collect();

        Ok(Some(ApiTokenGrants { token_id, grants }))
    }

    async fn record_api_token_use(&self, token_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(stored) = self.state.write().await.api_tokens.get_mut(&token_id) {
            stored.token.last_used_at = Some(at);
        }

        Ok(())
    }
}
