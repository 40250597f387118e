use async_trait::async_trait;
use pls_application::{MembershipRepository, NewMembership};
use pls_domain::MembershipUpdate;

use super::*;

#[async_trait]
impl MembershipRepository for InMemoryPlsStore {
    async fn add_membership(
        &self,
        input: NewMembership,
        at: DateTime<Utc>,
    ) -> AppResult<Membership> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&input.role_id) {
            return Err(AppError::NotFound(format!(
                "role '{}' does not exist",
                input.role_id
            )));
        }

        let membership = Membership {
            membership_id: Uuid::new_v4(),
            role_id: input.role_id,
            identity: input.identity,
            window: input.window,
            modified_by: input.granted_by,
            modified_at: at,
        };
        state
            .memberships
            .insert(membership.membership_id, membership.clone());

        Ok(membership)
    }

    async fn update_membership(
        &self,
        role_id: &str,
        membership_id: Uuid,
        update: &MembershipUpdate,
        modified_by: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Membership> {
        let mut state = self.state.write().await;
        let membership = state
            .memberships
            .get_mut(&membership_id)
            .filter(|membership| membership.role_id == role_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "membership '{membership_id}' of role '{role_id}' does not exist"
                ))
            })?;

        membership.window = membership.window.apply(update)?;
        membership.modified_by = modified_by.to_owned();
        membership.modified_at = at;

        Ok(membership.clone())
    }

    async fn remove_membership(&self, role_id: &str, membership_id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        let belongs_to_role = state
            .memberships
            .get(&membership_id)
            .is_some_and(|membership| membership.role_id == role_id);
        if !belongs_to_role {
            return Err(AppError::NotFound(format!(
                "membership '{membership_id}' of role '{role_id}' does not exist"
            )));
        }

        state.memberships.remove(&membership_id);
        Ok(())
    }

    async fn list_memberships(&self, role_ids: &[String]) -> AppResult<Vec<Membership>> {
        let state = self.state.read().await;
        let mut memberships: Vec<Membership> = state
            .memberships
            .values()
            .filter(|membership| role_ids.contains(&membership.role_id))
            .cloned()
            .collect();
        memberships.sort_by(|left, right| {
            (&left.identity, left.window.start()).cmp(&(&right.identity, right.window.start()))
        });

        Ok(memberships)
    }
}
