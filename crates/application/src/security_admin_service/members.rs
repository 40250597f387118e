use chrono::Utc;
use pls_domain::{
    Membership, MembershipUpdate, MembershipWindow, RoleGraph, RoleMember, collect_role_members,
};

use super::*;

use crate::{MemberListQuery, NewMembership};

impl SecurityAdminService {
    /// Lists members of a role, optionally with expired rows and members of
    /// descendant roles.
    pub async fn list_members(
        &self,
        role_id: &str,
        query: MemberListQuery,
    ) -> AppResult<Vec<RoleMember>> {
        let now = Utc::now();
        if self.roles.find_role(role_id, now).await?.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        let direct = self
            .memberships
            .list_memberships(&[role_id.to_owned()])
            .await?;

        let descendant = if query.include_indirect {
            let graph = RoleGraph::from_edges(&self.roles.list_role_edges().await?);
            let descendants: Vec<String> = graph
                .descendants_of(role_id)
                .into_iter()
                .filter(|descendant| descendant != role_id)
                .collect();

            if descendants.is_empty() {
                Vec::new()
            } else {
                self.memberships.list_memberships(&descendants).await?
            }
        } else {
            Vec::new()
        };

        Ok(collect_role_members(
            direct,
            descendant,
            query.include_expired,
            now,
        ))
    }

    /// Binds an identity to a role for a time window.
    pub async fn add_member(
        &self,
        actor: &Principal,
        role_id: &str,
        identity: &str,
        window: MembershipWindow,
    ) -> AppResult<Membership> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AppError::Validation(
                "member identity must not be empty".to_owned(),
            ));
        }
        self.require_role_scope(actor, role_id).await?;

        let membership = self
            .memberships
            .add_membership(
                NewMembership {
                    role_id: role_id.to_owned(),
                    identity: identity.to_owned(),
                    window,
                    granted_by: actor.subject().to_owned(),
                },
                Utc::now(),
            )
            .await?;

        tracing::info!(
            actor = %actor.subject(),
            role_id,
            identity,
            membership_id = %membership.membership_id,
            "added member"
        );
        Ok(membership)
    }

    /// Changes the window of one membership row.
    pub async fn update_member(
        &self,
        actor: &Principal,
        role_id: &str,
        membership_id: Uuid,
        update: MembershipUpdate,
    ) -> AppResult<Membership> {
        self.require_role_scope(actor, role_id).await?;

        let membership = self
            .memberships
            .update_membership(role_id, membership_id, &update, actor.subject(), Utc::now())
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            role_id,
            membership_id = %membership_id,
            "updated member"
        );
        Ok(membership)
    }

    /// Deletes one membership row.
    pub async fn remove_member(
        &self,
        actor: &Principal,
        role_id: &str,
        membership_id: Uuid,
    ) -> AppResult<()> {
        self.require_role_scope(actor, role_id).await?;

        self.memberships
            .remove_membership(role_id, membership_id)
            .await?;
        tracing::info!(
            actor = %actor.subject(),
            role_id,
            membership_id = %membership_id,
            "removed member"
        );
        Ok(())
    }
}
