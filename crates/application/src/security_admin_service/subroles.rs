use chrono::Utc;
use pls_domain::{RoleEdge, validate_role_id};

use super::*;

use crate::RoleOverview;

impl SecurityAdminService {
    /// Lists direct subroles of a role.
    pub async fn list_subroles(&self, role_id: &str) -> AppResult<Vec<RoleOverview>> {
        self.roles.list_subroles(role_id, Utc::now()).await
    }

    /// Places `subrole_id` under `role_id`. Idempotent.
    pub async fn add_subrole(
        &self,
        actor: &Principal,
        role_id: &str,
        subrole_id: &str,
    ) -> AppResult<()> {
        validate_role_id(subrole_id)?;
        self.require_role_scope(actor, role_id).await?;

        self.roles
            .add_subrole(&RoleEdge::new(role_id, subrole_id))
            .await?;
        tracing::info!(actor = %actor.subject(), role_id, subrole_id, "added subrole");
        Ok(())
    }

    /// Removes the edge between `role_id` and `subrole_id`.
    pub async fn remove_subrole(
        &self,
        actor: &Principal,
        role_id: &str,
        subrole_id: &str,
    ) -> AppResult<()> {
        self.require_role_scope(actor, role_id).await?;

        self.roles
            .remove_subrole(&RoleEdge::new(role_id, subrole_id))
            .await?;
        tracing::info!(actor = %actor.subject(), role_id, subrole_id, "removed subrole");
        Ok(())
    }
}
