use chrono::{TimeZone, Utc};
use pls_domain::{
    BOOTSTRAP_ADMIN_ROLE, MembershipWindow, NewPermissionInstance, PLS_SYSTEM, Role,
    WILDCARD_SCOPE,
};

use super::*;

use crate::AdministratorBootstrap;

impl SecurityAdminService {
    /// Ensures `identity` holds the administrator role with every `pls`
    /// permission. Returns whether a membership was added.
    ///
    /// Safe to run on every start.
    pub async fn bootstrap_administrator(&self, identity: &str) -> AppResult<bool> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AppError::Validation(
                "bootstrap administrator identity must not be empty".to_owned(),
            ));
        }

        let now = Utc::now();
        let end = Utc
            .with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
            .single()
            .ok_or_else(|| AppError::Internal("invalid bootstrap membership end".to_owned()))?;

        let grants = SelfPermission::all()
            .iter()
            .map(|permission| {
                let scope = permission
                    .has_scope()
                    .then(|| WILDCARD_SCOPE.to_owned());
                NewPermissionInstance::new(PLS_SYSTEM, permission.as_str(), scope)
            })
            .collect::<AppResult<Vec<_>>>()?;

        let added = self
            .roles
            .ensure_administrator(&AdministratorBootstrap {
                role: Role::new(
                    BOOTSTRAP_ADMIN_ROLE,
                    "Administrators",
                    "Seeded role holding every pls permission",
                )?,
                grants,
                identity: identity.to_owned(),
                window: MembershipWindow::new(now, end)?,
            })
            .await?;

        if added {
            tracing::info!(identity, role_id = BOOTSTRAP_ADMIN_ROLE, "bootstrapped administrator");
        }
        Ok(added)
    }
}
