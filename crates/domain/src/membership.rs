use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pls_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive time window during which a membership is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl MembershipWindow {
    /// Creates a window, rejecting one that ends before it starts.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if end < start {
            return Err(AppError::Validation(format!(
                "membership end '{}' is before its start '{}'",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }

        Ok(Self { start, end })
    }

    /// Returns the first active instant.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the last active instant.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `start <= at <= end`.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Applies a partial update and revalidates the result.
    pub fn apply(&self, update: &MembershipUpdate) -> AppResult<Self> {
        Self::new(
            update.start.unwrap_or(self.start),
            update.end.unwrap_or(self.end),
        )
    }
}

/// Partial membership update; `None` leaves the bound unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipUpdate {
    /// Replacement start.
    pub start: Option<DateTime<Utc>>,
    /// Replacement end.
    pub end: Option<DateTime<Utc>>,
}

impl MembershipUpdate {
    /// Returns whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// One stored binding of an external identity to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Stable membership row id.
    pub membership_id: Uuid,
    /// Role the identity is bound to.
    pub role_id: String,
    /// External identity.
    pub identity: String,
    /// Active window.
    pub window: MembershipWindow,
    /// Identity that created or last modified the row.
    pub modified_by: String,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
}

impl Membership {
    /// Returns whether this row is active at `at`.
    #[must_use]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.window.contains(at)
    }
}

/// Member listing row.
///
/// Indirect members have no single authoritative row, so they carry no
/// membership id and their window spans every contributing membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMember {
    /// Membership row id, absent for indirect members.
    pub membership_id: Option<Uuid>,
    /// External identity.
    pub identity: String,
    /// Identity that last modified the row, absent for indirect members.
    pub modified_by: Option<String>,
    /// Latest modification among contributing rows.
    pub modified_at: DateTime<Utc>,
    /// Earliest start among contributing rows.
    pub start: DateTime<Utc>,
    /// Latest end among contributing rows.
    pub end: DateTime<Utc>,
    /// Whether membership comes from a descendant role.
    pub indirect: bool,
}

impl From<Membership> for RoleMember {
    fn from(value: Membership) -> Self {
        Self {
            membership_id: Some(value.membership_id),
            identity: value.identity,
            modified_by: Some(value.modified_by),
            modified_at: value.modified_at,
            start: value.window.start(),
            end: value.window.end(),
            indirect: false,
        }
    }
}

/// Builds a member listing.
///
/// Direct rows are kept one per membership, filtered to active ones unless
/// `include_expired`. Rows from descendant roles are always filtered to
/// active ones and collapse to one indirect entry per identity.
#[must_use]
pub fn collect_role_members(
    direct: Vec<Membership>,
    descendant: Vec<Membership>,
    include_expired: bool,
    at: DateTime<Utc>,
) -> Vec<RoleMember> {
    let mut members: Vec<RoleMember> = direct
        .into_iter()
        .filter(|membership| include_expired || membership.is_active_at(at))
        .map(RoleMember::from)
        .collect();
    members.sort_by(|left, right| left.identity.cmp(&right.identity));

    let mut indirect: BTreeMap<String, RoleMember> = BTreeMap::new();
    for membership in descendant
        .into_iter()
        .filter(|membership| membership.is_active_at(at))
    {
        indirect
            .entry(membership.identity.clone())
            .and_modify(|member| {
                member.start = member.start.min(membership.window.start());
                member.end = member.end.max(membership.window.end());
                member.modified_at = member.modified_at.max(membership.modified_at);
            })
            .or_insert_with(|| RoleMember {
                membership_id: None,
                identity: membership.identity.clone(),
                modified_by: None,
                modified_at: membership.modified_at,
                start: membership.window.start(),
                end: membership.window.end(),
                indirect: true,
            });
    }

    members.extend(indirect.into_values());
    members
}
