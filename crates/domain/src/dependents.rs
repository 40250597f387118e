use std::fmt::{Display, Formatter};

/// Relation still referencing a role that is being deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependentRelation {
    /// The role is still a superrole of other roles.
    Subroles,
    /// The role still has membership rows.
    Members,
    /// The role still holds permission grants.
    Permissions,
    /// Any other referencing table, named as stored.
    Other(String),
}

impl DependentRelation {
    /// Maps a referencing table name to the relation it stores.
    #[must_use]
    pub fn from_table(table: &str) -> Self {
        match table {
            "role_edges" => Self::Subroles,
            "role_memberships" => Self::Members,
            "role_grants" => Self::Permissions,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Message telling the caller what to remove first.
    #[must_use]
    pub fn blocking_message(&self, role_id: &str) -> String {
        format!("role '{role_id}' still has {self} attached; remove them first")
    }
}

impl Display for DependentRelation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subroles => write!(formatter, "subroles"),
            Self::Members => write!(formatter, "members"),
            Self::Permissions => write!(formatter, "permissions"),
            Self::Other(table) => write!(formatter, "{table}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DependentRelation;

    #[test]
    fn known_tables_map_to_relations() {
        assert_eq!(
            DependentRelation::from_table("role_memberships"),
            DependentRelation::Members
        );
        assert_eq!(
            DependentRelation::from_table("role_grants"),
            DependentRelation::Permissions
        );
        assert_eq!(
            DependentRelation::from_table("audit"),
            DependentRelation::Other("audit".to_owned())
        );
    }

    #[test]
    fn blocking_message_names_relation() {
        let message = DependentRelation::Members.blocking_message("dfunk");
        assert_eq!(
            message,
            "role 'dfunk' still has members attached; remove them first"
        );
    }
}
