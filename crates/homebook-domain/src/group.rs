//! Family group membership roles.

use serde::{Deserialize, Serialize};

/// Role a user holds within a family group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupRole {
    Owner,
    Admin,
    Member,
}

impl GroupRole {
    /// Whether the role may manage contributions made by other members.
    pub fn can_manage_contributions(self) -> bool {
        matches!(self, GroupRole::Owner | GroupRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_and_admin_manage() {
        assert!(GroupRole::Owner.can_manage_contributions());
        assert!(GroupRole::Admin.can_manage_contributions());
        assert!(!GroupRole::Member.can_manage_contributions());
    }
}
