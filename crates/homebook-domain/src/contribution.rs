//! Contribution records linking personal ledger entries to shared targets.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The shared aggregate a contribution is earmarked toward, resolved once
/// at creation time rather than re-disambiguated by a type column on
/// every access.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionTarget {
    Budget(Uuid),
    Goal(Uuid),
}

impl ContributionTarget {
    pub fn target_id(self) -> Uuid {
        match self {
            ContributionTarget::Budget(id) | ContributionTarget::Goal(id) => id,
        }
    }

    pub fn kind_label(self) -> &'static str {
        match self {
            ContributionTarget::Budget(_) => "budget",
            ContributionTarget::Goal(_) => "goal",
        }
    }
}

impl fmt::Display for ContributionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind_label(), self.target_id())
    }
}

/// A member's earmarking of one ledger entry toward one shared target.
///
/// At most one record may exist per `(transaction_id, target)` pair; the
/// contribution store rejects duplicates at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub group_id: Uuid,
    pub amount: f64,
    pub target: ContributionTarget,
    pub created_at: DateTime<Utc>,
}

impl ContributionRecord {
    pub fn new(
        transaction_id: Uuid,
        group_id: Uuid,
        amount: f64,
        target: ContributionTarget,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            group_id,
            amount,
            target,
            created_at: Utc::now(),
        }
    }
}
