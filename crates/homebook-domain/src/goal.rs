//! Family savings goals and their progress state machine.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress state of a goal, fully determined by saved versus target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Pending,
    InProgress,
    Completed,
}

impl GoalStatus {
    /// Status implied by a saved amount against a target. Transitions are
    /// reversible in both directions: reversing contributions below the
    /// target demotes Completed, and down to Pending at zero.
    pub fn for_progress(saved: f64, target: f64) -> GoalStatus {
        if saved >= target {
            GoalStatus::Completed
        } else if saved > 0.0 {
            GoalStatus::InProgress
        } else {
            GoalStatus::Pending
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GoalStatus::Pending => "PENDING",
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Completed => "COMPLETED",
        };
        f.write_str(label)
    }
}

/// A shared savings target owned by one family group.
///
/// `saved_amount` is mutated only through contribution apply/reverse and
/// the reconciliation sweep; `status` is recomputed on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalAccount {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
    pub status: GoalStatus,
    pub due_date: NaiveDate,
}

impl GoalAccount {
    pub fn new(
        group_id: Uuid,
        name: impl Into<String>,
        target_amount: f64,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            name: name.into(),
            target_amount,
            saved_amount: 0.0,
            status: GoalStatus::Pending,
            due_date,
        }
    }

    /// Adds a contribution and recomputes status.
    pub fn apply_contribution(&mut self, amount: f64) {
        self.saved_amount += amount;
        self.recompute_status();
    }

    /// Removes a contribution, clamping saved at zero, and recomputes
    /// status.
    pub fn reverse_contribution(&mut self, amount: f64) {
        self.saved_amount = (self.saved_amount - amount).max(0.0);
        self.recompute_status();
    }

    /// Overwrites the saved counter from a recomputed ground-truth sum.
    pub fn set_saved(&mut self, saved: f64) {
        self.saved_amount = saved.max(0.0);
        self.recompute_status();
    }

    pub fn recompute_status(&mut self) {
        self.status = GoalStatus::for_progress(self.saved_amount, self.target_amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target: f64) -> GoalAccount {
        GoalAccount::new(
            Uuid::new_v4(),
            "Vacation",
            target,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    #[test]
    fn status_follows_progress() {
        assert_eq!(GoalStatus::for_progress(0.0, 100.0), GoalStatus::Pending);
        assert_eq!(GoalStatus::for_progress(50.0, 100.0), GoalStatus::InProgress);
        assert_eq!(GoalStatus::for_progress(100.0, 100.0), GoalStatus::Completed);
        assert_eq!(GoalStatus::for_progress(150.0, 100.0), GoalStatus::Completed);
    }

    #[test]
    fn first_contribution_starts_progress() {
        let mut g = goal(500.0);
        assert_eq!(g.status, GoalStatus::Pending);
        g.apply_contribution(100.0);
        assert_eq!(g.status, GoalStatus::InProgress);
        g.apply_contribution(400.0);
        assert_eq!(g.status, GoalStatus::Completed);
    }

    #[test]
    fn reversal_demotes_completed_goal() {
        let mut g = goal(500.0);
        g.apply_contribution(500.0);
        assert_eq!(g.status, GoalStatus::Completed);
        g.reverse_contribution(200.0);
        assert_eq!(g.status, GoalStatus::InProgress);
        assert_eq!(g.saved_amount, 300.0);
        g.reverse_contribution(300.0);
        assert_eq!(g.status, GoalStatus::Pending);
    }

    #[test]
    fn reversal_clamps_at_zero() {
        let mut g = goal(500.0);
        g.apply_contribution(100.0);
        g.reverse_contribution(250.0);
        assert_eq!(g.saved_amount, 0.0);
        assert_eq!(g.status, GoalStatus::Pending);
    }
}
