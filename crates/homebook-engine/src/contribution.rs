//! Earmarking personal transactions toward shared budgets and goals.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use homebook_domain::{ContributionRecord, ContributionTarget, GoalStatus};

use crate::{
    gateway::LedgerGateway,
    store::{BudgetStore, ContributionStore, GoalStore, MembershipStore},
    EngineError,
};

/// Per-member rollup inside [`GroupContributionStats`].
#[derive(Debug, Clone, Default)]
pub struct MemberContribution {
    pub user_id: Uuid,
    pub total: f64,
    pub budget_total: f64,
    pub goal_total: f64,
    pub count: usize,
}

/// Contribution totals for one family group.
#[derive(Debug, Clone, Default)]
pub struct GroupContributionStats {
    pub group_id: Uuid,
    pub total: f64,
    pub budget_total: f64,
    pub goal_total: f64,
    pub count: usize,
    /// Sorted by descending total.
    pub members: Vec<MemberContribution>,
}

/// Records contributions and keeps target counters in step with them.
///
/// Record creation and the counter mutation succeed or fail together: a
/// counter failure after the record landed is compensated by removing the
/// record again, and vice versa on reversal. The reconciliation sweep
/// remains the backstop should a compensation itself fail.
pub struct ContributionLedger {
    ledger: Arc<dyn LedgerGateway>,
    budgets: Arc<dyn BudgetStore>,
    goals: Arc<dyn GoalStore>,
    contributions: Arc<dyn ContributionStore>,
    members: Arc<dyn MembershipStore>,
}

impl ContributionLedger {
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        budgets: Arc<dyn BudgetStore>,
        goals: Arc<dyn GoalStore>,
        contributions: Arc<dyn ContributionStore>,
        members: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            ledger,
            budgets,
            goals,
            contributions,
            members,
        }
    }

    /// Earmarks `amount` of the user's transaction toward a shared target,
    /// incrementing the target's counter. All validation happens before
    /// any mutation.
    pub fn contribute(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        group_id: Uuid,
        target: ContributionTarget,
        amount: f64,
    ) -> Result<ContributionRecord, EngineError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::Validation(
                "contribution amount must be positive".into(),
            ));
        }
        if self.members.role_of(user_id, group_id)?.is_none() {
            return Err(EngineError::NotAMember {
                user: user_id,
                group: group_id,
            });
        }
        let entry = self
            .ledger
            .find_entry(transaction_id)?
            .ok_or(EngineError::TransactionNotFound(transaction_id))?;
        if entry.user_id != user_id {
            return Err(EngineError::Forbidden(
                "only the transaction owner may contribute it".into(),
            ));
        }

        match target {
            ContributionTarget::Budget(budget_id) => {
                let budget = self
                    .budgets
                    .get(budget_id)?
                    .ok_or(EngineError::BudgetNotFound(budget_id))?;
                if budget.group_id != group_id {
                    return Err(EngineError::Validation(
                        "budget does not belong to this group".into(),
                    ));
                }
                // Over-contribution past the limit is allowed; only the
                // category must line up.
                if budget.category_id != entry.category_id {
                    return Err(EngineError::CategoryMismatch {
                        transaction_category: entry.category_id,
                        budget_category: budget.category_id,
                    });
                }
            }
            ContributionTarget::Goal(goal_id) => {
                let goal = self
                    .goals
                    .get(goal_id)?
                    .ok_or(EngineError::GoalNotFound(goal_id))?;
                if goal.group_id != group_id {
                    return Err(EngineError::Validation(
                        "goal does not belong to this group".into(),
                    ));
                }
            }
        }

        let record = ContributionRecord::new(transaction_id, group_id, amount, target);
        self.contributions.insert(record.clone())?;

        if let Err(err) = self.apply_to_target(target, amount) {
            // Keep record and counter together: take the record back out
            // if the counter could not be moved.
            if let Err(cleanup) = self.contributions.remove(record.id) {
                warn!(
                    contribution = %record.id,
                    %cleanup,
                    "failed to compensate contribution record; reconciliation will heal"
                );
            }
            return Err(err);
        }

        info!(
            contribution = %record.id,
            %target,
            amount,
            "contribution recorded"
        );
        Ok(record)
    }

    /// Undoes a contribution: decrements the target counter and deletes
    /// the record. The acting user must own the underlying transaction or
    /// hold an Admin/Owner role in the group.
    pub fn reverse(&self, contribution_id: Uuid, acting_user: Uuid) -> Result<(), EngineError> {
        let record = self
            .contributions
            .get(contribution_id)?
            .ok_or(EngineError::ContributionNotFound(contribution_id))?;

        let owns_transaction = self
            .ledger
            .find_entry(record.transaction_id)?
            .map(|entry| entry.user_id == acting_user)
            .unwrap_or(false);
        if !owns_transaction {
            let can_manage = self
                .members
                .role_of(acting_user, record.group_id)?
                .map(|role| role.can_manage_contributions())
                .unwrap_or(false);
            if !can_manage {
                return Err(EngineError::Forbidden(
                    "reversal requires the transaction owner or a group admin".into(),
                ));
            }
        }

        self.reverse_on_target(record.target, record.amount)?;

        if let Err(err) = self.contributions.remove(record.id) {
            // Put the counter back so the pair stays consistent.
            if let Err(cleanup) = self.apply_to_target(record.target, record.amount) {
                warn!(
                    contribution = %record.id,
                    %cleanup,
                    "failed to compensate counter after delete failure; reconciliation will heal"
                );
            }
            return Err(err);
        }

        info!(
            contribution = %record.id,
            target = %record.target,
            amount = record.amount,
            "contribution reversed"
        );
        Ok(())
    }

    pub fn list_for_group(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ContributionRecord>, EngineError> {
        if self.members.role_of(user_id, group_id)?.is_none() {
            return Err(EngineError::NotAMember {
                user: user_id,
                group: group_id,
            });
        }
        self.contributions.list_by_group(group_id)
    }

    /// Totals per member and per target kind for one group.
    pub fn group_stats(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<GroupContributionStats, EngineError> {
        let records = self.list_for_group(group_id, user_id)?;
        let mut stats = GroupContributionStats {
            group_id,
            count: records.len(),
            ..GroupContributionStats::default()
        };
        let mut by_member: HashMap<Uuid, MemberContribution> = HashMap::new();

        for record in &records {
            let contributor = self
                .ledger
                .find_entry(record.transaction_id)?
                .map(|entry| entry.user_id);
            stats.total += record.amount;
            let member = contributor.map(|user| {
                by_member.entry(user).or_insert_with(|| MemberContribution {
                    user_id: user,
                    ..MemberContribution::default()
                })
            });
            match record.target {
                ContributionTarget::Budget(_) => {
                    stats.budget_total += record.amount;
                    if let Some(member) = member {
                        member.budget_total += record.amount;
                        member.total += record.amount;
                        member.count += 1;
                    }
                }
                ContributionTarget::Goal(_) => {
                    stats.goal_total += record.amount;
                    if let Some(member) = member {
                        member.goal_total += record.amount;
                        member.total += record.amount;
                        member.count += 1;
                    }
                }
            }
        }

        let mut members: Vec<_> = by_member.into_values().collect();
        members.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
        stats.members = members;
        Ok(stats)
    }

    fn apply_to_target(&self, target: ContributionTarget, amount: f64) -> Result<(), EngineError> {
        match target {
            ContributionTarget::Budget(id) => {
                self.budgets.update(id, &mut |budget| {
                    budget.spent_amount += amount;
                })?;
            }
            ContributionTarget::Goal(id) => {
                let goal = self.goals.update(id, &mut |goal| {
                    goal.apply_contribution(amount);
                })?;
                if goal.status == GoalStatus::Completed {
                    info!(goal = %goal.id, saved = goal.saved_amount, "goal reached its target");
                }
            }
        }
        Ok(())
    }

    fn reverse_on_target(
        &self,
        target: ContributionTarget,
        amount: f64,
    ) -> Result<(), EngineError> {
        match target {
            ContributionTarget::Budget(id) => {
                self.budgets.update(id, &mut |budget| {
                    budget.spent_amount -= amount;
                })?;
            }
            ContributionTarget::Goal(id) => {
                self.goals.update(id, &mut |goal| {
                    goal.reverse_contribution(amount);
                })?;
            }
        }
        Ok(())
    }
}
