//! Periodic self-healing of derived budget and goal counters.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{error, info};
use uuid::Uuid;

use homebook_domain::{BudgetAccount, ContributionTarget, GoalAccount};

use crate::{
    gateway::LedgerGateway,
    guard::RunGuard,
    store::{BudgetStore, ContributionStore, GoalStore},
    EngineError,
};

/// Counters within half a cent of the recomputed sum are considered in
/// agreement; beyond that the stored value is overwritten.
const DRIFT_EPSILON: f64 = 0.005;

/// A counter overwrite performed by the sweep. Informational, not an
/// error: drift is the expected consequence of partial failures elsewhere.
#[derive(Debug, Clone)]
pub struct DriftCorrection {
    pub target: ContributionTarget,
    pub old_value: f64,
    pub new_value: f64,
}

/// A per-aggregate failure captured during a sweep.
#[derive(Debug, Clone)]
pub struct SweepError {
    pub target_id: Uuid,
    pub message: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub corrections: Vec<DriftCorrection>,
    pub pruned_budgets: Vec<Uuid>,
    pub errors: Vec<SweepError>,
}

/// Admin-facing summary for manual triggering.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub success: bool,
    pub message: String,
}

/// Recomputes budget and goal counters from ground truth (contribution
/// records joined with their ledger entries) and corrects drift, then
/// prunes budgets that expired past the cleanup threshold.
///
/// Each aggregate is processed independently: a failure mid-sweep leaves
/// only the unprocessed remainder stale. Overlapping runs of the job are
/// rejected by its run guard; it may run concurrently with the occurrence
/// batch and with user-triggered contributions, which is why every counter
/// write goes through the stores' atomic `update`.
pub struct ReconciliationJob {
    ledger: Arc<dyn LedgerGateway>,
    budgets: Arc<dyn BudgetStore>,
    goals: Arc<dyn GoalStore>,
    contributions: Arc<dyn ContributionStore>,
    guard: RunGuard,
    prune_grace_days: i64,
}

impl ReconciliationJob {
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        budgets: Arc<dyn BudgetStore>,
        goals: Arc<dyn GoalStore>,
        contributions: Arc<dyn ContributionStore>,
    ) -> Self {
        Self {
            ledger,
            budgets,
            goals,
            contributions,
            guard: RunGuard::new("reconciliation"),
            prune_grace_days: 0,
        }
    }

    /// Days an expired budget is kept before the sweep deletes it.
    pub fn with_prune_grace(mut self, days: i64) -> Self {
        self.prune_grace_days = days.max(0);
        self
    }

    /// The daily sweep: budget recomputation plus expired-budget pruning.
    pub fn run(&self, as_of: NaiveDate) -> Result<ReconcileReport, EngineError> {
        let _token = self.guard.acquire()?;
        let mut report = ReconcileReport::default();
        self.sweep_budgets(as_of, &mut report);
        self.prune_expired(as_of, &mut report);
        info!(
            corrections = report.corrections.len(),
            pruned = report.pruned_budgets.len(),
            failed = report.errors.len(),
            "reconciliation sweep complete"
        );
        Ok(report)
    }

    /// Self-healing sweep over goals, mirroring the budget sweep. Goals
    /// are contribution-driven in normal operation, so this is not part of
    /// the daily run, but it repairs `saved_amount` if the contribution
    /// path's atomicity is ever violated.
    pub fn run_goals(&self) -> Result<ReconcileReport, EngineError> {
        let _token = self.guard.acquire()?;
        let mut report = ReconcileReport::default();
        self.sweep_goals(&mut report);
        info!(
            corrections = report.corrections.len(),
            failed = report.errors.len(),
            "goal reconciliation sweep complete"
        );
        Ok(report)
    }

    /// Manual trigger for admin tooling.
    pub fn trigger(&self, as_of: NaiveDate) -> ReconcileOutcome {
        match self.run(as_of) {
            Ok(report) => ReconcileOutcome {
                success: true,
                message: format!(
                    "reconciled budgets: {} corrected, {} pruned, {} failed",
                    report.corrections.len(),
                    report.pruned_budgets.len(),
                    report.errors.len()
                ),
            },
            Err(err) => ReconcileOutcome {
                success: false,
                message: err.to_string(),
            },
        }
    }

    fn sweep_budgets(&self, as_of: NaiveDate, report: &mut ReconcileReport) {
        let active = match self.budgets.list_active(as_of) {
            Ok(budgets) => budgets,
            Err(err) => {
                error!(%err, "failed to list active budgets");
                report.errors.push(SweepError {
                    target_id: Uuid::nil(),
                    message: err.to_string(),
                });
                return;
            }
        };
        info!(count = active.len(), %as_of, "reconciling active budgets");

        for budget in active {
            let budget_id = budget.id;
            if let Err(err) = self.reconcile_budget(&budget, report) {
                error!(budget = %budget_id, %err, "budget reconciliation failed");
                report.errors.push(SweepError {
                    target_id: budget_id,
                    message: err.to_string(),
                });
            }
        }
    }

    fn reconcile_budget(
        &self,
        budget: &BudgetAccount,
        report: &mut ReconcileReport,
    ) -> Result<(), EngineError> {
        let true_spent = self.recompute_budget_spent(budget)?;
        if (true_spent - budget.spent_amount).abs() <= DRIFT_EPSILON {
            return Ok(());
        }

        let old_value = budget.spent_amount;
        self.budgets.update(budget.id, &mut |account| {
            account.spent_amount = true_spent;
        })?;
        info!(
            budget = %budget.id,
            old = old_value,
            new = true_spent,
            "corrected drifted budget counter"
        );
        report.corrections.push(DriftCorrection {
            target: ContributionTarget::Budget(budget.id),
            old_value,
            new_value: true_spent,
        });
        Ok(())
    }

    /// Ground truth for a budget: the sum of budget contributions whose
    /// referenced ledger entry falls inside the budget's window and
    /// category. Orphaned records (entry deleted) contribute nothing.
    fn recompute_budget_spent(&self, budget: &BudgetAccount) -> Result<f64, EngineError> {
        let records = self
            .contributions
            .list_for_target(ContributionTarget::Budget(budget.id))?;
        let window = budget.window();
        let mut sum = 0.0;
        for record in records {
            if let Some(entry) = self.ledger.find_entry(record.transaction_id)? {
                if window.contains(entry.posted_on) && entry.category_id == budget.category_id {
                    sum += record.amount;
                }
            }
        }
        Ok(sum)
    }

    fn sweep_goals(&self, report: &mut ReconcileReport) {
        let goals = match self.goals.list_all() {
            Ok(goals) => goals,
            Err(err) => {
                error!(%err, "failed to list goals");
                report.errors.push(SweepError {
                    target_id: Uuid::nil(),
                    message: err.to_string(),
                });
                return;
            }
        };

        for goal in goals {
            let goal_id = goal.id;
            if let Err(err) = self.reconcile_goal(&goal, report) {
                error!(goal = %goal_id, %err, "goal reconciliation failed");
                report.errors.push(SweepError {
                    target_id: goal_id,
                    message: err.to_string(),
                });
            }
        }
    }

    fn reconcile_goal(
        &self,
        goal: &GoalAccount,
        report: &mut ReconcileReport,
    ) -> Result<(), EngineError> {
        let records = self
            .contributions
            .list_for_target(ContributionTarget::Goal(goal.id))?;
        let true_saved: f64 = records.iter().map(|record| record.amount).sum();
        if (true_saved - goal.saved_amount).abs() <= DRIFT_EPSILON {
            return Ok(());
        }

        let old_value = goal.saved_amount;
        self.goals.update(goal.id, &mut |account| {
            account.set_saved(true_saved);
        })?;
        info!(
            goal = %goal.id,
            old = old_value,
            new = true_saved,
            "corrected drifted goal counter"
        );
        report.corrections.push(DriftCorrection {
            target: ContributionTarget::Goal(goal.id),
            old_value,
            new_value: true_saved,
        });
        Ok(())
    }

    fn prune_expired(&self, as_of: NaiveDate, report: &mut ReconcileReport) {
        let cutoff = as_of - Duration::days(self.prune_grace_days);
        let expired = match self.budgets.list_expired_before(cutoff) {
            Ok(budgets) => budgets,
            Err(err) => {
                error!(%err, "failed to list expired budgets");
                report.errors.push(SweepError {
                    target_id: Uuid::nil(),
                    message: err.to_string(),
                });
                return;
            }
        };

        for budget in expired {
            match self.budgets.remove(budget.id) {
                Ok(()) => {
                    info!(budget = %budget.id, end = %budget.end_date, "pruned expired budget");
                    report.pruned_budgets.push(budget.id);
                }
                Err(err) => {
                    error!(budget = %budget.id, %err, "failed to prune expired budget");
                    report.errors.push(SweepError {
                        target_id: budget.id,
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}
