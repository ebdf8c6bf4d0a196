//! Top-level façade wiring the engine's components for a host process.

use std::sync::Arc;

use uuid::Uuid;

use homebook_domain::{ContributionRecord, ContributionTarget};

use crate::{
    contribution::{ContributionLedger, GroupContributionStats},
    forecast::{ForecastProjector, ProjectedOccurrence},
    gateway::LedgerGateway,
    occurrence::{BatchResult, OccurrenceProcessor, ProcessedOccurrence, RecurringStats},
    reconcile::{ReconcileOutcome, ReconcileReport, ReconciliationJob},
    store::{BudgetStore, ContributionStore, GoalStore, MembershipStore, ScheduleStore},
    time::{Clock, SystemClock},
    EngineError,
};

/// The recurring obligation and budget reconciliation engine.
///
/// A library-level component: the host process owns the timers and the
/// persistence implementations, and calls the trigger methods here. The
/// occurrence batch and the reconciliation sweep each carry their own
/// overlap guard, so a manual trigger racing the scheduled run is
/// rejected rather than doubled.
pub struct Engine {
    clock: Arc<dyn Clock>,
    occurrences: OccurrenceProcessor,
    contributions: ContributionLedger,
    reconciliation: ReconciliationJob,
    forecasts: ForecastProjector,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        ledger: Arc<dyn LedgerGateway>,
        budgets: Arc<dyn BudgetStore>,
        goals: Arc<dyn GoalStore>,
        contributions: Arc<dyn ContributionStore>,
        members: Arc<dyn MembershipStore>,
    ) -> Self {
        Self::with_clock(
            schedules,
            ledger,
            budgets,
            goals,
            contributions,
            members,
            Arc::new(SystemClock),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_clock(
        schedules: Arc<dyn ScheduleStore>,
        ledger: Arc<dyn LedgerGateway>,
        budgets: Arc<dyn BudgetStore>,
        goals: Arc<dyn GoalStore>,
        contributions: Arc<dyn ContributionStore>,
        members: Arc<dyn MembershipStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let occurrences = OccurrenceProcessor::new(Arc::clone(&schedules), Arc::clone(&ledger));
        let contribution_ledger = ContributionLedger::new(
            Arc::clone(&ledger),
            Arc::clone(&budgets),
            Arc::clone(&goals),
            Arc::clone(&contributions),
            members,
        );
        let reconciliation =
            ReconciliationJob::new(ledger, budgets, goals, contributions);
        let forecasts = ForecastProjector::new(schedules);
        Self {
            clock,
            occurrences,
            contributions: contribution_ledger,
            reconciliation,
            forecasts,
        }
    }

    /// Processes all schedules due today. Idempotent with the scheduled
    /// run: overlap is rejected, and re-running only picks up schedules
    /// whose cursor is still due.
    pub fn trigger_due_processing(&self) -> Result<BatchResult, EngineError> {
        self.occurrences.process_due(self.clock.today())
    }

    /// Processes one schedule on demand.
    pub fn process_schedule(&self, schedule_id: Uuid) -> Result<ProcessedOccurrence, EngineError> {
        self.occurrences.process_one(schedule_id, self.clock.today())
    }

    /// Runs the reconciliation sweep, reporting the outcome in admin form.
    pub fn trigger_reconciliation(&self) -> ReconcileOutcome {
        self.reconciliation.trigger(self.clock.today())
    }

    /// The symmetric self-healing sweep over goals.
    pub fn reconcile_goals(&self) -> Result<ReconcileReport, EngineError> {
        self.reconciliation.run_goals()
    }

    pub fn contribute(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        group_id: Uuid,
        target: ContributionTarget,
        amount: f64,
    ) -> Result<ContributionRecord, EngineError> {
        self.contributions
            .contribute(user_id, transaction_id, group_id, target, amount)
    }

    pub fn reverse(&self, contribution_id: Uuid, acting_user: Uuid) -> Result<(), EngineError> {
        self.contributions.reverse(contribution_id, acting_user)
    }

    /// Projected occurrences for one owner, ascending by date.
    pub fn project_forecast(
        &self,
        owner_id: Uuid,
        horizon_days: u32,
    ) -> Result<Vec<ProjectedOccurrence>, EngineError> {
        self.forecasts
            .project_for_owner(owner_id, self.clock.today(), horizon_days)
    }

    pub fn recurring_stats(&self, owner_id: Uuid) -> Result<RecurringStats, EngineError> {
        self.occurrences.stats(owner_id)
    }

    pub fn group_contribution_stats(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<GroupContributionStats, EngineError> {
        self.contributions.group_stats(group_id, user_id)
    }

    pub fn list_group_contributions(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ContributionRecord>, EngineError> {
        self.contributions.list_for_group(group_id, user_id)
    }

    pub fn occurrence_processor(&self) -> &OccurrenceProcessor {
        &self.occurrences
    }

    pub fn reconciliation_job(&self) -> &ReconciliationJob {
        &self.reconciliation
    }
}
