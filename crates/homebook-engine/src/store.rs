//! Persistence contracts consumed by the engine.
//!
//! Counter-bearing aggregates (budgets, goals) are mutated exclusively
//! through `update`, a read-modify-write the implementation must execute
//! atomically with respect to other mutations of the same aggregate
//! (row-level locking or equivalent). This is what prevents a concurrent
//! contribution and a concurrent reconciliation overwrite from losing
//! updates to each other.

use chrono::NaiveDate;
use uuid::Uuid;

use homebook_domain::{
    BudgetAccount, ContributionRecord, ContributionTarget, GoalAccount, GroupRole,
    RecurringSchedule,
};

use crate::EngineError;

/// Stores recurring schedule definitions and their occurrence cursor.
pub trait ScheduleStore: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<RecurringSchedule>, EngineError>;
    fn insert(&self, schedule: RecurringSchedule) -> Result<(), EngineError>;
    /// All schedules whose cursor is at or before `as_of`.
    fn find_due(&self, as_of: NaiveDate) -> Result<Vec<RecurringSchedule>, EngineError>;
    fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringSchedule>, EngineError>;
    /// Persists a new cursor after an occurrence was materialized.
    fn advance_cursor(&self, id: Uuid, new_next: NaiveDate) -> Result<(), EngineError>;
    fn remove(&self, id: Uuid) -> Result<(), EngineError>;
}

/// Stores family budget aggregates.
pub trait BudgetStore: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<BudgetAccount>, EngineError>;
    fn insert(&self, budget: BudgetAccount) -> Result<(), EngineError>;
    /// Budgets whose window contains `on`.
    fn list_active(&self, on: NaiveDate) -> Result<Vec<BudgetAccount>, EngineError>;
    /// Budgets whose `end_date` is strictly before `cutoff`.
    fn list_expired_before(&self, cutoff: NaiveDate) -> Result<Vec<BudgetAccount>, EngineError>;
    /// Atomic read-modify-write scoped to one budget.
    fn update(
        &self,
        id: Uuid,
        mutate: &mut dyn FnMut(&mut BudgetAccount),
    ) -> Result<BudgetAccount, EngineError>;
    fn remove(&self, id: Uuid) -> Result<(), EngineError>;
}

/// Stores family goal aggregates.
pub trait GoalStore: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<GoalAccount>, EngineError>;
    fn insert(&self, goal: GoalAccount) -> Result<(), EngineError>;
    fn list_by_group(&self, group_id: Uuid) -> Result<Vec<GoalAccount>, EngineError>;
    fn list_all(&self) -> Result<Vec<GoalAccount>, EngineError>;
    /// Atomic read-modify-write scoped to one goal.
    fn update(
        &self,
        id: Uuid,
        mutate: &mut dyn FnMut(&mut GoalAccount),
    ) -> Result<GoalAccount, EngineError>;
    fn remove(&self, id: Uuid) -> Result<(), EngineError>;
}

/// Stores contribution records.
pub trait ContributionStore: Send + Sync {
    /// Inserts a record, rejecting a second record for the same
    /// `(transaction_id, target)` pair with `DuplicateContribution`. The
    /// uniqueness check and the insert must be atomic.
    fn insert(&self, record: ContributionRecord) -> Result<(), EngineError>;
    fn get(&self, id: Uuid) -> Result<Option<ContributionRecord>, EngineError>;
    fn remove(&self, id: Uuid) -> Result<(), EngineError>;
    fn list_by_group(&self, group_id: Uuid) -> Result<Vec<ContributionRecord>, EngineError>;
    fn list_for_target(
        &self,
        target: ContributionTarget,
    ) -> Result<Vec<ContributionRecord>, EngineError>;
}

/// Answers group membership questions.
pub trait MembershipStore: Send + Sync {
    fn role_of(&self, user_id: Uuid, group_id: Uuid) -> Result<Option<GroupRole>, EngineError>;
    fn members_of(&self, group_id: Uuid) -> Result<Vec<Uuid>, EngineError>;
}
