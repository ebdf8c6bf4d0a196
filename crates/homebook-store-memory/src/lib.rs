//! In-memory implementations of the Homebook engine's persistence
//! contracts. Backs single-process hosts and integration tests; every
//! store serializes access through one mutex, which satisfies the
//! per-aggregate atomic read-modify-write contract trivially.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use homebook_domain::{
    BudgetAccount, ContributionRecord, ContributionTarget, GoalAccount, GroupRole,
    RecurringSchedule,
};
use homebook_engine::{
    AppendedEntry, BudgetStore, ContributionStore, EngineError, GoalStore, LedgerEntry,
    LedgerGateway, MembershipStore, ScheduleStore,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, EngineError> {
    mutex
        .lock()
        .map_err(|_| EngineError::Storage("memory store lock poisoned".into()))
}

/// Ledger gateway holding entries and running balances in memory.
#[derive(Default)]
pub struct MemoryLedgerGateway {
    inner: Mutex<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    entries: HashMap<Uuid, LedgerEntry>,
    balances: HashMap<Uuid, f64>,
}

impl MemoryLedgerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry directly, bypassing balance checks; test fixture.
    pub fn seed_entry(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        amount: f64,
        posted_on: NaiveDate,
    ) -> Uuid {
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            amount,
            description: "seeded".into(),
            posted_on,
        };
        let id = entry.id;
        let mut state = self.inner.lock().expect("ledger lock");
        *state.balances.entry(user_id).or_insert(0.0) += amount;
        state.entries.insert(id, entry);
        id
    }

    pub fn balance_of(&self, user_id: Uuid) -> f64 {
        let state = self.inner.lock().expect("ledger lock");
        state.balances.get(&user_id).copied().unwrap_or(0.0)
    }

    pub fn entry_count(&self) -> usize {
        let state = self.inner.lock().expect("ledger lock");
        state.entries.len()
    }

    /// Removes an entry outright; used to simulate orphaned contribution
    /// records in reconciliation tests.
    pub fn delete_entry(&self, entry_id: Uuid) {
        let mut state = self.inner.lock().expect("ledger lock");
        state.entries.remove(&entry_id);
    }
}

impl LedgerGateway for MemoryLedgerGateway {
    fn append(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        amount: f64,
        description: &str,
        posted_on: NaiveDate,
    ) -> Result<AppendedEntry, EngineError> {
        let mut state = lock(&self.inner)?;
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            amount,
            description: description.to_string(),
            posted_on,
        };
        let balance = state.balances.entry(user_id).or_insert(0.0);
        *balance += amount;
        let new_balance = *balance;
        state.entries.insert(entry.id, entry.clone());
        Ok(AppendedEntry { entry, new_balance })
    }

    fn find_entry(&self, entry_id: Uuid) -> Result<Option<LedgerEntry>, EngineError> {
        let state = lock(&self.inner)?;
        Ok(state.entries.get(&entry_id).cloned())
    }

    fn sum_by_category_and_range(
        &self,
        user_ids: &[Uuid],
        category_id: Uuid,
        window: homebook_domain::DateWindow,
    ) -> Result<f64, EngineError> {
        let state = lock(&self.inner)?;
        Ok(state
            .entries
            .values()
            .filter(|entry| {
                user_ids.contains(&entry.user_id)
                    && entry.category_id == category_id
                    && window.contains(entry.posted_on)
            })
            .map(|entry| entry.amount)
            .sum())
    }
}

/// Schedule store over a mutex-guarded map.
#[derive(Default)]
pub struct MemoryScheduleStore {
    schedules: Mutex<HashMap<Uuid, RecurringSchedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn get(&self, id: Uuid) -> Result<Option<RecurringSchedule>, EngineError> {
        Ok(lock(&self.schedules)?.get(&id).cloned())
    }

    fn insert(&self, schedule: RecurringSchedule) -> Result<(), EngineError> {
        lock(&self.schedules)?.insert(schedule.id, schedule);
        Ok(())
    }

    fn find_due(&self, as_of: NaiveDate) -> Result<Vec<RecurringSchedule>, EngineError> {
        let mut due: Vec<_> = lock(&self.schedules)?
            .values()
            .filter(|schedule| schedule.is_due(as_of))
            .cloned()
            .collect();
        due.sort_by_key(|schedule| (schedule.next_occurrence, schedule.id));
        Ok(due)
    }

    fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<RecurringSchedule>, EngineError> {
        let mut owned: Vec<_> = lock(&self.schedules)?
            .values()
            .filter(|schedule| schedule.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|schedule| (schedule.next_occurrence, schedule.id));
        Ok(owned)
    }

    fn advance_cursor(&self, id: Uuid, new_next: NaiveDate) -> Result<(), EngineError> {
        let mut schedules = lock(&self.schedules)?;
        let schedule = schedules
            .get_mut(&id)
            .ok_or(EngineError::ScheduleNotFound(id))?;
        schedule.next_occurrence = new_next;
        Ok(())
    }

    fn remove(&self, id: Uuid) -> Result<(), EngineError> {
        lock(&self.schedules)?
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::ScheduleNotFound(id))
    }
}

/// Budget store over a mutex-guarded map.
#[derive(Default)]
pub struct MemoryBudgetStore {
    budgets: Mutex<HashMap<Uuid, BudgetAccount>>,
}

impl MemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BudgetStore for MemoryBudgetStore {
    fn get(&self, id: Uuid) -> Result<Option<BudgetAccount>, EngineError> {
        Ok(lock(&self.budgets)?.get(&id).cloned())
    }

    fn insert(&self, budget: BudgetAccount) -> Result<(), EngineError> {
        lock(&self.budgets)?.insert(budget.id, budget);
        Ok(())
    }

    fn list_active(&self, on: NaiveDate) -> Result<Vec<BudgetAccount>, EngineError> {
        let mut active: Vec<_> = lock(&self.budgets)?
            .values()
            .filter(|budget| budget.is_active(on))
            .cloned()
            .collect();
        active.sort_by_key(|budget| budget.id);
        Ok(active)
    }

    fn list_expired_before(&self, cutoff: NaiveDate) -> Result<Vec<BudgetAccount>, EngineError> {
        let mut expired: Vec<_> = lock(&self.budgets)?
            .values()
            .filter(|budget| budget.is_expired(cutoff))
            .cloned()
            .collect();
        expired.sort_by_key(|budget| budget.id);
        Ok(expired)
    }

    fn update(
        &self,
        id: Uuid,
        mutate: &mut dyn FnMut(&mut BudgetAccount),
    ) -> Result<BudgetAccount, EngineError> {
        let mut budgets = lock(&self.budgets)?;
        let budget = budgets.get_mut(&id).ok_or(EngineError::BudgetNotFound(id))?;
        mutate(budget);
        Ok(budget.clone())
    }

    fn remove(&self, id: Uuid) -> Result<(), EngineError> {
        lock(&self.budgets)?
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::BudgetNotFound(id))
    }
}

/// Goal store over a mutex-guarded map.
#[derive(Default)]
pub struct MemoryGoalStore {
    goals: Mutex<HashMap<Uuid, GoalAccount>>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GoalStore for MemoryGoalStore {
    fn get(&self, id: Uuid) -> Result<Option<GoalAccount>, EngineError> {
        Ok(lock(&self.goals)?.get(&id).cloned())
    }

    fn insert(&self, goal: GoalAccount) -> Result<(), EngineError> {
        lock(&self.goals)?.insert(goal.id, goal);
        Ok(())
    }

    fn list_by_group(&self, group_id: Uuid) -> Result<Vec<GoalAccount>, EngineError> {
        let mut goals: Vec<_> = lock(&self.goals)?
            .values()
            .filter(|goal| goal.group_id == group_id)
            .cloned()
            .collect();
        goals.sort_by_key(|goal| goal.id);
        Ok(goals)
    }

    fn list_all(&self) -> Result<Vec<GoalAccount>, EngineError> {
        let mut goals: Vec<_> = lock(&self.goals)?.values().cloned().collect();
        goals.sort_by_key(|goal| goal.id);
        Ok(goals)
    }

    fn update(
        &self,
        id: Uuid,
        mutate: &mut dyn FnMut(&mut GoalAccount),
    ) -> Result<GoalAccount, EngineError> {
        let mut goals = lock(&self.goals)?;
        let goal = goals.get_mut(&id).ok_or(EngineError::GoalNotFound(id))?;
        mutate(goal);
        Ok(goal.clone())
    }

    fn remove(&self, id: Uuid) -> Result<(), EngineError> {
        lock(&self.goals)?
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::GoalNotFound(id))
    }
}

/// Contribution store enforcing `(transaction, target)` uniqueness under
/// a single lock, which makes the check-and-insert atomic.
#[derive(Default)]
pub struct MemoryContributionStore {
    records: Mutex<HashMap<Uuid, ContributionRecord>>,
}

impl MemoryContributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().expect("contribution lock").len()
    }
}

impl ContributionStore for MemoryContributionStore {
    fn insert(&self, record: ContributionRecord) -> Result<(), EngineError> {
        let mut records = lock(&self.records)?;
        let duplicate = records.values().any(|existing| {
            existing.transaction_id == record.transaction_id && existing.target == record.target
        });
        if duplicate {
            return Err(EngineError::DuplicateContribution {
                transaction: record.transaction_id,
                target: record.target,
            });
        }
        records.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<ContributionRecord>, EngineError> {
        Ok(lock(&self.records)?.get(&id).cloned())
    }

    fn remove(&self, id: Uuid) -> Result<(), EngineError> {
        lock(&self.records)?
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::ContributionNotFound(id))
    }

    fn list_by_group(&self, group_id: Uuid) -> Result<Vec<ContributionRecord>, EngineError> {
        let mut records: Vec<_> = lock(&self.records)?
            .values()
            .filter(|record| record.group_id == group_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }

    fn list_for_target(
        &self,
        target: ContributionTarget,
    ) -> Result<Vec<ContributionRecord>, EngineError> {
        let mut records: Vec<_> = lock(&self.records)?
            .values()
            .filter(|record| record.target == target)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }
}

/// Membership store mapping `(user, group)` pairs to roles.
#[derive(Default)]
pub struct MemoryMembershipStore {
    roles: Mutex<HashMap<(Uuid, Uuid), GroupRole>>,
}

impl MemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, user_id: Uuid, group_id: Uuid, role: GroupRole) {
        self.roles
            .lock()
            .expect("membership lock")
            .insert((user_id, group_id), role);
    }
}

impl MembershipStore for MemoryMembershipStore {
    fn role_of(&self, user_id: Uuid, group_id: Uuid) -> Result<Option<GroupRole>, EngineError> {
        Ok(lock(&self.roles)?.get(&(user_id, group_id)).copied())
    }

    fn members_of(&self, group_id: Uuid) -> Result<Vec<Uuid>, EngineError> {
        let mut members: Vec<_> = lock(&self.roles)?
            .keys()
            .filter(|(_, group)| *group == group_id)
            .map(|(user, _)| *user)
            .collect();
        members.sort();
        Ok(members)
    }
}
