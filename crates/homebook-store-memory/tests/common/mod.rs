#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use homebook_domain::{BudgetAccount, GoalAccount, GroupRole};
use homebook_engine::{BudgetStore, Clock, GoalStore};
use homebook_store_memory::{
    MemoryBudgetStore, MemoryContributionStore, MemoryGoalStore, MemoryLedgerGateway,
    MemoryMembershipStore, MemoryScheduleStore,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Clock pinned to a fixed date for deterministic job runs.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0.and_hms_opt(12, 0, 0).unwrap())
    }
}

/// All memory-backed collaborators wired together for a test scenario.
pub struct Fixture {
    pub ledger: Arc<MemoryLedgerGateway>,
    pub schedules: Arc<MemoryScheduleStore>,
    pub budgets: Arc<MemoryBudgetStore>,
    pub goals: Arc<MemoryGoalStore>,
    pub contributions: Arc<MemoryContributionStore>,
    pub members: Arc<MemoryMembershipStore>,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            ledger: Arc::new(MemoryLedgerGateway::new()),
            schedules: Arc::new(MemoryScheduleStore::new()),
            budgets: Arc::new(MemoryBudgetStore::new()),
            goals: Arc::new(MemoryGoalStore::new()),
            contributions: Arc::new(MemoryContributionStore::new()),
            members: Arc::new(MemoryMembershipStore::new()),
            group_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
        };
        fixture
            .members
            .add_member(fixture.user_id, fixture.group_id, GroupRole::Member);
        fixture
    }

    /// A January 2024 budget of 1000 in the fixture's category.
    pub fn january_budget(&self) -> BudgetAccount {
        let budget = BudgetAccount::new(
            self.group_id,
            self.category_id,
            1000.0,
            date(2024, 1, 1),
            date(2024, 1, 31),
            self.user_id,
        )
        .unwrap();
        self.budgets.insert(budget.clone()).unwrap();
        budget
    }

    pub fn goal(&self, target: f64) -> GoalAccount {
        let goal = GoalAccount::new(self.group_id, "Holiday", target, date(2025, 1, 1));
        self.goals.insert(goal.clone()).unwrap();
        goal
    }

    /// Seeds a ledger entry for the fixture user in the fixture category.
    pub fn entry(&self, amount: f64, posted_on: NaiveDate) -> Uuid {
        self.ledger
            .seed_entry(self.user_id, self.category_id, amount, posted_on)
    }
}
