mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use common::{date, Fixture};
use homebook_domain::{
    BudgetAccount, ContributionRecord, ContributionTarget, GoalStatus,
};
use homebook_engine::{
    BudgetStore, ContributionStore, EngineError, GoalStore, LedgerGateway, ReconciliationJob,
};
use homebook_store_memory::MemoryBudgetStore;

fn job(fixture: &Fixture) -> ReconciliationJob {
    ReconciliationJob::new(
        Arc::clone(&fixture.ledger) as Arc<dyn LedgerGateway>,
        Arc::clone(&fixture.budgets) as Arc<dyn BudgetStore>,
        Arc::clone(&fixture.goals) as Arc<dyn GoalStore>,
        Arc::clone(&fixture.contributions) as Arc<dyn ContributionStore>,
    )
}

fn earmark(fixture: &Fixture, txn: Uuid, amount: f64, target: ContributionTarget) {
    fixture
        .contributions
        .insert(ContributionRecord::new(txn, fixture.group_id, amount, target))
        .unwrap();
}

#[test]
fn corrupted_budget_counter_is_overwritten_with_true_sum() {
    let fixture = Fixture::new();
    let budget = fixture.january_budget();
    let target = ContributionTarget::Budget(budget.id);

    let txn_a = fixture.entry(-200.0, date(2024, 1, 10));
    let txn_b = fixture.entry(-150.0, date(2024, 1, 20));
    earmark(&fixture, txn_a, 200.0, target);
    earmark(&fixture, txn_b, 150.0, target);

    // Corrupt the stored counter.
    fixture
        .budgets
        .update(budget.id, &mut |account| account.spent_amount = 975.0)
        .unwrap();

    let report = job(&fixture).run(date(2024, 1, 25)).unwrap();

    assert_eq!(report.corrections.len(), 1);
    let correction = &report.corrections[0];
    assert_eq!(correction.target, target);
    assert_eq!(correction.old_value, 975.0);
    assert_eq!(correction.new_value, 350.0);
    assert_eq!(
        fixture.budgets.get(budget.id).unwrap().unwrap().spent_amount,
        350.0
    );
}

#[test]
fn entries_outside_window_or_category_do_not_count() {
    let fixture = Fixture::new();
    let budget = fixture.january_budget();
    let target = ContributionTarget::Budget(budget.id);

    let inside = fixture.entry(-100.0, date(2024, 1, 15));
    let outside_window = fixture.entry(-40.0, date(2024, 2, 2));
    let other_category = fixture
        .ledger
        .seed_entry(fixture.user_id, Uuid::new_v4(), -60.0, date(2024, 1, 16));
    earmark(&fixture, inside, 100.0, target);
    earmark(&fixture, outside_window, 40.0, target);
    earmark(&fixture, other_category, 60.0, target);

    let report = job(&fixture).run(date(2024, 1, 25)).unwrap();

    assert_eq!(report.corrections.len(), 1);
    assert_eq!(
        fixture.budgets.get(budget.id).unwrap().unwrap().spent_amount,
        100.0
    );
}

#[test]
fn orphaned_contribution_records_heal_to_zero() {
    let fixture = Fixture::new();
    let budget = fixture.january_budget();
    let target = ContributionTarget::Budget(budget.id);

    let txn = fixture.entry(-120.0, date(2024, 1, 12));
    earmark(&fixture, txn, 120.0, target);
    fixture
        .budgets
        .update(budget.id, &mut |account| account.spent_amount = 120.0)
        .unwrap();

    // The underlying entry disappears; the sweep drops its weight.
    fixture.ledger.delete_entry(txn);
    let report = job(&fixture).run(date(2024, 1, 25)).unwrap();

    assert_eq!(report.corrections.len(), 1);
    assert_eq!(
        fixture.budgets.get(budget.id).unwrap().unwrap().spent_amount,
        0.0
    );
}

#[test]
fn expired_budgets_are_pruned_after_grace() {
    let fixture = Fixture::new();
    let expired = BudgetAccount::new(
        fixture.group_id,
        fixture.category_id,
        500.0,
        date(2023, 11, 1),
        date(2023, 11, 30),
        fixture.user_id,
    )
    .unwrap();
    let expired_id = expired.id;
    fixture.budgets.insert(expired).unwrap();
    let active = fixture.january_budget();

    let report = job(&fixture).run(date(2024, 1, 15)).unwrap();

    assert_eq!(report.pruned_budgets, vec![expired_id]);
    assert!(fixture.budgets.get(expired_id).unwrap().is_none());
    assert!(fixture.budgets.get(active.id).unwrap().is_some());
}

#[test]
fn grace_period_defers_pruning() {
    let fixture = Fixture::new();
    let recently_ended = BudgetAccount::new(
        fixture.group_id,
        fixture.category_id,
        500.0,
        date(2024, 1, 1),
        date(2024, 1, 31),
        fixture.user_id,
    )
    .unwrap();
    let budget_id = recently_ended.id;
    fixture.budgets.insert(recently_ended).unwrap();

    let graced = job(&fixture).with_prune_grace(7);
    let report = graced.run(date(2024, 2, 3)).unwrap();
    assert!(report.pruned_budgets.is_empty());
    assert!(fixture.budgets.get(budget_id).unwrap().is_some());

    let report = graced.run(date(2024, 2, 8)).unwrap();
    assert_eq!(report.pruned_budgets, vec![budget_id]);
}

#[test]
fn goal_sweep_heals_saved_amount_and_status() {
    let fixture = Fixture::new();
    let goal = fixture.goal(400.0);
    let target = ContributionTarget::Goal(goal.id);

    let txn = fixture.entry(-250.0, date(2024, 1, 5));
    earmark(&fixture, txn, 250.0, target);
    // Counter drifted to completion though ground truth says otherwise.
    fixture
        .goals
        .update(goal.id, &mut |account| {
            account.saved_amount = 400.0;
            account.recompute_status();
        })
        .unwrap();
    assert_eq!(
        fixture.goals.get(goal.id).unwrap().unwrap().status,
        GoalStatus::Completed
    );

    let report = job(&fixture).run_goals().unwrap();

    assert_eq!(report.corrections.len(), 1);
    let stored = fixture.goals.get(goal.id).unwrap().unwrap();
    assert_eq!(stored.saved_amount, 250.0);
    assert_eq!(stored.status, GoalStatus::InProgress);
}

#[test]
fn one_failing_budget_does_not_abort_the_sweep() {
    struct FlakyBudgetStore {
        inner: MemoryBudgetStore,
        poisoned: Uuid,
    }

    impl BudgetStore for FlakyBudgetStore {
        fn get(&self, id: Uuid) -> Result<Option<BudgetAccount>, EngineError> {
            self.inner.get(id)
        }
        fn insert(&self, budget: BudgetAccount) -> Result<(), EngineError> {
            self.inner.insert(budget)
        }
        fn list_active(&self, on: NaiveDate) -> Result<Vec<BudgetAccount>, EngineError> {
            self.inner.list_active(on)
        }
        fn list_expired_before(
            &self,
            cutoff: NaiveDate,
        ) -> Result<Vec<BudgetAccount>, EngineError> {
            self.inner.list_expired_before(cutoff)
        }
        fn update(
            &self,
            id: Uuid,
            mutate: &mut dyn FnMut(&mut BudgetAccount),
        ) -> Result<BudgetAccount, EngineError> {
            if id == self.poisoned {
                return Err(EngineError::Storage("row lock timeout".into()));
            }
            self.inner.update(id, mutate)
        }
        fn remove(&self, id: Uuid) -> Result<(), EngineError> {
            self.inner.remove(id)
        }
    }

    let fixture = Fixture::new();
    let broken = fixture.january_budget();
    let healthy = BudgetAccount::new(
        fixture.group_id,
        fixture.category_id,
        800.0,
        date(2024, 1, 1),
        date(2024, 1, 31),
        fixture.user_id,
    )
    .unwrap();
    let healthy_id = healthy.id;

    let store = FlakyBudgetStore {
        inner: MemoryBudgetStore::new(),
        poisoned: broken.id,
    };
    let mut drifted_broken = broken.clone();
    drifted_broken.spent_amount = 50.0;
    let mut drifted_healthy = healthy;
    drifted_healthy.spent_amount = 75.0;
    store.insert(drifted_broken).unwrap();
    store.insert(drifted_healthy).unwrap();

    let job = ReconciliationJob::new(
        Arc::clone(&fixture.ledger) as Arc<dyn LedgerGateway>,
        Arc::new(store) as Arc<dyn BudgetStore>,
        Arc::clone(&fixture.goals) as Arc<dyn GoalStore>,
        Arc::clone(&fixture.contributions) as Arc<dyn ContributionStore>,
    );
    let report = job.run(date(2024, 1, 20)).unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].target_id, broken.id);
    // The healthy budget was still corrected down to its true sum of zero.
    assert!(report
        .corrections
        .iter()
        .any(|c| c.target == ContributionTarget::Budget(healthy_id) && c.new_value == 0.0));
}

#[test]
fn trigger_reports_a_summary() {
    let fixture = Fixture::new();
    fixture.january_budget();
    let outcome = job(&fixture).trigger(date(2024, 1, 10));
    assert!(outcome.success);
    assert!(outcome.message.contains("0 corrected"));
}
