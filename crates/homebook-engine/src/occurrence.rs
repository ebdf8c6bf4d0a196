//! Advances recurring schedules, materializing ledger entries.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};
use uuid::Uuid;

use homebook_domain::RecurringSchedule;

use crate::{
    gateway::LedgerGateway,
    guard::RunGuard,
    store::ScheduleStore,
    EngineError,
};

/// One successfully processed occurrence.
#[derive(Debug, Clone)]
pub struct ProcessedOccurrence {
    pub schedule_id: Uuid,
    pub entry_id: Uuid,
    pub amount: f64,
    pub new_next: NaiveDate,
}

/// A per-schedule failure captured during a batch run.
#[derive(Debug, Clone)]
pub struct BatchError {
    pub schedule_id: Uuid,
    pub message: String,
}

/// Outcome of a batch run. Per-item failures are collected here rather
/// than raised; a partially failed batch is a normal, non-fatal result.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub processed_count: usize,
    pub outcomes: Vec<ProcessedOccurrence>,
    pub errors: Vec<BatchError>,
}

/// Aggregate income/expense impact of an owner's recurring schedules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurringStats {
    pub schedule_count: usize,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub annual_income: f64,
    pub annual_expenses: f64,
}

impl RecurringStats {
    pub fn monthly_net(&self) -> f64 {
        self.monthly_income - self.monthly_expenses
    }

    pub fn annual_net(&self) -> f64 {
        self.annual_income - self.annual_expenses
    }
}

/// Drives due schedules through the ledger and advances their cursors.
///
/// Entry creation and cursor advancement are two calls against two
/// different stores and are deliberately not atomic with each other: if
/// the entry lands but the cursor write fails, the schedule is picked up
/// again on the next run and the posting repeats. This is the documented
/// at-least-once contract; an occurrence is never silently skipped.
pub struct OccurrenceProcessor {
    schedules: Arc<dyn ScheduleStore>,
    ledger: Arc<dyn LedgerGateway>,
    guard: RunGuard,
}

impl OccurrenceProcessor {
    pub fn new(schedules: Arc<dyn ScheduleStore>, ledger: Arc<dyn LedgerGateway>) -> Self {
        Self {
            schedules,
            ledger,
            guard: RunGuard::new("occurrence processing"),
        }
    }

    /// Processes every schedule due at `as_of`. One schedule's failure is
    /// recorded and never stops the remaining schedules.
    pub fn process_due(&self, as_of: NaiveDate) -> Result<BatchResult, EngineError> {
        let _token = self.guard.acquire()?;
        let due = self.schedules.find_due(as_of)?;
        info!(count = due.len(), %as_of, "processing due recurring schedules");

        let mut result = BatchResult::default();
        for schedule in due {
            let schedule_id = schedule.id;
            match self.advance(&schedule) {
                Ok(outcome) => {
                    result.processed_count += 1;
                    result.outcomes.push(outcome);
                }
                Err(err) => {
                    error!(schedule = %schedule_id, %err, "recurring schedule failed");
                    result.errors.push(BatchError {
                        schedule_id,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            processed = result.processed_count,
            failed = result.errors.len(),
            "recurring batch complete"
        );
        Ok(result)
    }

    /// Processes a single schedule on demand, using the same logic as the
    /// scheduled batch. Fails if the schedule is unknown or not yet due.
    pub fn process_one(
        &self,
        schedule_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<ProcessedOccurrence, EngineError> {
        let schedule = self
            .schedules
            .get(schedule_id)?
            .ok_or(EngineError::ScheduleNotFound(schedule_id))?;
        if !schedule.is_due(as_of) {
            return Err(EngineError::Validation(format!(
                "schedule {} is not due until {}",
                schedule_id, schedule.next_occurrence
            )));
        }
        self.advance(&schedule)
    }

    /// Monthly/annual impact figures over an owner's schedules.
    pub fn stats(&self, owner_id: Uuid) -> Result<RecurringStats, EngineError> {
        let schedules = self.schedules.find_by_owner(owner_id)?;
        let mut stats = RecurringStats {
            schedule_count: schedules.len(),
            ..RecurringStats::default()
        };
        for schedule in &schedules {
            let annual = schedule.annual_amount();
            if schedule.is_income() {
                stats.annual_income += annual;
                stats.monthly_income += annual / 12.0;
            } else {
                stats.annual_expenses += annual.abs();
                stats.monthly_expenses += annual.abs() / 12.0;
            }
        }
        Ok(stats)
    }

    fn advance(&self, schedule: &RecurringSchedule) -> Result<ProcessedOccurrence, EngineError> {
        if !schedule.amount.is_finite() || schedule.amount == 0.0 {
            return Err(EngineError::Validation(format!(
                "schedule {} has a zero or non-finite amount",
                schedule.id
            )));
        }

        // Materialize the posting on the occurrence date the cursor points
        // at, carrying the signed schedule amount.
        let appended = self.ledger.append(
            schedule.owner_id,
            schedule.category_id,
            schedule.amount,
            &schedule.materialized_description(),
            schedule.next_occurrence,
        )?;

        let new_next = schedule.frequency.next_date(schedule.next_occurrence);
        self.schedules.advance_cursor(schedule.id, new_next)?;

        info!(
            schedule = %schedule.id,
            entry = %appended.entry.id,
            amount = schedule.amount,
            next = %new_next,
            "materialized recurring occurrence"
        );
        Ok(ProcessedOccurrence {
            schedule_id: schedule.id,
            entry_id: appended.entry.id,
            amount: appended.entry.amount,
            new_next,
        })
    }
}
