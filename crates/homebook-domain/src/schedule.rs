//! Recurring schedule definitions and their occurrence cursor.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::frequency::Frequency;

/// Suffix appended to the description of every system-generated posting so
/// materialized entries are distinguishable from manual ones.
pub const RECURRING_SUFFIX: &str = " (Recurring)";

/// A template for transactions that repeat on a fixed cadence.
///
/// `next_occurrence` is the cursor: always the date of the next posting
/// still to be materialized, advanced by the occurrence processor after
/// each successful run. The signed `amount` encodes income (positive)
/// versus expense (negative); materialized ledger entries carry the
/// signed amount as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: Uuid,
    pub amount: f64,
    pub frequency: Frequency,
    pub description: String,
    pub next_occurrence: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl RecurringSchedule {
    pub fn new(
        owner_id: Uuid,
        category_id: Uuid,
        amount: f64,
        frequency: Frequency,
        description: impl Into<String>,
        next_occurrence: NaiveDate,
    ) -> Result<Self, ScheduleError> {
        if !amount.is_finite() || amount == 0.0 {
            return Err(ScheduleError::InvalidAmount);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            category_id,
            amount,
            frequency,
            description: description.into(),
            next_occurrence,
            created_at: Utc::now(),
        })
    }

    /// Whether the schedule has an occurrence at or before `as_of`.
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.next_occurrence <= as_of
    }

    pub fn absolute_amount(&self) -> f64 {
        self.amount.abs()
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    /// Projected total over a year at this cadence, sign preserved.
    pub fn annual_amount(&self) -> f64 {
        self.amount * f64::from(self.frequency.per_year())
    }

    /// Description used for materialized ledger entries.
    pub fn materialized_description(&self) -> String {
        format!("{}{}", self.description, RECURRING_SUFFIX)
    }

    /// First `count` projected occurrence dates starting at the cursor.
    pub fn upcoming(&self, count: usize) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(count);
        let mut current = self.next_occurrence;
        for _ in 0..count {
            dates.push(current);
            current = self.frequency.next_date(current);
        }
        dates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`RecurringSchedule`] values.
pub enum ScheduleError {
    InvalidAmount,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidAmount => {
                write!(f, "schedule amount must be a nonzero finite number")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(amount: f64, frequency: Frequency, next: NaiveDate) -> RecurringSchedule {
        RecurringSchedule::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            amount,
            frequency,
            "Rent",
            next,
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_and_non_finite_amounts() {
        for bad in [0.0, f64::NAN, f64::INFINITY] {
            let result = RecurringSchedule::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                bad,
                Frequency::Monthly,
                "Rent",
                date(2024, 1, 1),
            );
            assert_eq!(result.unwrap_err(), ScheduleError::InvalidAmount);
        }
    }

    #[test]
    fn due_on_or_before_reference_date() {
        let s = schedule(-50.0, Frequency::Monthly, date(2024, 2, 1));
        assert!(s.is_due(date(2024, 2, 1)));
        assert!(s.is_due(date(2024, 3, 1)));
        assert!(!s.is_due(date(2024, 1, 31)));
    }

    #[test]
    fn annual_amount_scales_by_cadence() {
        let s = schedule(-100.0, Frequency::Monthly, date(2024, 1, 1));
        assert_eq!(s.annual_amount(), -1200.0);
        let s = schedule(25.0, Frequency::Biweekly, date(2024, 1, 1));
        assert_eq!(s.annual_amount(), 650.0);
    }

    #[test]
    fn materialized_description_is_suffixed() {
        let s = schedule(-50.0, Frequency::Weekly, date(2024, 1, 1));
        assert_eq!(s.materialized_description(), "Rent (Recurring)");
    }

    #[test]
    fn upcoming_projects_from_cursor() {
        let s = schedule(-50.0, Frequency::Monthly, date(2024, 1, 31));
        assert_eq!(
            s.upcoming(3),
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29)]
        );
    }
}
