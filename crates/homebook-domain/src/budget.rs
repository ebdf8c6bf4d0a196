//! Family budget aggregates with a derived spent counter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{DateWindow, DateWindowError};

/// A spending guardrail for one category, owned by one family group.
///
/// `spent_amount` is derived state: it should equal the sum of budget
/// contributions whose underlying ledger entry falls inside
/// `[start_date, end_date]`. Synchronous contribution calls keep it
/// incrementally up to date; the reconciliation sweep recomputes it from
/// ground truth and overwrites on drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAccount {
    pub id: Uuid,
    pub group_id: Uuid,
    pub category_id: Uuid,
    pub limit_amount: f64,
    pub spent_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_by: Uuid,
}

impl BudgetAccount {
    pub fn new(
        group_id: Uuid,
        category_id: Uuid,
        limit_amount: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_by: Uuid,
    ) -> Result<Self, DateWindowError> {
        DateWindow::new(start_date, end_date)?;
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            category_id,
            limit_amount,
            spent_amount: 0.0,
            start_date,
            end_date,
            created_by,
        })
    }

    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn is_active(&self, on: NaiveDate) -> bool {
        self.window().contains(on)
    }

    pub fn is_expired(&self, by: NaiveDate) -> bool {
        self.end_date < by
    }

    pub fn remaining(&self) -> f64 {
        self.limit_amount - self.spent_amount
    }

    /// Over-contribution is allowed by design; this is reportable state,
    /// never a rejected operation.
    pub fn is_over_limit(&self) -> bool {
        self.spent_amount > self.limit_amount
    }
}
