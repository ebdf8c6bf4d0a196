use thiserror::Error;
use uuid::Uuid;

use homebook_domain::{ContributionTarget, DateWindowError, ScheduleError};

/// Error type covering engine operations. Validation, not-found, and
/// authorization failures are raised before any mutation; batch jobs never
/// surface per-item failures through this type — they collect them in
/// their structured results instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Uuid),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),
    #[error("Goal not found: {0}")]
    GoalNotFound(Uuid),
    #[error("Contribution not found: {0}")]
    ContributionNotFound(Uuid),
    #[error("User {user} is not a member of group {group}")]
    NotAMember { user: Uuid, group: Uuid },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Transaction {transaction} already contributes to {target}")]
    DuplicateContribution {
        transaction: Uuid,
        target: ContributionTarget,
    },
    #[error("Transaction category {transaction_category} does not match budget category {budget_category}")]
    CategoryMismatch {
        transaction_category: Uuid,
        budget_category: Uuid,
    },
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("A {0} run is already in progress")]
    SweepInProgress(&'static str),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DateWindowError> for EngineError {
    fn from(err: DateWindowError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<ScheduleError> for EngineError {
    fn from(err: ScheduleError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl EngineError {
    /// Whether the error indicates a missing entity rather than a rejected
    /// or failed operation.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::ScheduleNotFound(_)
                | EngineError::TransactionNotFound(_)
                | EngineError::BudgetNotFound(_)
                | EngineError::GoalNotFound(_)
                | EngineError::ContributionNotFound(_)
        )
    }
}
