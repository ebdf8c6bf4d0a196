//! Contract for the transaction ledger, implemented outside this engine.

use chrono::NaiveDate;
use uuid::Uuid;

use homebook_domain::DateWindow;

use crate::EngineError;

/// A materialized ledger entry. Immutable once created; contribution
/// records reference entries by id.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: f64,
    pub description: String,
    pub posted_on: NaiveDate,
}

/// Result of appending an entry: the entry plus the user's new balance.
#[derive(Debug, Clone)]
pub struct AppendedEntry {
    pub entry: LedgerEntry,
    pub new_balance: f64,
}

/// Abstraction over the transaction ledger owned by the host application.
///
/// `append` may fail with `InsufficientFunds` for manual payment flows;
/// recurring postings are never balance-checked and must not be rejected
/// on that ground.
pub trait LedgerGateway: Send + Sync {
    fn append(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        amount: f64,
        description: &str,
        posted_on: NaiveDate,
    ) -> Result<AppendedEntry, EngineError>;

    fn find_entry(&self, entry_id: Uuid) -> Result<Option<LedgerEntry>, EngineError>;

    /// Sums entry amounts for a category within a window, over the entries
    /// of the given users.
    fn sum_by_category_and_range(
        &self,
        user_ids: &[Uuid],
        category_id: Uuid,
        window: DateWindow,
    ) -> Result<f64, EngineError>;
}
