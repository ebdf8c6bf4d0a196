//! homebook-engine
//!
//! Recurring obligation and budget reconciliation engine for Homebook.
//! Services, jobs, and persistence contracts only: no storage backend,
//! no HTTP, no UI. Hosts provide the repository implementations and the
//! timers that invoke the jobs.

pub mod contribution;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod gateway;
pub mod guard;
pub mod occurrence;
pub mod reconcile;
pub mod store;
pub mod telemetry;
pub mod time;

pub use contribution::{ContributionLedger, GroupContributionStats, MemberContribution};
pub use engine::Engine;
pub use error::EngineError;
pub use forecast::{ForecastProjector, ProjectedOccurrence, Projection};
pub use gateway::{AppendedEntry, LedgerEntry, LedgerGateway};
pub use guard::RunGuard;
pub use occurrence::{
    BatchError, BatchResult, OccurrenceProcessor, ProcessedOccurrence, RecurringStats,
};
pub use reconcile::{
    DriftCorrection, ReconcileOutcome, ReconcileReport, ReconciliationJob, SweepError,
};
pub use store::{BudgetStore, ContributionStore, GoalStore, MembershipStore, ScheduleStore};
pub use time::{Clock, SystemClock};
