//! homebook-domain
//!
//! Entity types and pure date math for the Homebook family finance engine.
//! No I/O, no storage, no services.

pub mod budget;
pub mod common;
pub mod contribution;
pub mod frequency;
pub mod goal;
pub mod group;
pub mod schedule;

pub use budget::BudgetAccount;
pub use common::{DateWindow, DateWindowError};
pub use contribution::{ContributionRecord, ContributionTarget};
pub use frequency::Frequency;
pub use goal::{GoalAccount, GoalStatus};
pub use group::GroupRole;
pub use schedule::{RecurringSchedule, ScheduleError};
