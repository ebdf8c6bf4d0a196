//! Read-only projection of future recurring occurrences.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use homebook_domain::{Frequency, RecurringSchedule};

use crate::{store::ScheduleStore, EngineError};

/// One projected future posting of a recurring schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedOccurrence {
    pub schedule_id: Uuid,
    pub category_id: Uuid,
    pub amount: f64,
    pub projected_date: NaiveDate,
    pub frequency: Frequency,
}

impl ProjectedOccurrence {
    pub fn frequency_label(&self) -> &'static str {
        self.frequency.label()
    }
}

/// Lazy occurrence stream for a single schedule, walking the cadence from
/// the schedule's cursor until the horizon is passed.
struct ScheduleProjection {
    schedule_id: Uuid,
    category_id: Uuid,
    amount: f64,
    frequency: Frequency,
    next: NaiveDate,
    horizon_end: NaiveDate,
}

impl ScheduleProjection {
    fn new(schedule: &RecurringSchedule, horizon_end: NaiveDate) -> Self {
        Self {
            schedule_id: schedule.id,
            category_id: schedule.category_id,
            amount: schedule.amount,
            frequency: schedule.frequency,
            next: schedule.next_occurrence,
            horizon_end,
        }
    }
}

impl Iterator for ScheduleProjection {
    type Item = ProjectedOccurrence;

    fn next(&mut self) -> Option<ProjectedOccurrence> {
        if self.next > self.horizon_end {
            return None;
        }
        let occurrence = ProjectedOccurrence {
            schedule_id: self.schedule_id,
            category_id: self.category_id,
            amount: self.amount,
            projected_date: self.next,
            frequency: self.frequency,
        };
        self.next = self.frequency.next_date(self.next);
        Some(occurrence)
    }
}

struct MergeEntry {
    head: ProjectedOccurrence,
    rest: ScheduleProjection,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.head.projected_date, self.head.schedule_id)
            .cmp(&(other.head.projected_date, other.head.schedule_id))
    }
}

/// Lazy merge of per-schedule streams, yielding occurrences in ascending
/// projected-date order. Finite (bounded by the horizon) and detached
/// from the underlying schedules, which are never mutated.
pub struct Projection {
    heap: BinaryHeap<Reverse<MergeEntry>>,
}

impl Iterator for Projection {
    type Item = ProjectedOccurrence;

    fn next(&mut self) -> Option<ProjectedOccurrence> {
        let Reverse(MergeEntry { head, mut rest }) = self.heap.pop()?;
        if let Some(next_head) = rest.next() {
            self.heap.push(Reverse(MergeEntry {
                head: next_head,
                rest,
            }));
        }
        Some(head)
    }
}

/// Projects upcoming occurrences for reporting. Stateless; every call
/// starts a fresh projection.
pub struct ForecastProjector {
    schedules: Arc<dyn ScheduleStore>,
}

impl ForecastProjector {
    pub fn new(schedules: Arc<dyn ScheduleStore>) -> Self {
        Self { schedules }
    }

    /// Projects `horizon_days` ahead of `today` over the given schedules.
    pub fn project(
        schedules: &[RecurringSchedule],
        today: NaiveDate,
        horizon_days: u32,
    ) -> Projection {
        let horizon_end = today + Duration::days(i64::from(horizon_days));
        let heap = schedules
            .iter()
            .filter_map(|schedule| {
                let mut stream = ScheduleProjection::new(schedule, horizon_end);
                stream
                    .next()
                    .map(|head| Reverse(MergeEntry { head, rest: stream }))
            })
            .collect();
        Projection { heap }
    }

    /// Projects over all of one owner's schedules.
    pub fn project_for_owner(
        &self,
        owner_id: Uuid,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<ProjectedOccurrence>, EngineError> {
        let schedules = self.schedules.find_by_owner(owner_id)?;
        Ok(Self::project(&schedules, today, horizon_days).collect())
    }
}
