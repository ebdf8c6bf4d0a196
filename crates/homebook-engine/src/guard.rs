//! Overlap protection for periodic jobs.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::EngineError;

/// Prevents a job from running concurrently with itself, e.g. when a
/// manual admin trigger races the scheduled run. Owned by the job
/// component, never shared module-level state. Distinct jobs may still
/// run concurrently with each other.
#[derive(Debug)]
pub struct RunGuard {
    name: &'static str,
    running: AtomicBool,
}

impl RunGuard {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
        }
    }

    /// Acquires the guard for the duration of one run, or fails with
    /// `SweepInProgress` if a run is already underway. The returned token
    /// releases the guard on drop, including on panic unwind.
    pub fn acquire(&self) -> Result<RunToken<'_>, EngineError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::SweepInProgress(self.name));
        }
        Ok(RunToken { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// RAII token holding a `RunGuard` acquisition.
pub struct RunToken<'a> {
    guard: &'a RunGuard,
}

impl Drop for RunToken<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
