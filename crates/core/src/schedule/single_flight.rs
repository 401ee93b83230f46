//! At most one optimization run in flight per date
//!
//! Runs for different dates proceed independently. A second request for a
//! date that is already running either waits for the lease to be released
//! or fails immediately with [`ScheduleError::RunInProgress`], depending on
//! the caller's [`GuardPolicy`].

use crate::error::ScheduleError;
use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use std::sync::{Condvar, Mutex, PoisonError};
use tracing::debug;

/// What to do when the date is already being optimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPolicy {
    /// Wait for the running optimization to finish
    Block,
    /// Fail with `RunInProgress`
    Reject,
}

/// Registry of dates with a run in flight
#[derive(Debug, Default)]
pub struct DateGuard {
    in_flight: Mutex<FxHashSet<NaiveDate>>,
    released: Condvar,
}

impl DateGuard {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for `date`; it is released when the lease is dropped.
    pub fn acquire(
        &self,
        date: NaiveDate,
        policy: GuardPolicy,
    ) -> Result<DateLease<'_>, ScheduleError> {
        let mut held = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if held.insert(date) {
                return Ok(DateLease { guard: self, date });
            }
            match policy {
                GuardPolicy::Reject => return Err(ScheduleError::RunInProgress(date)),
                GuardPolicy::Block => {
                    debug!("Waiting for in-flight optimization of {}", date);
                    held = self
                        .released
                        .wait(held)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// True while a lease for `date` is held
    #[must_use]
    pub fn is_running(&self, date: NaiveDate) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&date)
    }

    fn release(&self, date: NaiveDate) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&date);
        self.released.notify_all();
    }
}

/// Exclusive right to optimize one date
#[derive(Debug)]
pub struct DateLease<'a> {
    guard: &'a DateGuard,
    date: NaiveDate,
}

impl DateLease<'_> {
    /// Date this lease covers
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Drop for DateLease<'_> {
    fn drop(&mut self) {
        self.guard.release(self.date);
    }
}
