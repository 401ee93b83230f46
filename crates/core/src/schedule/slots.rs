//! Discrete time slots of the daily burn window

use crate::config::Constraints;
use crate::core_types::TimeWindow;
use crate::error::ScheduleError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One slot of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Position in the day, 0 = earliest
    pub index: usize,
    /// Interval covered by the slot
    pub window: TimeWindow,
}

impl TimeSlot {
    /// Middle of the slot; used as its representative weather time
    #[must_use]
    pub fn midpoint(&self) -> NaiveTime {
        self.window.start + self.window.duration() / 2
    }
}

/// Partition of the daily window into contiguous, non-overlapping slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPlan {
    date: NaiveDate,
    slots: Vec<TimeSlot>,
}

impl SlotPlan {
    /// Divide `[window_start, window_end)` into `slot_count` equal slots.
    ///
    /// Whole-second rounding is absorbed by the last slot, which always ends
    /// exactly at `window_end`.
    pub fn new(date: NaiveDate, constraints: &Constraints) -> Result<Self, ScheduleError> {
        constraints.validate()?;
        let step = constraints.slot_duration();
        let count = constraints.slot_count;

        let slots = (0..count)
            .map(|index| {
                let start = constraints.window_start + step * index as i32;
                let end = if index + 1 == count {
                    constraints.window_end
                } else {
                    start + step
                };
                TimeWindow::new(start, end)
                    .map(|window| TimeSlot { index, window })
                    .map_err(|e| ScheduleError::InvalidConstraints(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SlotPlan { date, slots })
    }

    /// Date the plan is for
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// All slots, earliest first
    #[must_use]
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the plan has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimeSlot> {
        self.slots.get(index)
    }
}
