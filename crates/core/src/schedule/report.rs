//! Schedule output types

use crate::conflict::ConflictRecord;
use crate::core_types::{BurnId, TimeWindow};
use crate::schedule::{CostBreakdown, TimeSlot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why an annealing run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Iteration cap reached
    MaxIterations,
    /// Temperature fell below the configured floor
    TemperatureFloor,
    /// No new best for the configured number of iterations
    Stagnation,
    /// Nothing to schedule
    Empty,
}

/// Why a burn was left out of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledReason {
    /// More burns than `slots × max_concurrent_burns`; lowest priority dropped
    CapacityExceeded,
}

/// A burn placed in a slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    /// The burn
    pub burn_id: BurnId,
    /// Slot index
    pub slot: usize,
    /// Slot interval
    pub window: TimeWindow,
    /// Priority score the burn was scheduled with
    pub priority_score: f64,
}

/// A burn the run could not place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledBurn {
    /// The burn
    pub burn_id: BurnId,
    /// Its priority score
    pub priority_score: f64,
    /// Why it was left out
    pub reason: UnscheduledReason,
}

/// Run statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    /// Iterations performed
    pub iterations: usize,
    /// Why the run stopped
    pub termination: TerminationReason,
    /// Proposals accepted
    pub accepted_moves: usize,
    /// Relocations refused because the target slot was full
    pub rejected_capacity: usize,
    /// Iterations that produced a new best
    pub improving_moves: usize,
    /// Cost of the seed assignment
    pub initial_cost: f64,
    /// Cost of the returned assignment
    pub best_cost: f64,
    /// Temperature when the run stopped
    pub final_temperature: f64,
    /// Burns dropped because the day was over capacity
    pub dropped_for_capacity: usize,
    /// Best cost after every iteration (empty unless requested)
    pub best_cost_trace: Vec<f64>,
}

/// The optimizer's output for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Date scheduled
    pub date: NaiveDate,
    /// Slots of the day, earliest first
    pub slots: Vec<TimeSlot>,
    /// Placed burns, in request order
    pub assignments: Vec<ScheduleAssignment>,
    /// Burns left out, highest priority first
    pub unscheduled: Vec<UnscheduledBurn>,
    /// Live conflicts of the returned assignment
    pub conflicts: Vec<ConflictRecord>,
    /// `conflicts.len()`
    pub conflict_count: usize,
    /// Cost components of the returned assignment
    pub cost: CostBreakdown,
    /// Run statistics
    pub metrics: OptimizationMetrics,
}

impl Schedule {
    /// Optimization score (total cost, lower is better)
    #[must_use]
    pub fn score(&self) -> f64 {
        self.cost.total
    }

    /// Burns placed in each slot
    #[must_use]
    pub fn slot_occupancy(&self) -> Vec<usize> {
        let mut counts = vec![0; self.slots.len()];
        for a in &self.assignments {
            if let Some(c) = counts.get_mut(a.slot) {
                *c += 1;
            }
        }
        counts
    }

    /// Slot a burn was placed in
    #[must_use]
    pub fn slot_of(&self, id: BurnId) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.burn_id == id)
            .map(|a| a.slot)
    }

    /// True when the burn was left out
    #[must_use]
    pub fn is_unscheduled(&self, id: BurnId) -> bool {
        self.unscheduled.iter().any(|u| u.burn_id == id)
    }

    /// Burns assigned to a slot, in request order
    #[must_use]
    pub fn burns_in_slot(&self, slot: usize) -> Vec<BurnId> {
        self.assignments
            .iter()
            .filter(|a| a.slot == slot)
            .map(|a| a.burn_id)
            .collect()
    }
}
