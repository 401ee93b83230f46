//! Burn schedule optimization
//!
//! - [`slots`]: partition of the daily burn window
//! - [`cost`]: weighted priority / conflict / weather cost and slot weather
//! - [`annealing`]: the simulated annealing loop
//! - [`optimizer`]: the [`ScheduleOptimizer`] service
//! - [`single_flight`]: per-date mutual exclusion for runs
//! - [`report`]: the [`Schedule`] output and its metrics

pub mod annealing;
pub mod cost;
pub mod optimizer;
pub mod report;
pub mod single_flight;
pub mod slots;

pub use annealing::{AnnealOutcome, Annealer, Candidate};
pub use cost::{slot_weather, weather_risk, CostBreakdown, CostModel};
pub use optimizer::ScheduleOptimizer;
pub use report::{
    OptimizationMetrics, Schedule, ScheduleAssignment, TerminationReason, UnscheduledBurn,
    UnscheduledReason,
};
pub use single_flight::{DateGuard, DateLease, GuardPolicy};
pub use slots::{SlotPlan, TimeSlot};
