//! Burnwise Core Library
//!
//! Smoke-aware scheduling of agricultural open burns. Given a day's burn
//! requests and a weather snapshot, the engine
//!
//! - predicts each burn's ground-level PM2.5 footprint with a steady-state,
//!   ground-reflected Gaussian plume model ([`dispersion`]),
//! - detects pairs of burns whose smoke would overlap while both are burning
//!   ([`conflict`]), and
//! - assigns burns to discrete time slots with simulated annealing, trading
//!   off priority, conflicts and slot weather ([`schedule`]).
//!
//! Components are built once from typed configuration ([`config`]) and are
//! immutable afterwards. The library logs through `tracing` and never
//! installs a subscriber.

// Core types and utilities
pub mod core_types;

pub mod config;
pub mod error;

// Engine stages
pub mod conflict;
pub mod dispersion;
pub mod schedule;

// Re-export core types
pub use core_types::{
    BurnId, BurnRequest, BurnStatus, CropType, GeoPoint, SkyCondition, StabilityClass,
    TimeWindow, WeatherSnapshot,
};

pub use config::{
    AnnealingOptions, BurnConditionProfile, CalmWindPolicy, ConflictConfig, ConflictPenalty,
    Constraints, DispersionConfig, EngineConfig, SeedStrategy, SeverityThresholds,
};
pub use error::{BurnIssue, ConfigError, DomainError, Result, ScheduleError};

// Re-export engine services and outputs
pub use conflict::{BurnFootprint, ConflictDetector, ConflictKind, ConflictRecord, Severity};
pub use dispersion::{DispersionModel, DispersionPrediction, PlumeEllipse, PointConcentration};
pub use schedule::{
    DateGuard, DateLease, GuardPolicy, OptimizationMetrics, Schedule, ScheduleAssignment,
    ScheduleOptimizer, TerminationReason, UnscheduledBurn,
};
