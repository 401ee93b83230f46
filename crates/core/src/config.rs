//! Engine configuration
//!
//! Every component is built once from an explicit, typed configuration value
//! and then used immutably. Each struct implements `Default` with the
//! documented production defaults and `validate()`; a scheduling run
//! validates its inputs exactly once before starting.
//!
//! Configurations deserialize from TOML with every field optional:
//!
//! ```
//! use burnwise_core::config::EngineConfig;
//!
//! let cfg = EngineConfig::from_toml_str(r#"
//!     [constraints]
//!     max_concurrent_burns = 2
//!     slot_count = 4
//!
//!     [annealing]
//!     seed = 42
//! "#).unwrap();
//! assert_eq!(cfg.constraints.max_concurrent_burns, 2);
//! assert_eq!(cfg.annealing.seed, Some(42));
//! ```

use crate::conflict::Severity;
use crate::core_types::{Celsius, Hours, Meters, MetersPerSecond, MicrogramsPerCubicMeter, Percent};
use crate::dispersion::SigmaTable;
use crate::error::{ConfigError, ScheduleError};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// DISPERSION
// ============================================================================

/// What the dispersion model does when wind speed is at or below
/// [`DispersionConfig::min_wind_speed`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalmWindPolicy {
    /// Reject the prediction with `InvalidInput`
    Reject,
    /// Substitute the given speed and flag the prediction as clamped
    ClampTo(MetersPerSecond),
}

/// Gaussian plume model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispersionConfig {
    /// Ground-level concentration below which a burn's impact is negligible
    pub safety_threshold: MicrogramsPerCubicMeter,
    /// Closest downwind distance the plume formula is evaluated at
    pub min_standoff: Meters,
    /// Effective release height of a field burn
    pub source_height: Meters,
    /// Receptor height used for ground-level results
    pub receptor_height: Meters,
    /// Upper bound for the max-radius search
    pub max_search_distance: Meters,
    /// Bisection stops once the bracket is narrower than this
    pub radius_tolerance: Meters,
    /// Semi-minor / semi-major ratio of the affected-area ellipse
    pub crosswind_aspect_ratio: f64,
    /// Lowest wind speed the steady-state plume is valid for
    pub min_wind_speed: MetersPerSecond,
    /// Behaviour at or below `min_wind_speed`
    pub calm_wind: CalmWindPolicy,
    /// Sample grid resolution along the plume axis
    pub grid_downwind_cells: usize,
    /// Sample grid resolution across the plume axis (odd keeps a centerline row)
    pub grid_crosswind_cells: usize,
    /// Pasquill–Gifford σ coefficients per stability class
    pub sigma_table: SigmaTable,
}

impl Default for DispersionConfig {
    /// Defaults for agricultural field burns:
    /// - 35 µg/m³ threshold (EPA 24-hour PM2.5 standard)
    /// - 100 m standoff, 2 m release height, ground-level receptor
    /// - 100 km search cap at 1 m tolerance
    /// - 0.4 crosswind aspect ratio
    /// - 0.5 m/s calm limit, rejected rather than clamped
    /// - 24 × 13 sample grid, Martin (1976) σ coefficients
    fn default() -> Self {
        Self {
            safety_threshold: MicrogramsPerCubicMeter::PM25_24H_NAAQS,
            min_standoff: Meters::new(100.0),
            source_height: Meters::new(2.0),
            receptor_height: Meters::ZERO,
            max_search_distance: Meters::from_kilometers(100.0),
            radius_tolerance: Meters::new(1.0),
            crosswind_aspect_ratio: 0.4,
            min_wind_speed: MetersPerSecond::new(0.5),
            calm_wind: CalmWindPolicy::Reject,
            grid_downwind_cells: 24,
            grid_crosswind_cells: 13,
            sigma_table: SigmaTable::default(),
        }
    }
}

impl DispersionConfig {
    /// Check all parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("dispersion.{name} must be positive, got {v}")))
            }
        };
        positive("safety_threshold", *self.safety_threshold)?;
        positive("min_standoff", *self.min_standoff)?;
        positive("max_search_distance", *self.max_search_distance)?;
        positive("radius_tolerance", *self.radius_tolerance)?;
        positive("min_wind_speed", *self.min_wind_speed)?;
        if !self.source_height.is_finite() || *self.source_height < 0.0 {
            return Err(ConfigError::Invalid(
                "dispersion.source_height must be non-negative".into(),
            ));
        }
        if !self.receptor_height.is_finite() || *self.receptor_height < 0.0 {
            return Err(ConfigError::Invalid(
                "dispersion.receptor_height must be non-negative".into(),
            ));
        }
        if self.max_search_distance <= self.min_standoff {
            return Err(ConfigError::Invalid(
                "dispersion.max_search_distance must exceed min_standoff".into(),
            ));
        }
        if !(self.crosswind_aspect_ratio > 0.0 && self.crosswind_aspect_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "dispersion.crosswind_aspect_ratio must be in (0, 1], got {}",
                self.crosswind_aspect_ratio
            )));
        }
        if let CalmWindPolicy::ClampTo(speed) = self.calm_wind {
            if speed < self.min_wind_speed {
                return Err(ConfigError::Invalid(format!(
                    "dispersion.calm_wind clamp {speed} is below min_wind_speed {}",
                    self.min_wind_speed
                )));
            }
        }
        if self.grid_downwind_cells < 2 || self.grid_crosswind_cells < 1 {
            return Err(ConfigError::Invalid(
                "dispersion sample grid needs at least 2 x 1 cells".into(),
            ));
        }
        self.sigma_table.validate()
    }
}

// ============================================================================
// CONFLICTS
// ============================================================================

/// Overlap-fraction boundaries between severity buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    /// Overlap below this is `Low`
    pub medium_from: f64,
    /// Overlap below this (and ≥ `medium_from`) is `Medium`
    pub high_from: f64,
    /// Overlap at or above this is `Critical`
    pub critical_from: f64,
}

impl Default for SeverityThresholds {
    /// 25% / 50% / 75% quartile buckets
    fn default() -> Self {
        Self {
            medium_from: 0.25,
            high_from: 0.50,
            critical_from: 0.75,
        }
    }
}

impl SeverityThresholds {
    /// Bucket an overlap fraction
    #[must_use]
    pub fn classify(&self, overlap: f64) -> Severity {
        if overlap < self.medium_from {
            Severity::Low
        } else if overlap < self.high_from {
            Severity::Medium
        } else if overlap < self.critical_from {
            Severity::High
        } else {
            Severity::Critical
        }
    }
}

/// Conflict detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Overlap → severity buckets
    pub severity_thresholds: SeverityThresholds,
    /// Severity assigned when farms are closer than the minimum separation
    pub separation_floor_severity: Severity,
    /// Samples per axis when integrating ellipse overlap
    pub overlap_samples: usize,
}

impl Default for ConflictConfig {
    /// Quartile buckets, `High` for separation-floor conflicts, 64 × 64
    /// overlap integration grid.
    fn default() -> Self {
        Self {
            severity_thresholds: SeverityThresholds::default(),
            separation_floor_severity: Severity::High,
            overlap_samples: 64,
        }
    }
}

impl ConflictConfig {
    /// Check thresholds are ordered and the sample count usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.severity_thresholds;
        let ordered = 0.0 < t.medium_from
            && t.medium_from < t.high_from
            && t.high_from < t.critical_from
            && t.critical_from <= 1.0;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "conflict severity thresholds must satisfy 0 < medium < high < critical <= 1, got {t:?}"
            )));
        }
        if self.overlap_samples < 4 {
            return Err(ConfigError::Invalid(
                "conflict.overlap_samples must be at least 4".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SCHEDULING CONSTRAINTS
// ============================================================================

/// How conflicts enter the schedule cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPenalty {
    /// Each conflicting pair costs 1
    Count,
    /// Each conflicting pair costs its severity weight (1-4)
    SeverityWeighted,
}

/// Hard and soft constraints of a scheduling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Most burns a single slot may hold
    pub max_concurrent_burns: usize,
    /// Farms closer than this always conflict when their times overlap
    pub min_separation_distance: Meters,
    /// Start of the daily burn window
    pub window_start: NaiveTime,
    /// End of the daily burn window
    pub window_end: NaiveTime,
    /// Number of equal slots the window is divided into
    pub slot_count: usize,
    /// Weight of the priority-deferral term
    pub priority_weight: f64,
    /// Weight of the conflict term
    pub conflict_weight: f64,
    /// Weight of the slot weather-risk term
    pub weather_weight: f64,
    /// Conflict term flavour
    pub conflict_penalty: ConflictPenalty,
}

impl Default for Constraints {
    /// 08:00-16:00 in four 2-hour slots, three burns per slot, 5 km
    /// separation, weights 0.4 / 0.4 / 0.2, severity-weighted conflicts.
    fn default() -> Self {
        Self {
            max_concurrent_burns: 3,
            min_separation_distance: Meters::from_kilometers(5.0),
            window_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            window_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            slot_count: 4,
            priority_weight: 0.4,
            conflict_weight: 0.4,
            weather_weight: 0.2,
            conflict_penalty: ConflictPenalty::SeverityWeighted,
        }
    }
}

impl Constraints {
    /// Total burns the day can hold
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slot_count.saturating_mul(self.max_concurrent_burns)
    }

    /// Nominal slot length (the last slot absorbs any rounding remainder)
    #[must_use]
    pub fn slot_duration(&self) -> Duration {
        let total = (self.window_end - self.window_start).num_seconds();
        Duration::seconds(total / self.slot_count.max(1) as i64)
    }

    /// Nominal slot length in hours
    #[must_use]
    pub fn slot_hours(&self) -> Hours {
        Hours::from_duration(self.slot_duration())
    }

    /// Check the constraints once, before a run starts.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.max_concurrent_burns == 0 {
            return Err(ScheduleError::InvalidConstraints(
                "max_concurrent_burns must be at least 1".into(),
            ));
        }
        if self.slot_count == 0 {
            return Err(ScheduleError::InvalidConstraints(
                "slot_count must be at least 1".into(),
            ));
        }
        if self.window_start >= self.window_end {
            return Err(ScheduleError::InvalidConstraints(format!(
                "daily window start {} must be before end {}",
                self.window_start, self.window_end
            )));
        }
        if self.slot_duration() < Duration::minutes(1) {
            return Err(ScheduleError::InvalidConstraints(
                "slots must be at least one minute long".into(),
            ));
        }
        if !self.min_separation_distance.is_finite() || *self.min_separation_distance < 0.0 {
            return Err(ScheduleError::InvalidConstraints(
                "min_separation_distance must be non-negative".into(),
            ));
        }
        let weights = [self.priority_weight, self.conflict_weight, self.weather_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScheduleError::InvalidConstraints(format!(
                "cost weights must be finite and non-negative, got {weights:?}"
            )));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ScheduleError::InvalidConstraints(
                "at least one cost weight must be positive".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// BURN CONDITIONS
// ============================================================================

/// Ideal burn-condition profile; distance from it is a slot's weather risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnConditionProfile {
    /// Below this wind speed smoke pools near the ground
    pub ideal_wind_min: MetersPerSecond,
    /// Above this wind speed escape risk rises
    pub ideal_wind_max: MetersPerSecond,
    /// Below this humidity fire behaviour is hard to control
    pub ideal_humidity_min: Percent,
    /// Above this humidity residue burns poorly and smolders
    pub ideal_humidity_max: Percent,
    /// Above this temperature burning is discouraged
    pub max_temperature: Celsius,
}

impl Default for BurnConditionProfile {
    /// 2-7 m/s wind (about 5-15 mph), 30-60% humidity, at most 32 °C.
    fn default() -> Self {
        Self {
            ideal_wind_min: MetersPerSecond::new(2.0),
            ideal_wind_max: MetersPerSecond::new(7.0),
            ideal_humidity_min: Percent::new(30.0),
            ideal_humidity_max: Percent::new(60.0),
            max_temperature: Celsius::new(32.0),
        }
    }
}

impl BurnConditionProfile {
    /// Check the bands are ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(*self.ideal_wind_min > 0.0 && self.ideal_wind_min < self.ideal_wind_max) {
            return Err(ConfigError::Invalid(
                "conditions: need 0 < ideal_wind_min < ideal_wind_max".into(),
            ));
        }
        if !(*self.ideal_humidity_min > 0.0
            && self.ideal_humidity_min < self.ideal_humidity_max
            && *self.ideal_humidity_max < 100.0)
        {
            return Err(ConfigError::Invalid(
                "conditions: need 0 < ideal_humidity_min < ideal_humidity_max < 100".into(),
            ));
        }
        if !self.max_temperature.is_finite() {
            return Err(ConfigError::Invalid("conditions: max_temperature must be finite".into()));
        }
        Ok(())
    }
}

// ============================================================================
// ANNEALING
// ============================================================================

/// How the first candidate assignment is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Highest priority first into the earliest conflict-free slot
    Greedy,
    /// Uniformly random slot with free capacity
    Random,
}

/// Simulated annealing run options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingOptions {
    /// Random seed; `None` draws from the operating system
    pub seed: Option<u64>,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// Starting temperature
    pub initial_temperature: f64,
    /// Multiplicative cooling factor applied every iteration
    pub cooling_rate: f64,
    /// Stop once temperature falls below this
    pub min_temperature: f64,
    /// Stop after this many consecutive iterations without a new best
    pub stagnation_limit: usize,
    /// Initial candidate construction
    pub seed_strategy: SeedStrategy,
    /// Record the best-so-far cost after every iteration
    pub record_trace: bool,
}

impl Default for AnnealingOptions {
    /// 5 000 iterations from T = 10 cooling by 0.995 to 1e-3, stopping after
    /// 1 000 iterations without improvement; greedy seed, unseeded RNG.
    fn default() -> Self {
        Self {
            seed: None,
            max_iterations: 5_000,
            initial_temperature: 10.0,
            cooling_rate: 0.995,
            min_temperature: 1e-3,
            stagnation_limit: 1_000,
            seed_strategy: SeedStrategy::Greedy,
            record_trace: false,
        }
    }
}

impl AnnealingOptions {
    /// Use a fixed random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cap the iteration count
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the starting temperature
    pub fn with_temperature(mut self, initial_temperature: f64) -> Self {
        self.initial_temperature = initial_temperature;
        self
    }

    /// Choose the seeding strategy
    pub fn with_seed_strategy(mut self, strategy: SeedStrategy) -> Self {
        self.seed_strategy = strategy;
        self
    }

    /// Record the best-cost trace
    pub fn with_trace(mut self) -> Self {
        self.record_trace = true;
        self
    }

    /// Check the cooling schedule is usable.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(ScheduleError::InvalidConstraints(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(ScheduleError::InvalidConstraints(format!(
                "cooling_rate must be in (0, 1), got {}",
                self.cooling_rate
            )));
        }
        if !(self.min_temperature.is_finite() && self.min_temperature >= 0.0) {
            return Err(ScheduleError::InvalidConstraints(
                "min_temperature must be finite and non-negative".into(),
            ));
        }
        if self.stagnation_limit == 0 {
            return Err(ScheduleError::InvalidConstraints(
                "stagnation_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Plume model
    pub dispersion: DispersionConfig,
    /// Conflict detector
    pub conflict: ConflictConfig,
    /// Default scheduling constraints
    pub constraints: Constraints,
    /// Ideal burn conditions
    pub conditions: BurnConditionProfile,
    /// Default annealing options
    pub annealing: AnnealingOptions,
}

impl EngineConfig {
    /// Parse and validate a TOML document; missing fields take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: EngineConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dispersion.validate()?;
        self.conflict.validate()?;
        self.conditions.validate()?;
        self.constraints
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.annealing
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_slot_duration_and_capacity() {
        let c = Constraints::default();
        assert_eq!(c.slot_duration(), Duration::hours(2));
        assert_eq!(c.slot_hours(), Hours::new(2.0));
        assert_eq!(c.capacity(), 12);
    }

    #[test]
    fn test_constraints_validation() {
        let zero_cap = Constraints {
            max_concurrent_burns: 0,
            ..Constraints::default()
        };
        assert!(zero_cap.validate().is_err());

        let negative_weight = Constraints {
            conflict_weight: -0.1,
            ..Constraints::default()
        };
        assert!(negative_weight.validate().is_err());

        let all_zero = Constraints {
            priority_weight: 0.0,
            conflict_weight: 0.0,
            weather_weight: 0.0,
            ..Constraints::default()
        };
        assert!(all_zero.validate().is_err());
    }

    #[test]
    fn test_severity_buckets() {
        let t = SeverityThresholds::default();
        assert_eq!(t.classify(0.10), Severity::Low);
        assert_eq!(t.classify(0.25), Severity::Medium);
        assert_eq!(t.classify(0.60), Severity::High);
        assert_eq!(t.classify(0.75), Severity::Critical);
        assert_eq!(t.classify(1.0), Severity::Critical);
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let cfg = ConflictConfig {
            severity_thresholds: SeverityThresholds {
                medium_from: 0.5,
                high_from: 0.4,
                critical_from: 0.9,
            },
            ..ConflictConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_toml_partial_override() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            [dispersion]
            crosswind_aspect_ratio = 0.3
            calm_wind = { clamp_to = 1.0 }

            [constraints]
            window_start = "07:00:00"
            window_end = "15:00:00"
            min_separation_distance = 3000.0

            [conflict]
            separation_floor_severity = "critical"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.dispersion.crosswind_aspect_ratio, 0.3);
        assert_eq!(
            cfg.dispersion.calm_wind,
            CalmWindPolicy::ClampTo(MetersPerSecond::new(1.0))
        );
        assert_eq!(cfg.constraints.min_separation_distance, Meters::new(3000.0));
        assert_eq!(cfg.conflict.separation_floor_severity, Severity::Critical);
        assert_eq!(cfg.constraints.slot_count, 4);
    }

    #[test]
    fn test_toml_invalid_values_rejected() {
        let err = EngineConfig::from_toml_str("[annealing]\ncooling_rate = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = EngineConfig::from_toml_str("[constraints]\nslot_count = \"four\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
