//! Schedule optimizer service
//!
//! One run, for one date:
//!
//! 1. Validate constraints and options.
//! 2. Validate every burn and predict its dispersion in parallel; request
//!    and modeling problems are collected into a single `InvalidBurns`
//!    error rather than dropping burns.
//! 3. If the day is over capacity, drop the lowest-priority burns.
//! 4. Precompute the pairwise spatial conflict matrix.
//! 5. Anneal slot assignments and report the best one found.

use crate::config::{AnnealingOptions, BurnConditionProfile, Constraints, EngineConfig};
use crate::conflict::{BurnFootprint, ConflictDetector, ConflictMatrix, ConflictRecord};
use crate::core_types::{BurnId, BurnRequest, WeatherSnapshot};
use crate::dispersion::{DispersionModel, DispersionPrediction};
use crate::error::{BurnIssue, ConfigError, DomainError, ScheduleError};
use crate::schedule::annealing::Annealer;
use crate::schedule::cost::{slot_weather, weather_risk};
use crate::schedule::{
    CostModel, DateGuard, GuardPolicy, OptimizationMetrics, Schedule, ScheduleAssignment,
    SlotPlan, UnscheduledBurn, UnscheduledReason,
};
use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use tracing::{info, warn};

/// Simulated annealing burn scheduler
#[derive(Debug, Clone, Default)]
pub struct ScheduleOptimizer {
    model: DispersionModel,
    detector: ConflictDetector,
    conditions: BurnConditionProfile,
}

impl ScheduleOptimizer {
    /// Build an optimizer from a full engine configuration
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.conditions.validate()?;
        Ok(Self {
            model: DispersionModel::new(config.dispersion.clone())?,
            detector: ConflictDetector::new(config.conflict.clone())?,
            conditions: config.conditions.clone(),
        })
    }

    /// Build an optimizer from already-constructed components
    #[must_use]
    pub fn from_parts(
        model: DispersionModel,
        detector: ConflictDetector,
        conditions: BurnConditionProfile,
    ) -> Self {
        Self {
            model,
            detector,
            conditions,
        }
    }

    /// The dispersion model in use
    #[must_use]
    pub fn model(&self) -> &DispersionModel {
        &self.model
    }

    /// The conflict detector in use
    #[must_use]
    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    /// Assign the day's burns to slots.
    ///
    /// Slot weather is derived from `weather` through the diurnal cycle.
    ///
    /// # Errors
    /// `InvalidConstraints` for unusable constraints or options;
    /// `InvalidBurns` naming every burn that failed validation or
    /// dispersion modeling. Over-capacity days are not an error.
    pub fn optimize_schedule(
        &self,
        date: NaiveDate,
        burns: &[BurnRequest],
        weather: &WeatherSnapshot,
        constraints: &Constraints,
        options: &AnnealingOptions,
    ) -> Result<Schedule, ScheduleError> {
        self.run(date, burns, weather, None, constraints, options)
    }

    /// As [`Self::optimize_schedule`], taking each slot's weather from the
    /// forecast entry nearest its midpoint.
    pub fn optimize_with_forecast(
        &self,
        date: NaiveDate,
        burns: &[BurnRequest],
        weather: &WeatherSnapshot,
        forecast: &[WeatherSnapshot],
        constraints: &Constraints,
        options: &AnnealingOptions,
    ) -> Result<Schedule, ScheduleError> {
        self.run(date, burns, weather, Some(forecast), constraints, options)
    }

    /// As [`Self::optimize_schedule`], holding the date's lease for the
    /// duration of the run.
    ///
    /// # Errors
    /// `RunInProgress` under [`GuardPolicy::Reject`] when another run holds
    /// the date.
    #[allow(clippy::too_many_arguments)]
    pub fn optimize_guarded(
        &self,
        guard: &DateGuard,
        policy: GuardPolicy,
        date: NaiveDate,
        burns: &[BurnRequest],
        weather: &WeatherSnapshot,
        constraints: &Constraints,
        options: &AnnealingOptions,
    ) -> Result<Schedule, ScheduleError> {
        let _lease = guard.acquire(date, policy)?;
        self.run(date, burns, weather, None, constraints, options)
    }

    fn run(
        &self,
        date: NaiveDate,
        burns: &[BurnRequest],
        weather: &WeatherSnapshot,
        forecast: Option<&[WeatherSnapshot]>,
        constraints: &Constraints,
        options: &AnnealingOptions,
    ) -> Result<Schedule, ScheduleError> {
        constraints.validate()?;
        options.validate()?;
        let plan = SlotPlan::new(date, constraints)?;

        info!(
            "Optimizing {} burn(s) for {} across {} slot(s)",
            burns.len(),
            date,
            plan.len()
        );

        let predictions = self.predict_all(date, burns, weather)?;

        // Capacity: keep the highest-priority burns, drop the rest
        let ranked = priority_ranking(burns);
        let capacity = constraints.capacity();
        let (kept, dropped) = ranked.split_at(ranked.len().min(capacity));

        let unscheduled: Vec<UnscheduledBurn> = dropped
            .iter()
            .map(|&i| {
                warn!(
                    "{} (priority {:.1}) left unscheduled: {} burns exceed capacity {}",
                    burns[i].id,
                    burns[i].priority_score,
                    burns.len(),
                    capacity
                );
                UnscheduledBurn {
                    burn_id: burns[i].id,
                    priority_score: burns[i].priority_score,
                    reason: UnscheduledReason::CapacityExceeded,
                }
            })
            .collect();

        // Active set in request order
        let mut active_idx: Vec<usize> = kept.to_vec();
        active_idx.sort_unstable();
        let active: Vec<BurnRequest> = active_idx.iter().map(|&i| burns[i].clone()).collect();
        let active_preds: Vec<DispersionPrediction> =
            active_idx.iter().map(|&i| predictions[i].clone()).collect();

        let matrix = ConflictMatrix::build(
            &self.detector,
            &active,
            &active_preds,
            constraints.min_separation_distance,
        );

        let slot_risk: Vec<f64> = slot_weather(&plan, weather, forecast)
            .iter()
            .map(|w| weather_risk(w, &self.conditions))
            .collect();
        let cost = CostModel::new(&active, &matrix, slot_risk, constraints);

        let order = priority_ranking(&active);
        let outcome = Annealer::new(
            &cost,
            &matrix,
            &order,
            constraints.max_concurrent_burns,
            options,
        )
        .run();

        let assignments: Vec<ScheduleAssignment> = active
            .iter()
            .zip(outcome.best.slots())
            .filter_map(|(burn, &slot)| {
                plan.get(slot).map(|s| ScheduleAssignment {
                    burn_id: burn.id,
                    slot,
                    window: s.window,
                    priority_score: burn.priority_score,
                })
            })
            .collect();

        let conflicts = self.slot_conflicts(
            &plan,
            &active,
            &active_preds,
            outcome.best.slots(),
            constraints,
        );

        info!(
            "Schedule for {}: {} placed, {} unscheduled, {} conflict(s), cost {:.4} after {} iterations ({:?})",
            date,
            assignments.len(),
            unscheduled.len(),
            conflicts.len(),
            outcome.best_cost.total,
            outcome.iterations,
            outcome.termination
        );

        Ok(Schedule {
            date,
            slots: plan.slots().to_vec(),
            assignments,
            conflict_count: conflicts.len(),
            conflicts,
            cost: outcome.best_cost,
            metrics: OptimizationMetrics {
                iterations: outcome.iterations,
                termination: outcome.termination,
                accepted_moves: outcome.accepted_moves,
                rejected_capacity: outcome.rejected_capacity,
                improving_moves: outcome.improving_moves,
                initial_cost: outcome.initial_cost,
                best_cost: outcome.best_cost.total,
                final_temperature: outcome.final_temperature,
                dropped_for_capacity: unscheduled.len(),
                best_cost_trace: outcome.trace,
            },
            unscheduled,
        })
    }

    /// Predict every burn, reporting request problems and modeling failures
    /// together, one issue per burn in request order.
    fn predict_all(
        &self,
        date: NaiveDate,
        burns: &[BurnRequest],
        weather: &WeatherSnapshot,
    ) -> Result<Vec<DispersionPrediction>, ScheduleError> {
        let mut problems = request_problems(date, burns);
        let mut predictions = Vec::with_capacity(burns.len());
        for (result, problem) in self
            .model
            .predict_many(burns, weather)
            .into_iter()
            .zip(problems.iter_mut())
        {
            match result {
                Ok(p) => predictions.push(p),
                Err(error) => {
                    problem.get_or_insert(error);
                }
            }
        }

        let issues: Vec<BurnIssue> = burns
            .iter()
            .zip(problems)
            .filter_map(|(burn, problem)| {
                problem.map(|error| BurnIssue {
                    burn_id: burn.id,
                    error,
                })
            })
            .collect();
        if issues.is_empty() {
            Ok(predictions)
        } else {
            Err(ScheduleError::InvalidBurns(issues))
        }
    }

    /// Re-run the detector for every pair sharing a slot in the final
    /// assignment, using the slot as both burns' window.
    fn slot_conflicts(
        &self,
        plan: &SlotPlan,
        burns: &[BurnRequest],
        predictions: &[DispersionPrediction],
        slot_of: &[usize],
        constraints: &Constraints,
    ) -> Vec<ConflictRecord> {
        let mut records = Vec::new();
        for slot in plan.slots() {
            let footprints: Vec<BurnFootprint<'_>> = burns
                .iter()
                .zip(predictions)
                .zip(slot_of)
                .filter(|(_, &s)| s == slot.index)
                .map(|((b, p), _)| BurnFootprint::requested(b, p).in_window(slot.window))
                .collect();
            records.extend(self.detector.detect_all(&footprints, constraints));
        }
        records.sort_by_key(|r| (r.first, r.second));
        records
    }
}

/// Date mismatches, duplicate ids and malformed requests, one entry per
/// burn in request order.
fn request_problems(date: NaiveDate, burns: &[BurnRequest]) -> Vec<Option<DomainError>> {
    let mut seen: FxHashSet<BurnId> = FxHashSet::default();
    burns
        .iter()
        .map(|burn| {
            if !seen.insert(burn.id) {
                return Some(DomainError::invalid(
                    "id",
                    format!("{} appears more than once in the run", burn.id),
                ));
            }
            if burn.requested_date == date {
                burn.validate().err()
            } else {
                Some(DomainError::invalid(
                    "requested_date",
                    format!("requested for {}, but the run is for {date}", burn.requested_date),
                ))
            }
        })
        .collect()
}

/// Indices of `burns`, highest priority first, ties by ascending id.
fn priority_ranking(burns: &[BurnRequest]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..burns.len()).collect();
    order.sort_by(|&a, &b| {
        burns[b]
            .priority_score
            .total_cmp(&burns[a].priority_score)
            .then_with(|| burns[a].id.cmp(&burns[b].id))
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{
        Acres, Celsius, CropType, Degrees, GeoPoint, Meters, MetersPerSecond, Percent,
        StabilityClass, TimeWindow,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn weather() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: Celsius::new(20.0),
            humidity: Percent::new(45.0),
            wind_speed: MetersPerSecond::new(4.0),
            wind_direction: Degrees::new(225.0),
            stability: StabilityClass::D,
            timestamp: date().and_hms_opt(10, 0, 0).unwrap(),
            location: GeoPoint::new(38.5, -121.7),
        }
    }

    fn burn(id: u64, km_east: f64, priority: f64) -> BurnRequest {
        let origin = GeoPoint::new(38.5, -121.7);
        BurnRequest::new(
            id,
            origin.destination(Degrees::new(90.0), Meters::from_kilometers(km_east)),
            Acres::new(25.0),
            CropType::Wheat,
            date(),
            TimeWindow::hours(9, 12).unwrap(),
        )
        .with_priority(priority)
    }

    #[test]
    fn test_priority_ranking_breaks_ties_by_id() {
        let burns = vec![burn(5, 0.0, 40.0), burn(2, 50.0, 80.0), burn(1, 100.0, 40.0)];
        assert_eq!(priority_ranking(&burns), vec![1, 2, 0]);
    }

    #[test]
    fn test_all_invalid_burns_reported_together() {
        let mut negative = burn(1, 0.0, 50.0);
        negative.acreage = Acres::new(-3.0);
        let mut wrong_day = burn(2, 30.0, 50.0);
        wrong_day.requested_date = NaiveDate::from_ymd_opt(2025, 10, 2).unwrap();
        let ok = burn(3, 60.0, 50.0);
        let duplicate = burn(3, 90.0, 50.0);

        let err = ScheduleOptimizer::default()
            .optimize_schedule(
                date(),
                &[negative, wrong_day, ok, duplicate],
                &weather(),
                &Constraints::default(),
                &AnnealingOptions::default().with_seed(1),
            )
            .unwrap_err();
        assert_eq!(err.offending_burns(), vec![BurnId(1), BurnId(2), BurnId(3)]);
    }

    #[test]
    fn test_calm_wind_aborts_run_naming_every_burn() {
        let mut calm = weather();
        calm.wind_speed = MetersPerSecond::ZERO;
        let err = ScheduleOptimizer::default()
            .optimize_schedule(
                date(),
                &[burn(1, 0.0, 50.0), burn(2, 40.0, 60.0)],
                &calm,
                &Constraints::default(),
                &AnnealingOptions::default().with_seed(1),
            )
            .unwrap_err();
        assert_eq!(err.offending_burns(), vec![BurnId(1), BurnId(2)]);
    }

    #[test]
    fn test_request_and_calm_wind_problems_reported_together() {
        let mut calm = weather();
        calm.wind_speed = MetersPerSecond::new(0.2);
        let mut negative = burn(1, 0.0, 50.0);
        negative.acreage = Acres::new(-3.0);

        let err = ScheduleOptimizer::default()
            .optimize_schedule(
                date(),
                &[negative, burn(2, 40.0, 60.0), burn(3, 80.0, 70.0)],
                &calm,
                &Constraints::default(),
                &AnnealingOptions::default().with_seed(1),
            )
            .unwrap_err();
        let issues = match err {
            ScheduleError::InvalidBurns(issues) => issues,
            other => panic!("expected InvalidBurns, got {other:?}"),
        };
        let fields: Vec<(BurnId, &str)> = issues
            .iter()
            .map(|i| match &i.error {
                DomainError::InvalidInput { field, .. } => (i.burn_id, *field),
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();
        assert_eq!(
            fields,
            vec![
                (BurnId(1), "acreage"),
                (BurnId(2), "weather.wind_speed"),
                (BurnId(3), "weather.wind_speed"),
            ]
        );
    }

    #[test]
    fn test_invalid_constraints_rejected_before_work() {
        let constraints = Constraints {
            max_concurrent_burns: 0,
            ..Constraints::default()
        };
        let err = ScheduleOptimizer::default()
            .optimize_schedule(
                date(),
                &[burn(1, 0.0, 50.0)],
                &weather(),
                &constraints,
                &AnnealingOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidConstraints(_)));
    }

    #[test]
    fn test_empty_day() {
        let schedule = ScheduleOptimizer::default()
            .optimize_schedule(
                date(),
                &[],
                &weather(),
                &Constraints::default(),
                &AnnealingOptions::default().with_seed(1),
            )
            .unwrap();
        assert!(schedule.assignments.is_empty());
        assert_eq!(schedule.slots.len(), 4);
        assert_eq!(schedule.metrics.termination, crate::schedule::TerminationReason::Empty);
    }

    #[test]
    fn test_guarded_run_rejects_concurrent_date() {
        let guard = DateGuard::new();
        let optimizer = ScheduleOptimizer::default();
        let _held = guard.acquire(date(), GuardPolicy::Reject).unwrap();
        let err = optimizer
            .optimize_guarded(
                &guard,
                GuardPolicy::Reject,
                date(),
                &[burn(1, 0.0, 50.0)],
                &weather(),
                &Constraints::default(),
                &AnnealingOptions::default().with_seed(1),
            )
            .unwrap_err();
        assert_eq!(err, ScheduleError::RunInProgress(date()));
    }
}
