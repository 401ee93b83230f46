//! Weighted schedule cost
//!
//! ```text
//! cost = w_p · Σ (priority/100) · slot/(S-1)
//!      + w_c · Σ conflict(i, j)          over pairs sharing a slot
//!      + w_w · Σ risk(slot)              over assigned burns
//! ```
//!
//! The priority term grows as high-priority burns are pushed to later slots.
//! A conflict costs 1 (`Count`) or its severity weight (`SeverityWeighted`).
//! Slot weather risk is the mean normalised distance of the slot's wind,
//! humidity and temperature from the ideal burn-condition profile.

use crate::config::{BurnConditionProfile, ConflictPenalty, Constraints};
use crate::conflict::ConflictMatrix;
use crate::core_types::{BurnRequest, WeatherSnapshot};
use crate::schedule::SlotPlan;
use serde::{Deserialize, Serialize};

/// Temperature excess over the profile maximum that counts as full risk
const TEMPERATURE_RISK_SPAN_C: f64 = 10.0;

/// Components of a candidate's cost
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Unweighted priority-deferral loss
    pub priority: f64,
    /// Unweighted conflict penalty
    pub conflicts: f64,
    /// Unweighted weather risk
    pub weather: f64,
    /// Number of conflicting pairs sharing a slot
    pub conflict_count: usize,
    /// Weighted sum; lower is better
    pub total: f64,
}

/// Representative weather for each slot.
///
/// With a forecast, each slot takes the entry closest to its midpoint
/// (earlier entry on ties). Without one, the day snapshot is shifted
/// through the diurnal cycle to the slot midpoint.
#[must_use]
pub fn slot_weather(
    plan: &SlotPlan,
    day: &WeatherSnapshot,
    forecast: Option<&[WeatherSnapshot]>,
) -> Vec<WeatherSnapshot> {
    plan.slots()
        .iter()
        .map(|slot| {
            let target = plan.date().and_time(slot.midpoint());
            forecast
                .and_then(|entries| {
                    entries
                        .iter()
                        .min_by_key(|w| (w.timestamp - target).num_seconds().abs())
                })
                .cloned()
                .unwrap_or_else(|| day.at_time_of_day(slot.midpoint()))
        })
        .collect()
}

/// Normalised distance of a weather state from ideal burn conditions, in
/// `[0, 1]`.
#[must_use]
pub fn weather_risk(weather: &WeatherSnapshot, profile: &BurnConditionProfile) -> f64 {
    let band = |value: f64, lo: f64, hi: f64, above_span: f64| -> f64 {
        let deviation = if value < lo {
            (lo - value) / lo
        } else if value > hi {
            (value - hi) / above_span
        } else {
            0.0
        };
        deviation.clamp(0.0, 1.0)
    };

    let wind = band(
        *weather.wind_speed,
        *profile.ideal_wind_min,
        *profile.ideal_wind_max,
        *profile.ideal_wind_max,
    );
    let humidity = band(
        *weather.humidity,
        *profile.ideal_humidity_min,
        *profile.ideal_humidity_max,
        100.0 - *profile.ideal_humidity_max,
    );
    let temperature =
        ((*weather.temperature - *profile.max_temperature) / TEMPERATURE_RISK_SPAN_C).clamp(0.0, 1.0);

    (wind + humidity + temperature) / 3.0
}

/// Scores slot assignments for one run.
///
/// Burns are addressed by their index in the run's active burn list.
#[derive(Debug)]
pub struct CostModel<'a> {
    matrix: &'a ConflictMatrix,
    priorities: Vec<f64>,
    slot_risk: Vec<f64>,
    weights: (f64, f64, f64),
    penalty: ConflictPenalty,
}

impl<'a> CostModel<'a> {
    /// Build a cost model over `burns` (the active set, matching `matrix`)
    #[must_use]
    pub fn new(
        burns: &[BurnRequest],
        matrix: &'a ConflictMatrix,
        slot_risk: Vec<f64>,
        constraints: &Constraints,
    ) -> Self {
        CostModel {
            matrix,
            priorities: burns.iter().map(|b| b.priority_score / 100.0).collect(),
            slot_risk,
            weights: (
                constraints.priority_weight,
                constraints.conflict_weight,
                constraints.weather_weight,
            ),
            penalty: constraints.conflict_penalty,
        }
    }

    /// Number of slots
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_risk.len()
    }

    /// Score an assignment; `slot_of[i]` is the slot of burn `i`.
    #[must_use]
    pub fn evaluate(&self, slot_of: &[usize]) -> CostBreakdown {
        let last_slot = self.slot_count().saturating_sub(1).max(1) as f64;

        let mut priority = 0.0;
        let mut weather = 0.0;
        for (i, &slot) in slot_of.iter().enumerate() {
            priority += self.priorities[i] * slot as f64 / last_slot;
            weather += self.slot_risk[slot];
        }

        let mut conflicts = 0.0;
        let mut conflict_count = 0;
        for i in 0..slot_of.len() {
            for j in i + 1..slot_of.len() {
                if slot_of[i] != slot_of[j] {
                    continue;
                }
                if let Some(c) = self.matrix.get(i, j) {
                    conflict_count += 1;
                    conflicts += match self.penalty {
                        ConflictPenalty::Count => 1.0,
                        ConflictPenalty::SeverityWeighted => c.severity.weight(),
                    };
                }
            }
        }

        let (wp, wc, ww) = self.weights;
        CostBreakdown {
            priority,
            conflicts,
            weather,
            conflict_count,
            total: wp * priority + wc * conflicts + ww * weather,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictDetector;
    use crate::core_types::{
        Acres, Celsius, CropType, Degrees, GeoPoint, Meters, MetersPerSecond, Percent,
        StabilityClass, TimeWindow,
    };
    use crate::dispersion::DispersionModel;
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
    }

    fn mild(hour: u32) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: Celsius::new(20.0),
            humidity: Percent::new(45.0),
            wind_speed: MetersPerSecond::new(4.0),
            wind_direction: Degrees::new(270.0),
            stability: StabilityClass::D,
            timestamp: date().and_hms_opt(hour, 0, 0).unwrap(),
            location: GeoPoint::new(38.5, -121.7),
        }
    }

    #[test]
    fn test_ideal_conditions_have_no_risk() {
        assert_eq!(weather_risk(&mild(10), &BurnConditionProfile::default()), 0.0);
    }

    #[test]
    fn test_risk_grows_away_from_profile() {
        let profile = BurnConditionProfile::default();
        let mut gusty = mild(10);
        gusty.wind_speed = MetersPerSecond::new(10.5);
        let mut dry_hot = mild(10);
        dry_hot.humidity = Percent::new(15.0);
        dry_hot.temperature = Celsius::new(40.0);

        let gusty_risk = weather_risk(&gusty, &profile);
        let dry_hot_risk = weather_risk(&dry_hot, &profile);
        assert!((gusty_risk - 0.5 / 3.0).abs() < 1e-12);
        assert!(dry_hot_risk > gusty_risk);
        assert!(dry_hot_risk <= 1.0);
    }

    #[test]
    fn test_forecast_entry_nearest_midpoint() {
        let plan = SlotPlan::new(date(), &Constraints::default()).unwrap();
        let forecast: Vec<_> = (6..18)
            .map(|h| {
                let mut w = mild(h);
                w.temperature = Celsius::new(f64::from(h));
                w
            })
            .collect();
        let per_slot = slot_weather(&plan, &mild(10), Some(&forecast));
        let temps: Vec<_> = per_slot.iter().map(|w| *w.temperature).collect();
        assert_eq!(temps, vec![9.0, 11.0, 13.0, 15.0]);
    }

    #[test]
    fn test_diurnal_fallback_without_forecast() {
        let plan = SlotPlan::new(date(), &Constraints::default()).unwrap();
        let per_slot = slot_weather(&plan, &mild(9), None);
        assert_eq!(per_slot[0], mild(9).at_time_of_day(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert!(per_slot[2].temperature > per_slot[0].temperature);
    }

    #[test]
    fn test_cost_terms() {
        let model = DispersionModel::default();
        let origin = GeoPoint::new(38.5, -121.7);
        let burns: Vec<_> = (0..3u64)
            .map(|i| {
                BurnRequest::new(
                    i,
                    origin.destination(Degrees::new(0.0), Meters::new(2_000.0 * i as f64)),
                    Acres::new(20.0),
                    CropType::Wheat,
                    date(),
                    TimeWindow::hours(9, 12).unwrap(),
                )
                .with_priority(100.0)
            })
            .collect();
        let preds: Vec<_> = burns
            .iter()
            .map(|b| model.predict_dispersion(b, &mild(10)).unwrap())
            .collect();
        let constraints = Constraints {
            conflict_penalty: ConflictPenalty::Count,
            ..Constraints::default()
        };
        let matrix = ConflictMatrix::build(
            &ConflictDetector::default(),
            &burns,
            &preds,
            constraints.min_separation_distance,
        );
        let cost = CostModel::new(&burns, &matrix, vec![0.0, 0.0, 0.0, 0.5], &constraints);

        let together = cost.evaluate(&[0, 0, 0]);
        assert_eq!(together.conflict_count, 3);
        assert_eq!(together.priority, 0.0);

        let spread = cost.evaluate(&[0, 1, 3]);
        assert_eq!(spread.conflict_count, 0);
        assert!((spread.priority - (1.0 / 3.0 + 1.0)).abs() < 1e-12);
        assert!((spread.weather - 0.5).abs() < 1e-12);
        assert!(spread.total < together.total);
    }
}
