//! Dispersion model service
//!
//! Resolves a burn and a weather snapshot into a [`PlumeSource`], then
//! derives the scalars the conflict detector works from: peak ground
//! concentration, maximum dispersion radius and the affected-area ellipse.
//!
//! # Radius search
//!
//! Beyond the decay onset (the analytic centerline peak, never closer than
//! the configured standoff) the ground centerline decreases strictly, so the
//! threshold crossing is unique. The search doubles the step from the onset
//! until the concentration drops below the threshold, then bisects the
//! bracket down to the configured tolerance.

use crate::config::{CalmWindPolicy, DispersionConfig};
use crate::core_types::geo::bearing_unit_vector;
use crate::core_types::{
    BurnRequest, GeoPoint, Meters, MetersPerSecond, MicrogramsPerCubicMeter, WeatherSnapshot,
};
use crate::dispersion::{
    emission_rate, ConcentrationGrid, DispersionPrediction, PlumeEllipse, PlumeSource,
};
use crate::error::{ConfigError, DomainError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Concentration at a geographic receptor, with its wind-frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointConcentration {
    /// Distance along the plume axis (negative is upwind)
    pub downwind: Meters,
    /// Signed distance across the plume axis
    pub crosswind: Meters,
    /// Concentration at the receptor
    pub concentration: MicrogramsPerCubicMeter,
}

/// Gaussian plume dispersion model.
///
/// Immutable after construction; every method is pure apart from logging
/// and may be called from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct DispersionModel {
    config: DispersionConfig,
}

impl DispersionModel {
    /// Build a model from a validated configuration
    pub fn new(config: DispersionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &DispersionConfig {
        &self.config
    }

    /// Wind speed to model with, and whether it was clamped.
    ///
    /// Calm wind (at or below the configured minimum) is outside the
    /// steady-state plume's validity and is handled by the calm-wind policy.
    pub fn resolve_wind(
        &self,
        weather: &WeatherSnapshot,
    ) -> Result<(MetersPerSecond, bool)> {
        weather.validate()?;
        if weather.wind_speed > self.config.min_wind_speed {
            return Ok((weather.wind_speed, false));
        }
        match self.config.calm_wind {
            CalmWindPolicy::Reject => Err(DomainError::invalid(
                "weather.wind_speed",
                format!(
                    "wind speed {} is at or below the calm limit {}; the steady-state plume model does not apply",
                    weather.wind_speed, self.config.min_wind_speed
                ),
            )),
            CalmWindPolicy::ClampTo(speed) => {
                warn!(
                    "Calm wind {} clamped to {} for dispersion modeling",
                    weather.wind_speed, speed
                );
                Ok((speed, true))
            }
        }
    }

    /// Resolve a burn under the given weather into a plume source.
    pub fn plume_source(
        &self,
        burn: &BurnRequest,
        weather: &WeatherSnapshot,
    ) -> Result<(PlumeSource, bool)> {
        burn.validate()?;
        let (wind_speed, clamped) = self.resolve_wind(weather)?;
        let source = PlumeSource {
            emission_rate: emission_rate(burn.acreage, burn.crop, burn.burn_duration())?,
            wind_speed,
            source_height: self.config.source_height,
            coefficients: self.config.sigma_table.get(weather.stability),
        };
        Ok((source, clamped))
    }

    /// Predict the ground-level smoke footprint of one burn.
    ///
    /// # Errors
    /// `InvalidInput` for malformed burns or weather and for calm wind under
    /// the `Reject` policy.
    pub fn predict_dispersion(
        &self,
        burn: &BurnRequest,
        weather: &WeatherSnapshot,
    ) -> Result<DispersionPrediction> {
        let (source, wind_clamped) = self.plume_source(burn, weather)?;

        let peak_distance = source.decay_onset(self.config.min_standoff);
        let peak_concentration = source.ground_centerline(peak_distance)?;
        let (max_radius, radius_capped) = self.max_dispersion_radius(&source, peak_distance)?;

        let downwind_bearing = weather.downwind_bearing();
        let ellipse = PlumeEllipse {
            center: burn.location,
            semi_major: max_radius,
            semi_minor: max_radius * self.config.crosswind_aspect_ratio,
            bearing: downwind_bearing,
        };
        let grid = self.sample_grid(&source, peak_distance, max_radius)?;

        debug!(
            "{}: Q = {}, class {}, peak {} at {}, radius {}",
            burn.id, source.emission_rate, weather.stability, peak_concentration, peak_distance, max_radius
        );

        Ok(DispersionPrediction {
            burn_id: burn.id,
            emission_rate: source.emission_rate,
            stability: weather.stability,
            wind_speed: source.wind_speed,
            wind_clamped,
            downwind_bearing,
            peak_distance,
            peak_concentration,
            max_radius,
            radius_capped,
            affected_area: ellipse.area(),
            ellipse,
            grid,
        })
    }

    /// Predict every burn in parallel; results keep input order.
    pub fn predict_many(
        &self,
        burns: &[BurnRequest],
        weather: &WeatherSnapshot,
    ) -> Vec<Result<DispersionPrediction>> {
        burns
            .par_iter()
            .map(|burn| self.predict_dispersion(burn, weather))
            .collect()
    }

    /// Farthest downwind distance at which the ground centerline is still at
    /// or above the safety threshold, and whether the search limit was hit.
    ///
    /// Returns zero when the concentration is below the threshold already at
    /// `onset`.
    pub fn max_dispersion_radius(
        &self,
        source: &PlumeSource,
        onset: Meters,
    ) -> Result<(Meters, bool)> {
        let threshold = self.config.safety_threshold;
        let limit = self.config.max_search_distance;
        let onset = onset.min(limit);

        if source.ground_centerline(onset)? < threshold {
            return Ok((Meters::ZERO, false));
        }

        let mut inside = onset;
        let mut outside = onset * 2.0;
        loop {
            if outside >= limit {
                if source.ground_centerline(limit)? >= threshold {
                    warn!(
                        "Dispersion radius search capped at {}: concentration still above {}",
                        limit, threshold
                    );
                    return Ok((limit, true));
                }
                outside = limit;
                break;
            }
            if source.ground_centerline(outside)? < threshold {
                break;
            }
            inside = outside;
            outside = outside * 2.0;
        }

        while *outside - *inside > *self.config.radius_tolerance {
            let mid = (inside + outside) * 0.5;
            if source.ground_centerline(mid)? >= threshold {
                inside = mid;
            } else {
                outside = mid;
            }
        }
        Ok((inside, false))
    }

    /// Concentration at a receptor in the burn's wind frame.
    ///
    /// Upwind receptors (`x < 0`) see no smoke. Receptors closer than the
    /// standoff are evaluated at the standoff, where the plume formula is
    /// still well conditioned; the clamp is logged.
    pub fn concentration_at(
        &self,
        burn: &BurnRequest,
        weather: &WeatherSnapshot,
        x: Meters,
        y: Meters,
        z: Meters,
    ) -> Result<MicrogramsPerCubicMeter> {
        let (source, _) = self.plume_source(burn, weather)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(DomainError::invalid(
                "receptor",
                format!("receptor offsets must be finite, got ({x}, {y})"),
            ));
        }
        if *x < 0.0 {
            return Ok(MicrogramsPerCubicMeter::ZERO);
        }
        let x = if x < self.config.min_standoff {
            warn!(
                "Receptor at {} is inside the {} standoff; evaluating at the standoff",
                x, self.config.min_standoff
            );
            self.config.min_standoff
        } else {
            x
        };
        source.concentration(x, y, z)
    }

    /// Concentration at a geographic receptor at the configured receptor
    /// height.
    pub fn concentration_at_point(
        &self,
        burn: &BurnRequest,
        weather: &WeatherSnapshot,
        receptor: &GeoPoint,
    ) -> Result<PointConcentration> {
        receptor.validate()?;
        let offset = receptor.local_offset(&burn.location);
        let axis = bearing_unit_vector(weather.downwind_bearing());
        // right-hand normal of the plume axis
        let downwind = Meters::new(offset.dot(&axis));
        let crosswind = Meters::new(axis.y * offset.x - axis.x * offset.y);
        let concentration =
            self.concentration_at(burn, weather, downwind, crosswind, self.config.receptor_height)?;
        Ok(PointConcentration {
            downwind,
            crosswind,
            concentration,
        })
    }

    fn sample_grid(
        &self,
        source: &PlumeSource,
        onset: Meters,
        radius: Meters,
    ) -> Result<ConcentrationGrid> {
        let rows = self.config.grid_downwind_cells;
        let cols = self.config.grid_crosswind_cells;
        let far = radius.max(onset * 4.0);

        let downwind: Vec<Meters> = (0..rows)
            .map(|i| onset + (far - onset) * (i as f64 / (rows - 1) as f64))
            .collect();
        let half_width = far * self.config.crosswind_aspect_ratio;
        let crosswind: Vec<Meters> = if cols == 1 {
            vec![Meters::ZERO]
        } else {
            (0..cols)
                .map(|j| half_width * (2.0 * j as f64 / (cols - 1) as f64 - 1.0))
                .collect()
        };

        let z = self.config.receptor_height;
        let values = downwind
            .iter()
            .flat_map(|&x| crosswind.iter().map(move |&y| source.concentration(x, y, z)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ConcentrationGrid {
            downwind,
            crosswind,
            values,
        })
    }
}
