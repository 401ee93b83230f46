//! Per-burn dispersion results

use crate::core_types::{
    BurnId, Degrees, GeoPoint, GramsPerSecond, Meters, MetersPerSecond, MicrogramsPerCubicMeter,
    SquareMeters, StabilityClass,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Elliptical footprint of a burn's above-threshold smoke
///
/// Centered on the farm, semi-major axis along the downwind bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlumeEllipse {
    /// Ellipse center (the burn location)
    pub center: GeoPoint,
    /// Half-length along the wind
    pub semi_major: Meters,
    /// Half-width across the wind
    pub semi_minor: Meters,
    /// Compass bearing of the major axis (downwind)
    pub bearing: Degrees,
}

impl PlumeEllipse {
    /// Footprint area `π · a · b`
    #[must_use]
    pub fn area(&self) -> SquareMeters {
        SquareMeters::new(PI * *self.semi_major * *self.semi_minor)
    }

    /// True for a burn whose smoke never exceeds the threshold
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self.semi_major <= 0.0 || *self.semi_minor <= 0.0
    }
}

/// Coarse ground-level concentration samples in the wind-aligned frame.
///
/// Values are stored row-major: one row per downwind distance, one column
/// per crosswind offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationGrid {
    /// Downwind sample distances (ascending)
    pub downwind: Vec<Meters>,
    /// Crosswind sample offsets (ascending, symmetric about 0)
    pub crosswind: Vec<Meters>,
    /// Concentrations, `downwind.len() × crosswind.len()`
    pub values: Vec<MicrogramsPerCubicMeter>,
}

impl ConcentrationGrid {
    /// (rows, columns)
    #[must_use]
    pub fn dims(&self) -> (usize, usize) {
        (self.downwind.len(), self.crosswind.len())
    }

    /// Sample at downwind row `i`, crosswind column `j`
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<MicrogramsPerCubicMeter> {
        if j >= self.crosswind.len() {
            return None;
        }
        self.values.get(i * self.crosswind.len() + j).copied()
    }

    /// Largest sampled concentration
    #[must_use]
    pub fn max(&self) -> MicrogramsPerCubicMeter {
        self.values
            .iter()
            .copied()
            .max()
            .unwrap_or(MicrogramsPerCubicMeter::ZERO)
    }
}

/// Output of [`DispersionModel::predict_dispersion`](super::DispersionModel::predict_dispersion)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispersionPrediction {
    /// Burn the prediction belongs to
    pub burn_id: BurnId,
    /// Average PM2.5 emission rate
    pub emission_rate: GramsPerSecond,
    /// Stability class the coefficients were taken from
    pub stability: StabilityClass,
    /// Wind speed actually used (after any calm-wind clamp)
    pub wind_speed: MetersPerSecond,
    /// True when the observed wind was replaced by the configured minimum
    pub wind_clamped: bool,
    /// Direction the smoke travels toward
    pub downwind_bearing: Degrees,
    /// Distance at which the peak concentration was evaluated
    pub peak_distance: Meters,
    /// Highest ground-level centerline concentration beyond the standoff
    pub peak_concentration: MicrogramsPerCubicMeter,
    /// Farthest downwind distance still at or above the safety threshold
    pub max_radius: Meters,
    /// True when the radius search hit the configured search limit
    pub radius_capped: bool,
    /// Area of [`Self::ellipse`]
    pub affected_area: SquareMeters,
    /// Affected-area footprint
    pub ellipse: PlumeEllipse,
    /// Visualization samples
    pub grid: ConcentrationGrid,
}

impl DispersionPrediction {
    /// True when the burn's smoke reaches the safety threshold anywhere
    #[must_use]
    pub fn exceeds_threshold(&self) -> bool {
        *self.max_radius > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipse_area() {
        let e = PlumeEllipse {
            center: GeoPoint::new(0.0, 0.0),
            semi_major: Meters::new(1000.0),
            semi_minor: Meters::new(400.0),
            bearing: Degrees::new(45.0),
        };
        assert!((*e.area() - PI * 400_000.0).abs() < 1e-6);
        assert!(!e.is_empty());
    }

    #[test]
    fn test_grid_indexing() {
        let grid = ConcentrationGrid {
            downwind: vec![Meters::new(100.0), Meters::new(200.0)],
            crosswind: vec![Meters::new(-10.0), Meters::ZERO, Meters::new(10.0)],
            values: (0..6)
                .map(|v| MicrogramsPerCubicMeter::new(f64::from(v)))
                .collect(),
        };
        assert_eq!(grid.dims(), (2, 3));
        assert_eq!(grid.get(1, 0), Some(MicrogramsPerCubicMeter::new(3.0)));
        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.max(), MicrogramsPerCubicMeter::new(5.0));
    }
}
