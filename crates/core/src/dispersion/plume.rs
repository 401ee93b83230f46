//! Steady-state Gaussian plume kernels
//!
//! Pure functions; no logging and no configuration lookups. Callers resolve
//! wind, standoff and class before evaluating.
//!
//! Ground-reflected concentration at receptor (x, y, z) for a continuous
//! release of strength Q at height H in wind u:
//!
//! ```text
//!            Q                  y²      ⎡     (z-H)²         (z+H)²  ⎤
//! C = ─────────────── exp(- ─────── ) · ⎢exp(-──────) + exp(-──────) ⎥
//!     2π · u · σy · σz         2σy²     ⎣      2σz²           2σz²   ⎦
//! ```
//!
//! At ground level the image term equals the real term, so the centerline
//! reduces to `Q / (π u σy σz) · exp(-H² / 2σz²)`.
//!
//! # References
//!
//! - Turner, D.B. (1994). "Workbook of Atmospheric Dispersion Estimates", ch. 2
//! - Seinfeld, J.H., Pandis, S.N. (2016). "Atmospheric Chemistry and Physics",
//!   3rd ed., §18.9

use crate::core_types::{
    Acres, CropType, GramsPerSecond, Hours, Meters, MetersPerSecond, MicrogramsPerCubicMeter,
};
use crate::dispersion::SigmaCoefficients;
use crate::error::{DomainError, Result};
use std::f64::consts::PI;

/// Average PM2.5 emission rate of a field burn
///
/// `Q = acreage × fuel load × emission factor / duration`
///
/// # Arguments
/// * `acreage` - Burned area
/// * `crop` - Residue type (fuel load and emission factor)
/// * `duration` - Hours over which the residue is consumed
///
/// # Errors
/// `InvalidInput` for non-positive acreage or duration.
pub fn emission_rate(
    acreage: Acres,
    crop: CropType,
    duration: Hours,
) -> Result<GramsPerSecond> {
    if !acreage.is_finite() || *acreage <= 0.0 {
        return Err(DomainError::invalid(
            "acreage",
            format!("acreage must be positive, got {acreage}"),
        ));
    }
    if !duration.is_finite() || *duration <= 0.0 {
        return Err(DomainError::invalid(
            "estimated_duration",
            format!("burn duration must be positive, got {duration}"),
        ));
    }
    let grams = *acreage * crop.pm25_grams_per_acre();
    Ok(GramsPerSecond::new(grams / duration.to_seconds()))
}

/// A resolved continuous release, ready to evaluate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlumeSource {
    /// PM2.5 emission rate
    pub emission_rate: GramsPerSecond,
    /// Transport wind speed (strictly positive)
    pub wind_speed: MetersPerSecond,
    /// Effective release height
    pub source_height: Meters,
    /// σ coefficients of the resolved stability class
    pub coefficients: SigmaCoefficients,
}

impl PlumeSource {
    /// Concentration at a receptor in the wind-aligned frame.
    ///
    /// # Arguments
    /// * `x` - Downwind distance from the source (must be > 0)
    /// * `y` - Crosswind offset
    /// * `z` - Receptor height above ground (must be ≥ 0)
    ///
    /// # Errors
    /// `NumericDomain` at or behind the source, where the plume formula is
    /// singular; `InvalidInput` for a receptor below ground.
    pub fn concentration(
        &self,
        x: Meters,
        y: Meters,
        z: Meters,
    ) -> Result<MicrogramsPerCubicMeter> {
        if !x.is_finite() || *x <= 0.0 {
            return Err(DomainError::numeric(format!(
                "plume evaluated at downwind distance {x}; the model is singular for x <= 0"
            )));
        }
        if !z.is_finite() || *z < 0.0 {
            return Err(DomainError::invalid(
                "receptor_height",
                format!("receptor must be at or above ground, got {z}"),
            ));
        }
        if *self.wind_speed <= 0.0 {
            return Err(DomainError::numeric("plume evaluated with zero wind speed"));
        }

        let sy = *self.coefficients.sigma_y(x);
        let sz = *self.coefficients.sigma_z(x);
        let h = *self.source_height;

        let lateral = (-(y.powi(2)) / (2.0 * sy * sy)).exp();
        let vertical = (-(*z - h).powi(2) / (2.0 * sz * sz)).exp()
            + (-(*z + h).powi(2) / (2.0 * sz * sz)).exp();
        let grams = *self.emission_rate / (2.0 * PI * *self.wind_speed * sy * sz) * lateral * vertical;

        if !grams.is_finite() {
            return Err(DomainError::numeric(format!(
                "non-finite concentration at x = {x}, y = {y}, z = {z}"
            )));
        }
        Ok(MicrogramsPerCubicMeter::from_grams_per_cubic_meter(grams.max(0.0)))
    }

    /// Ground-level concentration on the plume centerline
    pub fn ground_centerline(&self, x: Meters) -> Result<MicrogramsPerCubicMeter> {
        self.concentration(x, Meters::ZERO, Meters::ZERO)
    }

    /// Downwind distance beyond which the ground centerline decreases
    /// strictly: the analytic peak, but never closer than `standoff`.
    #[must_use]
    pub fn decay_onset(&self, standoff: Meters) -> Meters {
        self.coefficients
            .centerline_peak_distance(self.source_height)
            .max(standoff)
    }
}
