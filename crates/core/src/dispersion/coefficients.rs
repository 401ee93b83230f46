//! Pasquill–Gifford dispersion coefficients
//!
//! Plume spread grows with downwind distance as a power law whose
//! coefficients depend on the atmospheric stability class:
//!
//! ```text
//! σy(x) = a · x^b      (horizontal, meters)
//! σz(x) = c · x^d      (vertical, meters)
//! ```
//!
//! with `x` in kilometers. The crosswind exponent `b = 0.894` is shared by
//! all classes; the vertical fit uses Martin's near-field (x < 1 km)
//! coefficients, which are the conservative choice for low field-burn plumes.
//!
//! # References
//!
//! - Pasquill, F. (1961). "The estimation of the dispersion of windborne material"
//!   Meteorological Magazine, 90, 33-49
//! - Gifford, F.A. (1961). "Use of routine meteorological observations for
//!   estimating atmospheric dispersion". Nuclear Safety, 2(4), 47-51
//! - Martin, D.O. (1976). "Comment on the change of concentration standard
//!   deviations with distance". JAPCA, 26(2), 145-147
//! - Turner, D.B. (1994). "Workbook of Atmospheric Dispersion Estimates", 2nd ed.

use crate::core_types::{Meters, StabilityClass};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Power-law coefficients for one stability class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaCoefficients {
    /// σy coefficient (m at x = 1 km)
    pub a: f64,
    /// σy exponent
    pub b: f64,
    /// σz coefficient (m at x = 1 km)
    pub c: f64,
    /// σz exponent
    pub d: f64,
}

impl SigmaCoefficients {
    /// Horizontal spread σy at downwind distance `x`
    #[inline]
    #[must_use]
    pub fn sigma_y(&self, x: Meters) -> Meters {
        Meters::new(self.a * x.to_kilometers().powf(self.b))
    }

    /// Vertical spread σz at downwind distance `x`
    #[inline]
    #[must_use]
    pub fn sigma_z(&self, x: Meters) -> Meters {
        Meters::new(self.c * x.to_kilometers().powf(self.d))
    }

    /// Downwind distance of the ground-level centerline maximum for a
    /// release at height `h`.
    ///
    /// Setting dC/dx = 0 for `C ∝ x^-(b+d) · exp(-h² / 2σz²)` gives
    ///
    /// ```text
    /// x*^(2d) = h² · d / (c² · (b + d))
    /// ```
    ///
    /// Beyond `x*` the centerline concentration decreases strictly. A
    /// ground-level release (`h = 0`) peaks at the source.
    #[must_use]
    pub fn centerline_peak_distance(&self, h: Meters) -> Meters {
        if *h <= 0.0 {
            return Meters::ZERO;
        }
        let ratio = h.powi(2) * self.d / (self.c.powi(2) * (self.b + self.d));
        Meters::from_kilometers(ratio.powf(1.0 / (2.0 * self.d)))
    }

    fn is_usable(&self) -> bool {
        [self.a, self.b, self.c, self.d]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Crosswind exponent shared by every class
const SIGMA_Y_EXPONENT: f64 = 0.894;

/// Coefficients for the six stability classes, indexed A..F
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigmaTable {
    /// One entry per class, A first
    pub classes: [SigmaCoefficients; 6],
}

impl SigmaTable {
    /// Martin (1976) fit, x < 1 km branch for σz
    pub const MARTIN_1976: SigmaTable = SigmaTable {
        classes: [
            SigmaCoefficients { a: 213.0, b: SIGMA_Y_EXPONENT, c: 440.8, d: 1.041 },
            SigmaCoefficients { a: 156.0, b: SIGMA_Y_EXPONENT, c: 106.6, d: 1.149 },
            SigmaCoefficients { a: 104.0, b: SIGMA_Y_EXPONENT, c: 61.0, d: 0.911 },
            SigmaCoefficients { a: 68.0, b: SIGMA_Y_EXPONENT, c: 33.2, d: 0.725 },
            SigmaCoefficients { a: 50.5, b: SIGMA_Y_EXPONENT, c: 22.8, d: 0.678 },
            SigmaCoefficients { a: 34.0, b: SIGMA_Y_EXPONENT, c: 14.35, d: 0.740 },
        ],
    };

    /// Coefficients for a stability class
    #[inline]
    #[must_use]
    pub fn get(&self, class: StabilityClass) -> SigmaCoefficients {
        self.classes[class.index()]
    }

    /// Every coefficient must be finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for class in StabilityClass::ALL {
            if !self.get(class).is_usable() {
                return Err(ConfigError::Invalid(format!(
                    "sigma coefficients for class {class} must be finite and positive"
                )));
            }
        }
        Ok(())
    }
}

impl Default for SigmaTable {
    fn default() -> Self {
        Self::MARTIN_1976
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sigma_at_one_kilometer_equals_coefficients() {
        let table = SigmaTable::default();
        for class in StabilityClass::ALL {
            let k = table.get(class);
            let x = Meters::from_kilometers(1.0);
            assert_relative_eq!(*k.sigma_y(x), k.a, epsilon = 1e-9);
            assert_relative_eq!(*k.sigma_z(x), k.c, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_spread_narrows_from_unstable_to_stable() {
        let table = SigmaTable::default();
        for km in [0.1, 0.2, 0.5, 1.0, 2.0, 5.0] {
            let x = Meters::from_kilometers(km);
            for pair in StabilityClass::ALL.windows(2) {
                let (unstable, stable) = (table.get(pair[0]), table.get(pair[1]));
                assert!(
                    unstable.sigma_y(x) > stable.sigma_y(x),
                    "σy {} vs {} at {x}",
                    pair[0],
                    pair[1]
                );
                assert!(
                    unstable.sigma_z(x) > stable.sigma_z(x),
                    "σz {} vs {} at {x}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_peak_distance_is_stationary_point() {
        // d/dx ln C changes sign at x*
        let k = SigmaTable::default().get(StabilityClass::F);
        let h = Meters::new(10.0);
        let peak = k.centerline_peak_distance(h);
        let ln_c = |x: Meters| {
            let sz = *k.sigma_z(x);
            -(*k.sigma_y(x)).ln() - sz.ln() - h.powi(2) / (2.0 * sz * sz)
        };
        assert!(*peak > 0.0);
        assert!(ln_c(peak) > ln_c(peak * 0.9));
        assert!(ln_c(peak) > ln_c(peak * 1.1));
    }

    #[test]
    fn test_ground_release_peaks_at_source() {
        let k = SigmaTable::default().get(StabilityClass::D);
        assert_eq!(k.centerline_peak_distance(Meters::ZERO), Meters::ZERO);
    }

    #[test]
    fn test_non_positive_coefficient_rejected() {
        let mut table = SigmaTable::default();
        table.classes[2].c = 0.0;
        assert!(table.validate().is_err());
    }
}
