//! Semantic unit types for type-safe physical quantity handling
//!
//! Newtype wrappers keep plume inputs and outputs from being mixed up
//! (a wind speed in mph passed where m/s is expected, a concentration in
//! g/m³ compared against a µg/m³ guideline).
//!
//! # Design
//! - Every quantity wraps an `f64`; the dispersion kernels work in double
//!   precision because concentrations span ten orders of magnitude
//! - `Deref` exposes the raw value for arithmetic inside physics kernels
//! - Total ordering via `total_cmp` so quantities can be sorted and used with
//!   `min`/`max` (NaN sorts above every value)
//! - Serde serializes the bare number
//! - Conversions between related units are explicit methods
//!
//! # Usage
//! ```
//! use burnwise_core::core_types::units::{Meters, MetersPerSecond};
//!
//! let wind = MetersPerSecond::from_mph(10.0);
//! assert!((*wind - 4.4704).abs() < 1e-9);
//!
//! let d = Meters::from_kilometers(1.5);
//! assert_eq!(d.max(Meters::new(900.0)), Meters::new(1500.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Deref, Div, Mul, Sub};

/// Declares an `f64` quantity newtype with ordering, arithmetic and display.
macro_rules! quantity {
    ($(#[$meta:meta])* $name:ident, $suffix:literal, $precision:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(f64);

        impl $name {
            /// Zero value
            pub const ZERO: $name = $name(0.0);

            /// Wrap a raw value.
            #[inline]
            #[must_use]
            pub const fn new(value: f64) -> Self {
                $name(value)
            }

            /// Raw value.
            #[inline]
            #[must_use]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// True when the value is neither NaN nor infinite.
            #[inline]
            #[must_use]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl From<f64> for $name {
            fn from(v: f64) -> Self {
                $name(v)
            }
        }

        impl From<$name> for f64 {
            fn from(q: $name) -> f64 {
                q.0
            }
        }

        impl Add for $name {
            type Output = $name;
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: $name) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $name {
            type Output = $name;
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = $name;
            fn mul(self, rhs: f64) -> $name {
                $name(self.0 * rhs)
            }
        }

        impl Div<f64> for $name {
            type Output = $name;
            fn div(self, rhs: f64) -> $name {
                $name(self.0 / rhs)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.*} {}", $precision, self.0, $suffix)
            }
        }
    };
}

// ============================================================================
// SPATIAL
// ============================================================================

quantity!(
    /// Distance in meters
    Meters,
    "m",
    2
);

impl Meters {
    /// Create from kilometers
    #[inline]
    #[must_use]
    pub fn from_kilometers(km: f64) -> Self {
        Meters(km * 1000.0)
    }

    /// Convert to kilometers
    #[inline]
    #[must_use]
    pub fn to_kilometers(self) -> f64 {
        self.0 / 1000.0
    }
}

// Cross-type operation: length × length = area
impl Mul<Meters> for Meters {
    type Output = SquareMeters;
    fn mul(self, rhs: Meters) -> SquareMeters {
        SquareMeters(self.0 * rhs.0)
    }
}

quantity!(
    /// Area in square meters
    SquareMeters,
    "m²",
    1
);

impl SquareMeters {
    /// Square meters per hectare
    const PER_HECTARE: f64 = 10_000.0;

    /// Convert to hectares
    #[inline]
    #[must_use]
    pub fn to_hectares(self) -> f64 {
        self.0 / Self::PER_HECTARE
    }

    /// Convert to square kilometers
    #[inline]
    #[must_use]
    pub fn to_square_kilometers(self) -> f64 {
        self.0 / 1.0e6
    }
}

quantity!(
    /// Field area in acres
    Acres,
    "ac",
    1
);

impl Acres {
    /// Square meters per international acre
    pub const SQUARE_METERS_PER_ACRE: f64 = 4046.8564224;

    /// Convert to square meters
    #[inline]
    #[must_use]
    pub fn to_square_meters(self) -> SquareMeters {
        SquareMeters(self.0 * Self::SQUARE_METERS_PER_ACRE)
    }

    /// Convert to hectares
    #[inline]
    #[must_use]
    pub fn to_hectares(self) -> f64 {
        self.to_square_meters().to_hectares()
    }
}

// ============================================================================
// VELOCITY
// ============================================================================

quantity!(
    /// Wind speed in meters per second
    MetersPerSecond,
    "m/s",
    2
);

impl MetersPerSecond {
    /// Meters per second in one statute mile per hour
    const MPS_PER_MPH: f64 = 0.44704;

    /// Create from miles per hour
    #[inline]
    #[must_use]
    pub fn from_mph(mph: f64) -> Self {
        MetersPerSecond(mph * Self::MPS_PER_MPH)
    }

    /// Create from kilometers per hour
    #[inline]
    #[must_use]
    pub fn from_kmh(kmh: f64) -> Self {
        MetersPerSecond(kmh / 3.6)
    }

    /// Convert to miles per hour
    #[inline]
    #[must_use]
    pub fn to_mph(self) -> f64 {
        self.0 / Self::MPS_PER_MPH
    }

    /// Convert to kilometers per hour
    #[inline]
    #[must_use]
    pub fn to_kmh(self) -> f64 {
        self.0 * 3.6
    }
}

// ============================================================================
// TEMPERATURE & MOISTURE
// ============================================================================

quantity!(
    /// Air temperature in degrees Celsius
    Celsius,
    "°C",
    1
);

impl Celsius {
    /// Create from degrees Fahrenheit
    #[inline]
    #[must_use]
    pub fn from_fahrenheit(f: f64) -> Self {
        Celsius((f - 32.0) * 5.0 / 9.0)
    }

    /// Convert to degrees Fahrenheit
    #[inline]
    #[must_use]
    pub fn to_fahrenheit(self) -> f64 {
        self.0 * 9.0 / 5.0 + 32.0
    }
}

quantity!(
    /// Relative humidity or cloud cover in percent (0-100)
    Percent,
    "%",
    1
);

impl Percent {
    /// Clamp into the valid 0-100 range
    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Percent(self.0.clamp(0.0, 100.0))
    }

    /// Convert to a 0-1 fraction
    #[inline]
    #[must_use]
    pub fn as_fraction(self) -> f64 {
        self.0 / 100.0
    }
}

// ============================================================================
// ANGLE
// ============================================================================

quantity!(
    /// Compass angle in degrees (0 = North, 90 = East)
    Degrees,
    "°",
    1
);

impl Degrees {
    /// Wrap into [0, 360)
    #[inline]
    #[must_use]
    pub fn normalized(self) -> Self {
        let wrapped = self.0.rem_euclid(360.0);
        // rem_euclid can return exactly 360.0 for tiny negative inputs
        if wrapped >= 360.0 {
            Degrees(0.0)
        } else {
            Degrees(wrapped)
        }
    }

    /// The opposite compass direction
    #[inline]
    #[must_use]
    pub fn reversed(self) -> Self {
        Degrees(self.0 + 180.0).normalized()
    }

    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }
}

// ============================================================================
// TIME
// ============================================================================

quantity!(
    /// Duration in hours
    Hours,
    "h",
    2
);

impl Hours {
    /// Convert to seconds
    #[inline]
    #[must_use]
    pub fn to_seconds(self) -> f64 {
        self.0 * 3600.0
    }

    /// Create from a chrono duration
    #[inline]
    #[must_use]
    pub fn from_duration(d: chrono::Duration) -> Self {
        Hours(d.num_seconds() as f64 / 3600.0)
    }
}

// ============================================================================
// EMISSION & CONCENTRATION
// ============================================================================

quantity!(
    /// Pollutant mass emission rate in grams per second
    GramsPerSecond,
    "g/s",
    3
);

quantity!(
    /// Mass concentration in micrograms per cubic meter
    MicrogramsPerCubicMeter,
    "µg/m³",
    2
);

impl MicrogramsPerCubicMeter {
    /// EPA 24-hour PM2.5 National Ambient Air Quality Standard
    pub const PM25_24H_NAAQS: MicrogramsPerCubicMeter = MicrogramsPerCubicMeter(35.0);

    /// Create from grams per cubic meter
    #[inline]
    #[must_use]
    pub fn from_grams_per_cubic_meter(g: f64) -> Self {
        MicrogramsPerCubicMeter(g * 1.0e6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wind_speed_conversions() {
        let wind = MetersPerSecond::from_mph(10.0);
        assert_relative_eq!(*wind, 4.4704, epsilon = 1e-12);
        assert_relative_eq!(wind.to_mph(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(*MetersPerSecond::from_kmh(36.0), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_temperature_conversions() {
        assert_relative_eq!(*Celsius::from_fahrenheit(212.0), 100.0, epsilon = 1e-12);
        assert_relative_eq!(Celsius::new(20.0).to_fahrenheit(), 68.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degrees_normalization() {
        assert_eq!(Degrees::new(370.0).normalized(), Degrees::new(10.0));
        assert_eq!(Degrees::new(-90.0).normalized(), Degrees::new(270.0));
        assert_eq!(Degrees::new(225.0).reversed(), Degrees::new(45.0));
        assert!(*Degrees::new(-1e-18).normalized() < 360.0);
    }

    #[test]
    fn test_area_conversions() {
        let field = Acres::new(100.0);
        assert_relative_eq!(field.to_hectares(), 40.468564224, epsilon = 1e-9);
        let area = Meters::new(100.0) * Meters::new(50.0);
        assert_eq!(area, SquareMeters::new(5000.0));
        assert_relative_eq!(area.to_hectares(), 0.5);
    }

    #[test]
    fn test_total_ordering() {
        let mut values = vec![Meters::new(3.0), Meters::new(f64::NAN), Meters::new(1.0)];
        values.sort();
        assert_eq!(values[0], Meters::new(1.0));
        assert!(values[2].is_nan());
    }

    #[test]
    fn test_display_suffixes() {
        assert_eq!(format!("{}", Meters::new(12.345)), "12.35 m");
        assert_eq!(format!("{}", MicrogramsPerCubicMeter::new(35.0)), "35.00 µg/m³");
    }
}
