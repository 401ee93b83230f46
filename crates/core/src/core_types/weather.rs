//! Weather snapshots and Pasquill–Gifford atmospheric stability
//!
//! A [`WeatherSnapshot`] is the read-only atmospheric state a plume is
//! evaluated against. One snapshot is normally shared by every burn on the
//! same date and region.
//!
//! # References
//!
//! - Pasquill, F. (1961). "The estimation of the dispersion of windborne
//!   material." Meteorological Magazine, 90, 33-49.
//! - Turner, D.B. (1970). "Workbook of Atmospheric Dispersion Estimates."
//!   U.S. EPA, Table 1 (key to stability categories).

use super::geo::{bearing_unit_vector, GeoPoint};
use super::units::{Celsius, Degrees, MetersPerSecond, Percent};
use crate::error::DomainError;
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Pasquill–Gifford atmospheric stability class
///
/// A is the most unstable (strong convective mixing, fastest plume spread),
/// F the most stable (suppressed mixing, narrow plumes that stay
/// concentrated far downwind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StabilityClass {
    /// Extremely unstable
    A,
    /// Moderately unstable
    B,
    /// Slightly unstable
    C,
    /// Neutral
    D,
    /// Slightly stable
    E,
    /// Moderately stable
    F,
}

/// Sky state used to key the Turner stability table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyCondition {
    /// Daytime, high sun, clear sky
    StrongInsolation,
    /// Daytime, moderate sun
    ModerateInsolation,
    /// Daytime, low sun or broken cloud
    SlightInsolation,
    /// Day or night, thick overcast
    Overcast,
    /// Night, ≥ 4/8 low cloud
    NightCloudy,
    /// Night, ≤ 3/8 cloud
    NightClear,
}

impl StabilityClass {
    /// All six classes, most unstable first
    pub const ALL: [StabilityClass; 6] = [
        StabilityClass::A,
        StabilityClass::B,
        StabilityClass::C,
        StabilityClass::D,
        StabilityClass::E,
        StabilityClass::F,
    ];

    /// Position in [`StabilityClass::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse a single class letter (case-insensitive).
    pub fn from_char(c: char) -> Result<Self, DomainError> {
        match c.to_ascii_uppercase() {
            'A' => Ok(StabilityClass::A),
            'B' => Ok(StabilityClass::B),
            'C' => Ok(StabilityClass::C),
            'D' => Ok(StabilityClass::D),
            'E' => Ok(StabilityClass::E),
            'F' => Ok(StabilityClass::F),
            other => Err(DomainError::invalid(
                "stability_class",
                format!("stability class must be one of A-F, got '{other}'"),
            )),
        }
    }

    /// Class letter
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            StabilityClass::A => 'A',
            StabilityClass::B => 'B',
            StabilityClass::C => 'C',
            StabilityClass::D => 'D',
            StabilityClass::E => 'E',
            StabilityClass::F => 'F',
        }
    }

    /// Derive a class from 10 m wind speed and sky condition (Turner 1970).
    ///
    /// Turner's table lists intermediate categories ("A-B", "B-C", "C-D").
    /// Those resolve to the more stable neighbour, which predicts less
    /// dilution and therefore larger smoke footprints.
    #[must_use]
    pub fn classify(wind_speed: MetersPerSecond, sky: SkyCondition) -> Self {
        use StabilityClass::{A, B, C, D, E, F};

        let u = *wind_speed;
        // Wind bands: <2, 2-3, 3-5, 5-6, >=6 m/s
        let band = if u < 2.0 {
            0
        } else if u < 3.0 {
            1
        } else if u < 5.0 {
            2
        } else if u < 6.0 {
            3
        } else {
            4
        };

        match sky {
            SkyCondition::StrongInsolation => [A, B, B, C, C][band],
            SkyCondition::ModerateInsolation => [B, B, C, D, D][band],
            SkyCondition::SlightInsolation => [B, C, C, D, D][band],
            SkyCondition::Overcast => D,
            SkyCondition::NightCloudy => [E, E, D, D, D][band],
            SkyCondition::NightClear => [F, F, E, D, D][band],
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for StabilityClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => StabilityClass::from_char(c),
            _ => Err(DomainError::invalid(
                "stability_class",
                format!("stability class must be a single letter A-F, got '{s}'"),
            )),
        }
    }
}

/// Atmospheric state for a date and region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature
    pub temperature: Celsius,
    /// Relative humidity
    pub humidity: Percent,
    /// Mean wind speed at 10 m
    pub wind_speed: MetersPerSecond,
    /// Direction the wind blows FROM (meteorological convention)
    pub wind_direction: Degrees,
    /// Pasquill–Gifford stability class
    pub stability: StabilityClass,
    /// Observation or forecast valid time (local)
    pub timestamp: NaiveDateTime,
    /// Representative location
    pub location: GeoPoint,
}

// Diurnal cycle amplitudes
const DIURNAL_TEMPERATURE_AMPLITUDE_C: f64 = 8.0;
const DIURNAL_HUMIDITY_AMPLITUDE_PCT: f64 = 15.0;
const DIURNAL_WIND_AMPLITUDE_KMH: f64 = 5.0;
const TEMPERATURE_PEAK_HOUR: f64 = 14.0;
const WIND_PEAK_HOUR: f64 = 15.0;

impl WeatherSnapshot {
    /// Check every field is physically meaningful.
    ///
    /// Wind speed is only required to be finite and non-negative here; the
    /// calm-wind limit of the plume model is enforced by the dispersion
    /// model's configured policy.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.temperature.is_finite() || *self.temperature < -90.0 || *self.temperature > 60.0 {
            return Err(DomainError::invalid(
                "weather.temperature",
                format!("temperature out of range: {}", self.temperature),
            ));
        }
        if !self.humidity.is_finite() || !(0.0..=100.0).contains(&*self.humidity) {
            return Err(DomainError::invalid(
                "weather.humidity",
                format!("humidity must be within 0-100%, got {}", self.humidity),
            ));
        }
        if !self.wind_speed.is_finite() || *self.wind_speed < 0.0 {
            return Err(DomainError::invalid(
                "weather.wind_speed",
                format!("wind speed must be finite and non-negative, got {}", self.wind_speed),
            ));
        }
        if !self.wind_direction.is_finite() {
            return Err(DomainError::invalid(
                "weather.wind_direction",
                "wind direction must be finite",
            ));
        }
        self.location.validate()
    }

    /// Compass bearing the smoke travels toward
    #[must_use]
    pub fn downwind_bearing(&self) -> Degrees {
        self.wind_direction.normalized().reversed()
    }

    /// Transport vector (east, north) in m/s
    #[must_use]
    pub fn wind_vector(&self) -> Vector2<f64> {
        bearing_unit_vector(self.downwind_bearing()) * *self.wind_speed
    }

    /// Shift this snapshot through the diurnal cycle to another time of day.
    ///
    /// Temperature follows a cosine peaking at 14:00, humidity moves
    /// opposite to temperature, and wind speed peaks mid-afternoon. Only the
    /// difference between the two times is applied, so a snapshot asked for
    /// its own time of day is returned unchanged (apart from the timestamp).
    #[must_use]
    pub fn at_time_of_day(&self, time: NaiveTime) -> WeatherSnapshot {
        let from = hour_of_day(self.timestamp.time());
        let to = hour_of_day(time);

        let temp_phase = |h: f64| ((h - TEMPERATURE_PEAK_HOUR) * PI / 12.0).cos();
        let wind_phase = |h: f64| ((h - WIND_PEAK_HOUR) * PI / 12.0).cos();

        let d_temp = temp_phase(to) - temp_phase(from);
        let d_wind = wind_phase(to) - wind_phase(from);

        let temperature = Celsius::new(*self.temperature + DIURNAL_TEMPERATURE_AMPLITUDE_C * d_temp);
        let humidity = Percent::new(
            (*self.humidity - DIURNAL_HUMIDITY_AMPLITUDE_PCT * d_temp).clamp(5.0, 95.0),
        );
        let wind_speed = MetersPerSecond::from_kmh(
            (self.wind_speed.to_kmh() + DIURNAL_WIND_AMPLITUDE_KMH * d_wind).max(0.0),
        );

        WeatherSnapshot {
            temperature,
            humidity,
            wind_speed,
            wind_direction: self.wind_direction,
            stability: self.stability,
            timestamp: self.timestamp.date().and_time(time),
            location: self.location,
        }
    }
}

fn hour_of_day(t: NaiveTime) -> f64 {
    f64::from(t.num_seconds_from_midnight()) / 3600.0
}
