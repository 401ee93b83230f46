//! Geographic positions and great-circle geometry
//!
//! Farm locations are WGS84 latitude/longitude pairs. Separation checks use
//! the haversine great-circle distance; plume ellipses are compared in a
//! local tangent plane (east/north meters) around a shared origin, which is
//! accurate to well under 0.1% over the tens of kilometers a smoke plume
//! covers.

use super::units::{Degrees, Meters};
use crate::error::DomainError;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Mean Earth radius (IUGG), meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A point on the Earth's surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, positive north
    pub lat: f64,
    /// Longitude in decimal degrees, positive east
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Check the coordinates are finite and inside WGS84 bounds.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(DomainError::invalid(
                "location.lat",
                format!("latitude must be within [-90, 90], got {}", self.lat),
            ));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(DomainError::invalid(
                "location.lon",
                format!("longitude must be within [-180, 180], got {}", self.lon),
            ));
        }
        Ok(())
    }

    /// Great-circle distance using the haversine formula.
    ///
    /// Symmetric: `a.distance_to(b) == b.distance_to(a)` bit for bit.
    #[must_use]
    pub fn distance_to(&self, other: &GeoPoint) -> Meters {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        // abs() keeps the result bit-identical under argument swap
        let d_phi = (other.lat - self.lat).abs().to_radians();
        let d_lambda = (other.lon - self.lon).abs().to_radians();

        let h = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

        Meters::new(EARTH_RADIUS_M * c)
    }

    /// Initial compass bearing from this point toward `other`.
    #[must_use]
    pub fn bearing_to(&self, other: &GeoPoint) -> Degrees {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_lambda = (other.lon - self.lon).to_radians();

        let y = d_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
        Degrees::new(y.atan2(x).to_degrees()).normalized()
    }

    /// Point reached by travelling `distance` along `bearing`.
    #[must_use]
    pub fn destination(&self, bearing: Degrees, distance: Meters) -> GeoPoint {
        let delta = *distance / EARTH_RADIUS_M;
        let theta = bearing.to_radians();
        let phi1 = self.lat.to_radians();
        let lambda1 = self.lon.to_radians();

        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

        GeoPoint::new(phi2.to_degrees(), wrap_longitude(lambda2.to_degrees()))
    }

    /// Midpoint in coordinate space; used as a shared projection origin.
    ///
    /// Symmetric in its arguments so pairwise geometry does not depend on
    /// argument order. Pairs straddling the antimeridian meet on the short
    /// side, near ±180°.
    #[must_use]
    pub fn coordinate_midpoint(&self, other: &GeoPoint) -> GeoPoint {
        let mut lon = (self.lon + other.lon) / 2.0;
        if (self.lon - other.lon).abs() > 180.0 {
            lon = wrap_longitude(lon + 180.0);
        }
        GeoPoint::new((self.lat + other.lat) / 2.0, lon)
    }

    /// East/north offset in meters of this point from `origin`
    /// (equirectangular projection about the origin latitude).
    #[must_use]
    pub fn local_offset(&self, origin: &GeoPoint) -> Vector2<f64> {
        let cos_lat = origin.lat.to_radians().cos();
        let d_lon = wrap_longitude(self.lon - origin.lon);
        let east = d_lon.to_radians() * cos_lat * EARTH_RADIUS_M;
        let north = (self.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
        Vector2::new(east, north)
    }
}

/// Longitude (or longitude difference) folded into `[-180, 180)`.
#[inline]
#[must_use]
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Unit vector (east, north) pointing along a compass bearing.
#[must_use]
pub fn bearing_unit_vector(bearing: Degrees) -> Vector2<f64> {
    let theta = bearing.to_radians();
    Vector2::new(theta.sin(), theta.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_known_distance() {
        // Davis, CA to Sacramento, CA: ~21.8 km apart
        let davis = GeoPoint::new(38.5449, -121.7405);
        let sacramento = GeoPoint::new(38.5816, -121.4944);
        let d = davis.distance_to(&sacramento);
        assert!((*d - 21_700.0).abs() < 500.0, "distance was {d}");
    }

    #[test]
    fn test_haversine_symmetric_and_zero() {
        let a = GeoPoint::new(38.5, -121.7);
        let b = GeoPoint::new(38.55, -121.75);
        assert_eq!(a.distance_to(&b), b.distance_to(&a));
        assert_eq!(*a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_destination_roundtrip_distance() {
        let start = GeoPoint::new(38.5, -121.7);
        let end = start.destination(Degrees::new(45.0), Meters::new(1500.0));
        assert_relative_eq!(*start.distance_to(&end), 1500.0, max_relative = 1e-6);
        assert_relative_eq!(*start.bearing_to(&end), 45.0, epsilon = 0.01);
    }

    #[test]
    fn test_local_offset_matches_great_circle() {
        let origin = GeoPoint::new(38.5, -121.7);
        let p = origin.destination(Degrees::new(90.0), Meters::new(5000.0));
        let offset = p.local_offset(&origin);
        assert_relative_eq!(offset.x, 5000.0, max_relative = 1e-3);
        assert!(offset.y.abs() < 5.0);
    }

    #[test]
    fn test_offsets_across_antimeridian() {
        // Fiji: 1 km apart either side of 180°
        let west = GeoPoint::new(-17.0, 179.995);
        let east = GeoPoint::new(-17.0, -179.996);
        let origin = west.coordinate_midpoint(&east);
        assert_eq!(origin, east.coordinate_midpoint(&west));
        assert!(origin.lon.abs() > 179.99, "origin landed at {}", origin.lon);

        let gap = east.local_offset(&origin) - west.local_offset(&origin);
        assert_relative_eq!(gap.x, *west.distance_to(&east), max_relative = 1e-3);
        assert!(gap.y.abs() < 1e-6);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_relative_eq!(wrap_longitude(190.0), -170.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_longitude(-359.98), 0.02, epsilon = 1e-9);
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert_relative_eq!(wrap_longitude(-121.7), -121.7, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, -181.0).validate().is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
        assert!(GeoPoint::new(38.5, -121.7).validate().is_ok());
    }

    #[test]
    fn test_bearing_unit_vector() {
        let east = bearing_unit_vector(Degrees::new(90.0));
        assert_relative_eq!(east.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(east.y, 0.0, epsilon = 1e-12);
    }
}
