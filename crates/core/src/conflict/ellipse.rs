//! Plume ellipses in a shared local plane
//!
//! Pairwise overlap is measured by projecting both footprints onto an
//! east/north plane centered on the midpoint of the two farms and sampling
//! the intersection of their bounding boxes. Every step is symmetric in the
//! two ellipses, so `overlap(a, b)` and `overlap(b, a)` are bit-identical.

use crate::core_types::geo::bearing_unit_vector;
use crate::core_types::GeoPoint;
use crate::dispersion::PlumeEllipse;
use nalgebra::{Point2, Rotation2, Vector2};
use std::f64::consts::FRAC_PI_2;

/// An ellipse projected into a local east/north frame (meters)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalEllipse {
    center: Point2<f64>,
    /// Rotates offsets from the center into the ellipse frame (major axis = x)
    to_frame: Rotation2<f64>,
    semi_major: f64,
    semi_minor: f64,
    /// Half extents of the axis-aligned bounding box
    half_extent: Vector2<f64>,
}

impl LocalEllipse {
    /// Project a plume ellipse around `origin`
    #[must_use]
    pub fn project(plume: &PlumeEllipse, origin: &GeoPoint) -> Self {
        let offset = plume.center.local_offset(origin);
        let axis = bearing_unit_vector(plume.bearing);
        let (a, b) = (*plume.semi_major, *plume.semi_minor);

        // compass bearing θ points along (sin θ, cos θ); its math angle is π/2 - θ
        let angle = FRAC_PI_2 - plume.bearing.to_radians();
        let half_extent = Vector2::new(
            (a * a * axis.x * axis.x + b * b * axis.y * axis.y).sqrt(),
            (a * a * axis.y * axis.y + b * b * axis.x * axis.x).sqrt(),
        );

        LocalEllipse {
            center: Point2::new(offset.x, offset.y),
            to_frame: Rotation2::new(-angle),
            semi_major: a,
            semi_minor: b,
            half_extent,
        }
    }

    /// True when the ellipse has no area
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.semi_major <= 0.0 || self.semi_minor <= 0.0
    }

    /// Area in square meters
    #[must_use]
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.semi_major * self.semi_minor
    }

    /// True when `p` lies inside or on the ellipse
    #[must_use]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        if self.is_empty() {
            return false;
        }
        let local = self.to_frame * (*p - self.center);
        (local.x / self.semi_major).powi(2) + (local.y / self.semi_minor).powi(2) <= 1.0
    }

    /// Axis-aligned bounding box `(min, max)`
    #[must_use]
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        (self.center - self.half_extent, self.center + self.half_extent)
    }
}

/// Fraction of the smaller ellipse covered by the other, in `[0, 1]`.
///
/// Estimated on a `samples × samples` midpoint grid over the intersection
/// of the two bounding boxes. A lens narrower than one grid cell can fall
/// between sample points and report zero; the separation floor still
/// applies to such pairs.
#[must_use]
pub fn overlap_fraction(a: &PlumeEllipse, b: &PlumeEllipse, samples: usize) -> f64 {
    if a.is_empty() || b.is_empty() || samples == 0 {
        return 0.0;
    }
    let origin = a.center.coordinate_midpoint(&b.center);
    let ea = LocalEllipse::project(a, &origin);
    let eb = LocalEllipse::project(b, &origin);

    let (a_min, a_max) = ea.bounds();
    let (b_min, b_max) = eb.bounds();
    let lo = Point2::new(a_min.x.max(b_min.x), a_min.y.max(b_min.y));
    let hi = Point2::new(a_max.x.min(b_max.x), a_max.y.min(b_max.y));
    if lo.x >= hi.x || lo.y >= hi.y {
        return 0.0;
    }

    let step = Vector2::new((hi.x - lo.x) / samples as f64, (hi.y - lo.y) / samples as f64);
    let mut inside = 0usize;
    for i in 0..samples {
        let x = lo.x + (i as f64 + 0.5) * step.x;
        for j in 0..samples {
            let p = Point2::new(x, lo.y + (j as f64 + 0.5) * step.y);
            if ea.contains(&p) && eb.contains(&p) {
                inside += 1;
            }
        }
    }
    if inside == 0 {
        return 0.0;
    }

    let intersection = inside as f64 * step.x * step.y;
    (intersection / ea.area().min(eb.area())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Degrees, Meters};

    fn plume(center: GeoPoint, radius: f64, bearing: f64) -> PlumeEllipse {
        PlumeEllipse {
            center,
            semi_major: Meters::new(radius),
            semi_minor: Meters::new(radius * 0.4),
            bearing: Degrees::new(bearing),
        }
    }

    #[test]
    fn test_major_axis_follows_bearing() {
        let origin = GeoPoint::new(38.5, -121.7);
        let east = LocalEllipse::project(&plume(origin, 1_000.0, 90.0), &origin);
        assert!(east.contains(&Point2::new(950.0, 0.0)));
        assert!(!east.contains(&Point2::new(0.0, 950.0)));

        let north = LocalEllipse::project(&plume(origin, 1_000.0, 0.0), &origin);
        assert!(north.contains(&Point2::new(0.0, 950.0)));
        assert!(!north.contains(&Point2::new(950.0, 0.0)));
    }

    #[test]
    fn test_identical_ellipses_fully_overlap() {
        let p = plume(GeoPoint::new(38.5, -121.7), 5_000.0, 45.0);
        let overlap = overlap_fraction(&p, &p, 64);
        assert!(overlap > 0.95, "overlap was {overlap}");
    }

    #[test]
    fn test_distant_ellipses_do_not_overlap() {
        let a = plume(GeoPoint::new(38.5, -121.7), 2_000.0, 45.0);
        let b = plume(GeoPoint::new(38.8, -121.2), 2_000.0, 45.0);
        assert_eq!(overlap_fraction(&a, &b, 64), 0.0);
    }

    #[test]
    fn test_overlap_symmetric() {
        let a = plume(GeoPoint::new(38.5, -121.7), 8_000.0, 45.0);
        let b = plume(GeoPoint::new(38.52, -121.65), 3_000.0, 120.0);
        let ab = overlap_fraction(&a, &b, 48);
        let ba = overlap_fraction(&b, &a, 48);
        assert!(ab > 0.0);
        assert_eq!(ab.to_bits(), ba.to_bits());
    }

    #[test]
    fn test_thin_lens_between_tips_is_sampled() {
        // Two 20 km plumes on the equator whose tips overlap by 100 m
        let west = GeoPoint::new(0.0, 30.0);
        let east = west.destination(Degrees::new(90.0), Meters::new(39_900.0));
        let a = plume(west, 20_000.0, 90.0);
        let b = plume(east, 20_000.0, 270.0);
        let overlap = overlap_fraction(&a, &b, 64);
        assert!(overlap > 0.0);
        assert!(overlap < 0.01, "overlap was {overlap}");
    }

    #[test]
    fn test_overlap_unchanged_across_antimeridian() {
        let west = GeoPoint::new(-17.0, 179.995);
        let east = GeoPoint::new(-17.0, -179.996);
        let across = overlap_fraction(&plume(west, 6_000.0, 90.0), &plume(east, 6_000.0, 90.0), 64);

        let inland = GeoPoint::new(-17.0, 170.0);
        let shifted = inland.destination(Degrees::new(90.0), west.distance_to(&east));
        let same_side =
            overlap_fraction(&plume(inland, 6_000.0, 90.0), &plume(shifted, 6_000.0, 90.0), 64);

        assert!(across > 0.8, "overlap across 180° was {across}");
        assert!((across - same_side).abs() < 0.02, "{across} vs {same_side}");
    }

    #[test]
    fn test_empty_ellipse_has_no_overlap() {
        let a = plume(GeoPoint::new(38.5, -121.7), 0.0, 45.0);
        let b = plume(GeoPoint::new(38.5, -121.7), 3_000.0, 45.0);
        assert_eq!(overlap_fraction(&a, &b, 32), 0.0);
    }
}
