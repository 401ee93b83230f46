//! Pairwise smoke conflict detection
//!
//! Two burns conflict when their time windows overlap and either
//!
//! 1. their farms are closer than the minimum separation distance (a fixed,
//!    conservative severity regardless of plume output), or
//! 2. their affected-area ellipses intersect (severity bucketed from the
//!    overlap fraction).
//!
//! The spatial half of the test does not depend on time, so the optimizer
//! evaluates it once per pair and reuses it for every candidate schedule.

use crate::config::{ConflictConfig, Constraints};
use crate::conflict::ellipse::overlap_fraction;
use crate::core_types::{BurnId, BurnRequest, GeoPoint, Meters, TimeWindow};
use crate::dispersion::DispersionPrediction;
use crate::error::ConfigError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conflict severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Less than a quarter of the smaller footprint overlaps
    Low,
    /// A quarter to a half overlaps
    Medium,
    /// Half to three quarters overlaps, or farms inside the separation floor
    High,
    /// Footprints essentially coincide
    Critical,
}

impl Severity {
    /// Cost weight of one conflict at this severity
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Severity::Low => 1.0,
            Severity::Medium => 2.0,
            Severity::High => 3.0,
            Severity::Critical => 4.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Which test flagged the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Farms closer than the minimum separation distance
    SeparationFloor,
    /// Affected-area ellipses intersect
    PlumeOverlap,
}

/// Time-independent part of a pairwise conflict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialConflict {
    /// Great-circle distance between the two farms
    pub distance: Meters,
    /// Fraction of the smaller footprint covered by the other
    pub overlap: f64,
    /// Severity bucket
    pub severity: Severity,
    /// Which test fired
    pub kind: ConflictKind,
}

/// A live conflict between two burns
///
/// Burn identifiers are stored in ascending order, so the record for
/// `(a, b)` equals the record for `(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Lower identifier of the pair
    pub first: BurnId,
    /// Higher identifier of the pair
    pub second: BurnId,
    /// Great-circle distance between the two farms
    pub distance: Meters,
    /// Spatial overlap fraction, 0-1
    pub overlap: f64,
    /// Severity bucket
    pub severity: Severity,
    /// Which test fired
    pub kind: ConflictKind,
    /// Interval during which both burns are active
    pub window: TimeWindow,
}

impl ConflictRecord {
    /// True when the record concerns `id`
    #[must_use]
    pub fn involves(&self, id: BurnId) -> bool {
        self.first == id || self.second == id
    }
}

/// A burn, its prediction and the window it would burn in
#[derive(Debug, Clone, Copy)]
pub struct BurnFootprint<'a> {
    /// The request
    pub burn: &'a BurnRequest,
    /// Its dispersion prediction
    pub prediction: &'a DispersionPrediction,
    /// Requested window or assigned slot
    pub window: TimeWindow,
}

impl<'a> BurnFootprint<'a> {
    /// Footprint over the burn's requested window
    #[must_use]
    pub fn requested(burn: &'a BurnRequest, prediction: &'a DispersionPrediction) -> Self {
        BurnFootprint {
            burn,
            prediction,
            window: burn.requested_window,
        }
    }

    /// Same burn placed in another window
    #[must_use]
    pub fn in_window(self, window: TimeWindow) -> Self {
        BurnFootprint { window, ..self }
    }
}

/// Stateless conflict detector
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    config: ConflictConfig,
}

impl ConflictDetector {
    /// Build a detector from a validated configuration
    pub fn new(config: ConflictConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ConflictConfig {
        &self.config
    }

    /// Spatial test alone, ignoring time.
    pub fn assess_spatial(
        &self,
        a: (&BurnRequest, &DispersionPrediction),
        b: (&BurnRequest, &DispersionPrediction),
        min_separation: Meters,
    ) -> Option<SpatialConflict> {
        let distance = a.0.location.distance_to(&b.0.location);
        let overlap = overlap_fraction(&a.1.ellipse, &b.1.ellipse, self.config.overlap_samples);

        if distance < min_separation {
            return Some(SpatialConflict {
                distance,
                overlap,
                severity: self.config.separation_floor_severity,
                kind: ConflictKind::SeparationFloor,
            });
        }
        if overlap > 0.0 {
            return Some(SpatialConflict {
                distance,
                overlap,
                severity: self.config.severity_thresholds.classify(overlap),
                kind: ConflictKind::PlumeOverlap,
            });
        }
        None
    }

    /// Decide whether two burns conflict in the windows given.
    ///
    /// Burns on different dates, or whose windows do not overlap, never
    /// conflict.
    pub fn detect_conflict(
        &self,
        a: &BurnFootprint<'_>,
        b: &BurnFootprint<'_>,
        constraints: &Constraints,
    ) -> Option<ConflictRecord> {
        if a.burn.requested_date != b.burn.requested_date {
            return None;
        }
        let window = a.window.intersection(&b.window)?;
        let spatial = self.assess_spatial(
            (a.burn, a.prediction),
            (b.burn, b.prediction),
            constraints.min_separation_distance,
        )?;
        Some(Self::record(a.burn.id, b.burn.id, &spatial, window))
    }

    /// Every conflict among a set of footprints, ordered by burn pair.
    pub fn detect_all(
        &self,
        footprints: &[BurnFootprint<'_>],
        constraints: &Constraints,
    ) -> Vec<ConflictRecord> {
        let n = footprints.len();
        let mut records: Vec<ConflictRecord> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..n).filter_map(move |j| {
                    self.detect_conflict(&footprints[i], &footprints[j], constraints)
                })
            })
            .collect();
        records.sort_by_key(|r| (r.first, r.second));
        records
    }

    /// Burns within `radius` of `center`, nearest first.
    ///
    /// Ties in distance are broken by burn identifier.
    pub fn burns_within_radius<'b>(
        &self,
        center: &GeoPoint,
        radius: Meters,
        burns: &'b [BurnRequest],
    ) -> Vec<(&'b BurnRequest, Meters)> {
        let mut nearby: Vec<_> = burns
            .iter()
            .map(|burn| (burn, center.distance_to(&burn.location)))
            .filter(|(_, d)| *d <= radius)
            .collect();
        nearby.sort_by(|(a, da), (b, db)| da.cmp(db).then(a.id.cmp(&b.id)));
        nearby
    }

    pub(crate) fn record(
        a: BurnId,
        b: BurnId,
        spatial: &SpatialConflict,
        window: TimeWindow,
    ) -> ConflictRecord {
        ConflictRecord {
            first: a.min(b),
            second: a.max(b),
            distance: spatial.distance,
            overlap: spatial.overlap,
            severity: spatial.severity,
            kind: spatial.kind,
            window,
        }
    }
}
