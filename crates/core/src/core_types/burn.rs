//! Burn requests and requested time windows

use super::fuel::CropType;
use super::geo::GeoPoint;
use super::units::{Acres, Hours};
use crate::error::DomainError;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Burn request identifier, assigned by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BurnId(pub u64);

impl fmt::Display for BurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "burn#{}", self.0)
    }
}

/// Workflow status of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnStatus {
    /// Submitted, awaiting review
    Pending,
    /// Approved by the coordinator, not yet placed in a schedule
    Approved,
    /// Placed in a committed schedule
    Scheduled,
}

/// Half-open time-of-day interval `[start, end)` on the request date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start
    pub start: NaiveTime,
    /// Exclusive end
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Create a window, rejecting empty or inverted intervals.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, DomainError> {
        let window = TimeWindow { start, end };
        window.validate()?;
        Ok(window)
    }

    /// Window from whole hours, e.g. `TimeWindow::hours(9, 12)` for 09:00-12:00.
    pub fn hours(start_hour: u32, end_hour: u32) -> Result<Self, DomainError> {
        let time = |h: u32| {
            NaiveTime::from_hms_opt(h, 0, 0).ok_or_else(|| {
                DomainError::invalid("time_window", format!("hour {h} is not a valid time of day"))
            })
        };
        TimeWindow::new(time(start_hour)?, time(end_hour)?)
    }

    /// Check `start < end`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.start >= self.end {
            return Err(DomainError::invalid(
                "time_window",
                format!("window start {} must be before end {}", self.start, self.end),
            ));
        }
        Ok(())
    }

    /// Length of the window
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when the two half-open windows share any instant
    #[must_use]
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Shared part of two windows, if any
    #[must_use]
    pub fn intersection(&self, other: &TimeWindow) -> Option<TimeWindow> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeWindow {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// True when `t` falls inside the window
    #[must_use]
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// A grower's request to burn one field on one date.
///
/// Immutable for the duration of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRequest {
    /// Request identifier
    pub id: BurnId,
    /// Field location
    pub location: GeoPoint,
    /// Burned area
    pub acreage: Acres,
    /// Residue fuel type
    pub crop: CropType,
    /// Requested burn date
    pub requested_date: NaiveDate,
    /// Requested time of day
    pub requested_window: TimeWindow,
    /// Upstream priority score, 0-100 (higher burns first)
    pub priority_score: f64,
    /// Workflow status
    pub status: BurnStatus,
    /// Expected burn duration; defaults to the requested window length
    #[serde(default)]
    pub estimated_duration: Option<Hours>,
}

impl BurnRequest {
    /// Create a pending request with priority 50 and no duration estimate.
    #[must_use]
    pub fn new(
        id: u64,
        location: GeoPoint,
        acreage: Acres,
        crop: CropType,
        requested_date: NaiveDate,
        requested_window: TimeWindow,
    ) -> Self {
        BurnRequest {
            id: BurnId(id),
            location,
            acreage,
            crop,
            requested_date,
            requested_window,
            priority_score: 50.0,
            status: BurnStatus::Pending,
            estimated_duration: None,
        }
    }

    /// Set the priority score
    pub fn with_priority(mut self, score: f64) -> Self {
        self.priority_score = score;
        self
    }

    /// Set the expected burn duration
    pub fn with_duration(mut self, duration: Hours) -> Self {
        self.estimated_duration = Some(duration);
        self
    }

    /// Set the workflow status
    pub fn with_status(mut self, status: BurnStatus) -> Self {
        self.status = status;
        self
    }

    /// Hours the burn is expected to emit smoke for
    #[must_use]
    pub fn burn_duration(&self) -> Hours {
        self.estimated_duration
            .unwrap_or_else(|| Hours::from_duration(self.requested_window.duration()))
    }

    /// Validate physical parameters. Never defaults silently.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.location.validate()?;
        if !self.acreage.is_finite() || *self.acreage <= 0.0 {
            return Err(DomainError::invalid(
                "acreage",
                format!("acreage must be positive, got {}", self.acreage),
            ));
        }
        if !self.priority_score.is_finite() || !(0.0..=100.0).contains(&self.priority_score) {
            return Err(DomainError::invalid(
                "priority_score",
                format!("priority score must be within 0-100, got {}", self.priority_score),
            ));
        }
        self.requested_window.validate()?;
        if let Some(d) = self.estimated_duration {
            if !d.is_finite() || *d <= 0.0 {
                return Err(DomainError::invalid(
                    "estimated_duration",
                    format!("burn duration must be positive, got {d}"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BurnRequest {
        BurnRequest::new(
            7,
            GeoPoint::new(38.5, -121.7),
            Acres::new(100.0),
            CropType::Wheat,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            TimeWindow::hours(9, 13).unwrap(),
        )
    }

    #[test]
    fn test_window_overlap_half_open() {
        let morning = TimeWindow::hours(8, 11).unwrap();
        let late_morning = TimeWindow::hours(11, 13).unwrap();
        let mid = TimeWindow::hours(10, 12).unwrap();
        assert!(!morning.overlaps(&late_morning), "touching windows do not overlap");
        assert!(morning.overlaps(&mid));
        assert_eq!(
            morning.intersection(&mid),
            Some(TimeWindow::hours(10, 11).unwrap())
        );
        assert_eq!(morning.intersection(&late_morning), None);
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(TimeWindow::hours(12, 9).is_err());
        assert!(TimeWindow::hours(9, 9).is_err());
        assert!(TimeWindow::hours(9, 25).is_err());
    }

    #[test]
    fn test_duration_defaults_to_window() {
        let burn = request();
        assert_eq!(burn.burn_duration(), Hours::new(4.0));
        let burn = burn.with_duration(Hours::new(2.5));
        assert_eq!(burn.burn_duration(), Hours::new(2.5));
    }

    #[test]
    fn test_validation_rejects_bad_inputs() {
        assert!(request().validate().is_ok());

        let mut negative = request();
        negative.acreage = Acres::new(-5.0);
        assert!(matches!(
            negative.validate(),
            Err(DomainError::InvalidInput { field: "acreage", .. })
        ));

        let over = request().with_priority(140.0);
        assert!(over.validate().is_err());

        let zero_duration = request().with_duration(Hours::new(0.0));
        assert!(zero_duration.validate().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(request().id.to_string(), "burn#7");
        assert_eq!(TimeWindow::hours(9, 13).unwrap().to_string(), "09:00-13:00");
    }
}
