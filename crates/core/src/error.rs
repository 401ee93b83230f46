//! Error types
//!
//! Input problems with a single burn or weather snapshot surface as
//! [`DomainError`]. A scheduling run reports every offending burn at once
//! through [`ScheduleError::InvalidBurns`] so the caller can fix them in one
//! pass. Capacity overflow and hard-constraint rejections are not errors:
//! they are recorded in the returned schedule.

use crate::core_types::BurnId;
use chrono::NaiveDate;
use thiserror::Error;

/// Result of dispersion and conflict operations
pub type Result<T, E = DomainError> = std::result::Result<T, E>;

/// Errors raised by the dispersion model and conflict detector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Missing or out-of-range physical parameter
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput {
        /// Offending field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// A computation left the numeric domain of the plume model
    #[error("numeric domain error: {reason}")]
    NumericDomain {
        /// Description of the failed computation
        reason: String,
    },
}

impl DomainError {
    /// Create an invalid-input error
    pub fn invalid<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Create a numeric-domain error
    pub fn numeric<S: Into<String>>(reason: S) -> Self {
        Self::NumericDomain {
            reason: reason.into(),
        }
    }
}

/// One burn that failed validation or prediction
#[derive(Debug, Clone, PartialEq)]
pub struct BurnIssue {
    /// The offending request
    pub burn_id: BurnId,
    /// Why it was rejected
    pub error: DomainError,
}

/// Errors that abort a scheduling run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Constraints or annealing options are unusable
    #[error("invalid scheduling constraints: {0}")]
    InvalidConstraints(String),

    /// One or more burns could not be modeled; none are silently excluded
    #[error("{} burn request(s) failed validation: {}", .0.len(), describe_issues(.0))]
    InvalidBurns(Vec<BurnIssue>),

    /// Another run for the same date holds the date lease
    #[error("an optimization run for {0} is already in progress")]
    RunInProgress(NaiveDate),
}

impl ScheduleError {
    /// Identifiers of the burns named by an `InvalidBurns` error
    #[must_use]
    pub fn offending_burns(&self) -> Vec<BurnId> {
        match self {
            ScheduleError::InvalidBurns(issues) => issues.iter().map(|i| i.burn_id).collect(),
            _ => Vec::new(),
        }
    }
}

fn describe_issues(issues: &[BurnIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.burn_id, i.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors loading an engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// TOML could not be parsed into the config structs
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed values failed validation
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_burns_message_names_each_burn() {
        let err = ScheduleError::InvalidBurns(vec![
            BurnIssue {
                burn_id: BurnId(3),
                error: DomainError::invalid("acreage", "acreage must be positive, got -1.0 ac"),
            },
            BurnIssue {
                burn_id: BurnId(9),
                error: DomainError::invalid("weather.wind_speed", "calm wind"),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("2 burn request(s) failed validation"));
        assert!(msg.contains("burn#3: invalid input `acreage`"));
        assert!(msg.contains("burn#9"));
        assert_eq!(err.offending_burns(), vec![BurnId(3), BurnId(9)]);
    }

    #[test]
    fn test_domain_error_constructors() {
        assert!(matches!(
            DomainError::numeric("x <= 0"),
            DomainError::NumericDomain { .. }
        ));
        assert_eq!(
            DomainError::invalid("crop_type", "unknown").to_string(),
            "invalid input `crop_type`: unknown"
        );
    }
}
