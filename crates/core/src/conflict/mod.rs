//! Spatial-temporal smoke conflict detection
//!
//! - [`ellipse`]: affected-area ellipses projected into a local plane, overlap
//!   estimation
//! - [`detector`]: the [`ConflictDetector`] (separation floor, plume overlap,
//!   window overlap, severity buckets, proximity search)
//! - [`matrix`]: per-run cache of the time-independent spatial test

pub mod detector;
pub mod ellipse;
pub mod matrix;

pub use detector::{
    BurnFootprint, ConflictDetector, ConflictKind, ConflictRecord, Severity, SpatialConflict,
};
pub use ellipse::{overlap_fraction, LocalEllipse};
pub use matrix::ConflictMatrix;
