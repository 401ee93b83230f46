//! Core types and utilities

pub mod burn;
pub mod fuel;
pub mod geo;
pub mod units;
pub mod weather;

pub use burn::{BurnId, BurnRequest, BurnStatus, TimeWindow};
pub use fuel::{CropType, ResidueProperties};
pub use geo::GeoPoint;
pub use units::*;
pub use weather::{SkyCondition, StabilityClass, WeatherSnapshot};
