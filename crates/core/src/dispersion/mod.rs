//! Gaussian plume smoke dispersion
//!
//! Steady-state, ground-reflected Gaussian plume model for PM2.5 from
//! agricultural field burns. One prediction is computed per burn and reused
//! by every conflict evaluation of a scheduling run.
//!
//! - [`coefficients`]: Pasquill–Gifford σy/σz power laws per stability class
//! - [`plume`]: emission rate and concentration kernels
//! - [`model`]: the [`DispersionModel`] service (calm-wind policy, radius
//!   search, affected-area ellipse, sample grid)

pub mod coefficients;
pub mod model;
pub mod plume;
pub mod prediction;

pub use coefficients::{SigmaCoefficients, SigmaTable};
pub use model::{DispersionModel, PointConcentration};
pub use plume::{emission_rate, PlumeSource};
pub use prediction::{ConcentrationGrid, DispersionPrediction, PlumeEllipse};
