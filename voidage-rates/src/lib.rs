//! Conversion of surface rates to reservoir voidage rates.
//!
//! A [`SurfaceToReservoirVoidage`] converter averages a simulation state per
//! region and, for any set of per-phase surface rates, produces the
//! coefficients that turn them into an in-situ voidage rate. Fluid
//! properties come from any [`voidage_pvt::BlackOilProperties`] evaluator.

mod average;
mod coefficient;
mod config;
mod converter;
mod error;
mod region;
mod state;

pub use average::{RegionAverage, average};
pub use coefficient::{Miscibility, RegionCondition, VoidageCoefficientSolver};
pub use config::{Config, Weighting};
pub use converter::SurfaceToReservoirVoidage;
pub use error::{ConfigurationError, Error, ErrorKind, PreconditionError};
pub use region::RegionMapping;
pub use state::{BlackOilState, ReservoirState};
