//! Black-oil fluid property evaluation for surface-to-reservoir rate conversion.
//!
//! The crate defines the narrow seam a rate converter needs from a PVT package:
//! formation volume factors per phase and the saturated miscibility ratios.
//! It also ships a few small evaluators that are handy in tests and
//! simple studies.

mod error;
mod phase;

pub mod model;

pub use error::PropertyError;
pub use model::{BlackOilProperties, FluidCondition, VolumeFactor};
pub use phase::{Phase, PhaseMap, PhasePresence, PhaseUsage};
