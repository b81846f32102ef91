mod traits;

pub mod compressible;
pub mod incompressible;
pub mod tabulated;

pub use traits::{BlackOilProperties, FluidCondition, VolumeFactor};
