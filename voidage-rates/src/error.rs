use thiserror::Error;
use voidage_pvt::{Phase, PropertyError};

/// Errors that can occur while defining a state or converting rates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("precondition violated: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("miscibility system is singular in region {region}: rs = {rs}, rv = {rv}")]
    SingularMiscibility { region: usize, rs: f64, rv: f64 },

    #[error("non-physical {phase} volume factor {value} in region {region}")]
    NonPhysicalVolumeFactor {
        region: usize,
        phase: Phase,
        value: f64,
    },
}

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The region definition or state snapshot is malformed.
    Configuration,
    /// The property evaluator could not produce a value.
    PropertyEvaluation,
    /// The converter was misused by its caller.
    Precondition,
}

impl Error {
    /// Returns the class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::InvalidConfig { .. } => ErrorKind::Configuration,
            Self::Property(_)
            | Self::SingularMiscibility { .. }
            | Self::NonPhysicalVolumeFactor { .. } => ErrorKind::PropertyEvaluation,
            Self::Precondition(_) => ErrorKind::Precondition,
        }
    }
}

/// A malformed region definition or state snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("region definition is empty")]
    EmptyRegionDefinition,

    #[error("cell {cell} is assigned to region {region}, but only {num_regions} regions exist")]
    RegionIndexOutOfRange {
        cell: usize,
        region: usize,
        num_regions: usize,
    },

    #[error("region {region} has no cells")]
    EmptyRegion { region: usize },

    #[error("`{field}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("pore volume {value} of cell {cell} is negative or non-finite")]
    InvalidPoreVolume { cell: usize, value: f64 },

    #[error("`{field}` is non-finite in cell {cell}")]
    NonFiniteValue { field: &'static str, cell: usize },

    #[error("region {region} has zero pore volume")]
    ZeroPoreVolume { region: usize },
}

/// A call made in a state or with arguments the converter does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("no state has been defined")]
    Unconfigured,

    #[error("region {region} is out of range for {num_regions} regions")]
    RegionOutOfRange { region: usize, num_regions: usize },

    #[error("`{argument}` has {actual} entries, expected one per phase ({expected})")]
    PhaseCountMismatch {
        argument: &'static str,
        expected: usize,
        actual: usize,
    },
}
