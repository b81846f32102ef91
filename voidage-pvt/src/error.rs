use thiserror::Error;

use crate::Phase;

/// Errors that may occur when evaluating black-oil fluid properties.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    /// The property is not supported by this model.
    ///
    /// Indicates that the model does not implement the property for the phase
    /// at all, regardless of the state.
    #[error("property `{property}` is not implemented for the {phase} phase")]
    NotImplemented {
        property: &'static str,
        phase: Phase,
    },

    /// The property is undefined at the given condition.
    ///
    /// For example, the formation volume factor of a phase the model does not carry.
    #[error("property `{property}` is undefined at the given condition")]
    Undefined {
        property: &'static str,
        context: Option<String>,
    },

    /// The pressure lies outside the domain on which the property is tabulated.
    #[error("property `{property}` cannot be evaluated at {pressure} Pa: {context}")]
    OutOfRange {
        property: &'static str,
        pressure: f64,
        context: String,
    },

    /// The input values are invalid or inconsistent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The calculation failed due to a numerical or internal error.
    #[error("calculation error: {0}")]
    Calculation(String),
}
