use uom::{
    ConstZero,
    si::f64::{Pressure, Ratio},
};

use crate::{Phase, PhasePresence, PhaseUsage, PropertyError};

/// The condition at which a phase's properties are evaluated.
///
/// `dissolved_gas_ratio` (Rs) is only meaningful for oil and
/// `vaporized_oil_ratio` (Rv) only for gas; models ignore the ratio that does
/// not apply to the requested phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidCondition {
    pub pressure: Pressure,
    pub dissolved_gas_ratio: Ratio,
    pub vaporized_oil_ratio: Ratio,
    pub presence: PhasePresence,
}

impl FluidCondition {
    /// Creates an immiscible condition at `pressure` with every phase present.
    #[must_use]
    pub fn at_pressure(pressure: Pressure) -> Self {
        Self {
            pressure,
            dissolved_gas_ratio: Ratio::ZERO,
            vaporized_oil_ratio: Ratio::ZERO,
            presence: PhasePresence::splat(true),
        }
    }

    /// Returns a new condition with the given dissolved-gas ratio.
    #[must_use]
    pub fn with_dissolved_gas_ratio(self, rs: Ratio) -> Self {
        Self {
            dissolved_gas_ratio: rs,
            ..self
        }
    }

    /// Returns a new condition with the given vaporized-oil ratio.
    #[must_use]
    pub fn with_vaporized_oil_ratio(self, rv: Ratio) -> Self {
        Self {
            vaporized_oil_ratio: rv,
            ..self
        }
    }

    /// Returns a new condition with the given phase presence.
    #[must_use]
    pub fn with_presence(self, presence: PhasePresence) -> Self {
        Self { presence, ..self }
    }
}

/// A formation volume factor and its pressure derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeFactor {
    /// Reservoir volume per surface volume.
    pub value: Ratio,

    /// Derivative of the factor with respect to pressure, in 1/Pa.
    pub d_dp: f64,
}

impl VolumeFactor {
    /// A pressure-independent factor.
    #[must_use]
    pub fn constant(value: Ratio) -> Self {
        Self { value, d_dp: 0.0 }
    }
}

/// Trait for black-oil fluid property evaluators.
///
/// A rate converter treats implementors as opaque function evaluators: it
/// never mutates them and never re-implements their inversions or iterations.
/// Any retry or extrapolation policy belongs to the implementor.
pub trait BlackOilProperties {
    /// Returns the active phases.
    fn phase_usage(&self) -> &PhaseUsage;

    /// Evaluates the formation volume factor of `phase` at `condition`.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the factor cannot be evaluated,
    /// for example when the pressure lies outside a table's domain.
    fn evaluate(
        &self,
        phase: Phase,
        condition: &FluidCondition,
    ) -> Result<VolumeFactor, PropertyError>;

    /// Returns the dissolved-gas ratio of gas-saturated oil at `pressure`.
    ///
    /// Defaults to zero (dead oil).
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the ratio cannot be evaluated.
    fn saturated_dissolved_gas_ratio(&self, _pressure: Pressure) -> Result<Ratio, PropertyError> {
        Ok(Ratio::ZERO)
    }

    /// Returns the vaporized-oil ratio of oil-saturated gas at `pressure`.
    ///
    /// Defaults to zero (dry gas).
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the ratio cannot be evaluated.
    fn saturated_vaporized_oil_ratio(&self, _pressure: Pressure) -> Result<Ratio, PropertyError> {
        Ok(Ratio::ZERO)
    }

    /// Returns only the formation volume factor of `phase` at `condition`.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the factor cannot be evaluated.
    fn formation_volume_factor(
        &self,
        phase: Phase,
        condition: &FluidCondition,
    ) -> Result<Ratio, PropertyError> {
        self.evaluate(phase, condition).map(|factor| factor.value)
    }
}
