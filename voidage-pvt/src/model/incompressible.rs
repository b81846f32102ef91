use uom::si::{f64::Ratio, ratio::ratio};

use crate::{Phase, PhaseMap, PhaseUsage, PropertyError};

use super::{BlackOilProperties, FluidCondition, VolumeFactor};

/// A black-oil property model for incompressible, immiscible phases.
///
/// Every active phase has a constant formation volume factor, and neither
/// oil nor gas carries the other component.
/// With unit factors, reservoir and surface volumes coincide.
#[derive(Debug, Clone, PartialEq)]
pub struct Incompressible {
    usage: PhaseUsage,
    factors: PhaseMap<Ratio>,
}

impl Incompressible {
    /// Creates a model with a unit formation volume factor for every active phase.
    #[must_use]
    pub fn new(usage: PhaseUsage) -> Self {
        Self {
            usage,
            factors: PhaseMap::splat(Ratio::new::<ratio>(1.0)),
        }
    }

    /// Returns a new model with the given constant factor for `phase`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidInput`] if `phase` is not active
    /// or `factor` is not finite and strictly positive.
    pub fn with_formation_volume_factor(
        mut self,
        phase: Phase,
        factor: Ratio,
    ) -> Result<Self, PropertyError> {
        if !self.usage.is_active(phase) {
            return Err(PropertyError::InvalidInput(format!(
                "the {phase} phase is not active"
            )));
        }
        let value = factor.get::<ratio>();
        if !value.is_finite() || value <= 0.0 {
            return Err(PropertyError::InvalidInput(format!(
                "formation volume factor of the {phase} phase must be positive, got {value}"
            )));
        }

        self.factors[phase] = factor;
        Ok(self)
    }
}

impl BlackOilProperties for Incompressible {
    fn phase_usage(&self) -> &PhaseUsage {
        &self.usage
    }

    /// Returns the constant factor, ignoring pressure and miscibility.
    fn evaluate(
        &self,
        phase: Phase,
        _condition: &FluidCondition,
    ) -> Result<VolumeFactor, PropertyError> {
        if !self.usage.is_active(phase) {
            return Err(PropertyError::NotImplemented {
                property: "formation volume factor",
                phase,
            });
        }
        Ok(VolumeFactor::constant(self.factors[phase]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::Pressure, pressure::bar};

    #[test]
    fn unit_factors_by_default() -> Result<(), PropertyError> {
        let model = Incompressible::new(PhaseUsage::water_oil());
        let condition = FluidCondition::at_pressure(Pressure::new::<bar>(250.0));

        for phase in [Phase::Water, Phase::Oil] {
            let factor = model.evaluate(phase, &condition)?;
            assert_relative_eq!(factor.value.get::<ratio>(), 1.0);
            assert_relative_eq!(factor.d_dp, 0.0);
        }

        Ok(())
    }

    #[test]
    fn inactive_phase_is_not_implemented() {
        let model = Incompressible::new(PhaseUsage::water_oil());
        let condition = FluidCondition::at_pressure(Pressure::new::<bar>(1.0));

        assert!(matches!(
            model.evaluate(Phase::Gas, &condition),
            Err(PropertyError::NotImplemented {
                phase: Phase::Gas,
                ..
            })
        ));
    }

    #[test]
    fn custom_factor_is_validated() {
        let model = Incompressible::new(PhaseUsage::water_oil());

        assert!(
            model
                .clone()
                .with_formation_volume_factor(Phase::Oil, Ratio::new::<ratio>(-1.0))
                .is_err()
        );
        assert!(
            model
                .clone()
                .with_formation_volume_factor(Phase::Gas, Ratio::new::<ratio>(1.0))
                .is_err()
        );

        let model = model
            .with_formation_volume_factor(Phase::Oil, Ratio::new::<ratio>(1.2))
            .unwrap();
        let condition = FluidCondition::at_pressure(Pressure::new::<bar>(1.0));
        assert_relative_eq!(
            model
                .formation_volume_factor(Phase::Oil, &condition)
                .unwrap()
                .get::<ratio>(),
            1.2
        );
    }
}
