use uom::{
    ConstZero,
    si::{
        f64::{Pressure, Ratio},
        ratio::ratio,
    },
};

use crate::{Phase, PhaseMap, PhaseUsage, PropertyError};

use super::{BlackOilProperties, FluidCondition, VolumeFactor};

/// Constant-compressibility parameters of a single phase.
///
/// The formation volume factor follows
/// `B(p) = B₀ / (1 + X + X²/2)` with `X = c·(p − p₀)`,
/// the second-order expansion of `B₀·exp(−X)` used by black-oil decks.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseCompressibility {
    /// Pressure at which the reference factor applies.
    pub reference_pressure: Pressure,

    /// Formation volume factor at the reference pressure.
    pub reference_volume_factor: Ratio,

    /// Isothermal compressibility, in 1/Pa.
    pub compressibility: f64,
}

impl PhaseCompressibility {
    /// A pressure-independent phase with factor `b`.
    #[must_use]
    pub fn incompressible(b: Ratio) -> Self {
        Self {
            reference_pressure: Pressure::ZERO,
            reference_volume_factor: b,
            compressibility: 0.0,
        }
    }

    /// Evaluates the factor and its pressure derivative at `pressure`.
    #[must_use]
    pub fn volume_factor(&self, pressure: Pressure) -> VolumeFactor {
        let c = self.compressibility;
        let x = c * (pressure - self.reference_pressure).value;
        let denominator = 1.0 + x + 0.5 * x * x;

        let b_ref = self.reference_volume_factor.get::<ratio>();
        VolumeFactor {
            value: Ratio::new::<ratio>(b_ref / denominator),
            d_dp: -b_ref * c * (1.0 + x) / (denominator * denominator),
        }
    }

    fn validate(&self, phase: Phase) -> Result<(), PropertyError> {
        let b_ref = self.reference_volume_factor.get::<ratio>();
        if !b_ref.is_finite() || b_ref <= 0.0 {
            return Err(PropertyError::InvalidInput(format!(
                "reference volume factor of the {phase} phase must be positive, got {b_ref}"
            )));
        }
        if !self.compressibility.is_finite() || !self.reference_pressure.value.is_finite() {
            return Err(PropertyError::InvalidInput(format!(
                "compressibility parameters of the {phase} phase must be finite"
            )));
        }
        Ok(())
    }
}

/// A black-oil property model with constant-compressibility phases.
///
/// Miscibility is described by constant saturated ratios, which makes the
/// model a convenient closed-form stand-in for live oil and wet gas.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantCompressibility {
    usage: PhaseUsage,
    phases: PhaseMap<Option<PhaseCompressibility>>,
    saturated_rs: Ratio,
    saturated_rv: Ratio,
}

impl ConstantCompressibility {
    /// Creates a model from per-phase parameters.
    ///
    /// The phases given become the active phases of the model.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidInput`] if no phase is given, a phase
    /// is given twice, or any parameter is non-physical.
    pub fn new(
        phases: impl IntoIterator<Item = (Phase, PhaseCompressibility)>,
    ) -> Result<Self, PropertyError> {
        let mut params = PhaseMap::splat(None);
        let mut active = Vec::new();

        for (phase, param) in phases {
            param.validate(phase)?;
            params[phase] = Some(param);
            active.push(phase);
        }

        Ok(Self {
            usage: PhaseUsage::new(&active)?,
            phases: params,
            saturated_rs: Ratio::ZERO,
            saturated_rv: Ratio::ZERO,
        })
    }

    /// Returns a new model with constant saturated miscibility ratios.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidInput`] if a ratio is negative or
    /// non-finite, or if a nonzero ratio is given without both oil and gas active.
    pub fn with_saturated_ratios(self, rs: Ratio, rv: Ratio) -> Result<Self, PropertyError> {
        for (name, value) in [("dissolved gas", rs), ("vaporized oil", rv)] {
            let value = value.get::<ratio>();
            if !value.is_finite() || value < 0.0 {
                return Err(PropertyError::InvalidInput(format!(
                    "saturated {name} ratio must be non-negative, got {value}"
                )));
            }
            if value > 0.0 && !self.usage.has_hydrocarbon_pair() {
                return Err(PropertyError::InvalidInput(format!(
                    "a {name} ratio requires both oil and gas to be active"
                )));
            }
        }

        Ok(Self {
            saturated_rs: rs,
            saturated_rv: rv,
            ..self
        })
    }
}

impl BlackOilProperties for ConstantCompressibility {
    fn phase_usage(&self) -> &PhaseUsage {
        &self.usage
    }

    fn evaluate(
        &self,
        phase: Phase,
        condition: &FluidCondition,
    ) -> Result<VolumeFactor, PropertyError> {
        self.phases[phase]
            .map(|param| param.volume_factor(condition.pressure))
            .ok_or(PropertyError::NotImplemented {
                property: "formation volume factor",
                phase,
            })
    }

    fn saturated_dissolved_gas_ratio(&self, _pressure: Pressure) -> Result<Ratio, PropertyError> {
        Ok(self.saturated_rs)
    }

    fn saturated_vaporized_oil_ratio(&self, _pressure: Pressure) -> Result<Ratio, PropertyError> {
        Ok(self.saturated_rv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::pressure::{bar, pascal};

    fn oil() -> PhaseCompressibility {
        PhaseCompressibility {
            reference_pressure: Pressure::new::<bar>(200.0),
            reference_volume_factor: Ratio::new::<ratio>(1.2),
            compressibility: 1.0e-9,
        }
    }

    #[test]
    fn reference_factor_at_reference_pressure() {
        let factor = oil().volume_factor(Pressure::new::<bar>(200.0));

        assert_relative_eq!(factor.value.get::<ratio>(), 1.2);
        assert_relative_eq!(factor.d_dp, -1.2e-9);
    }

    #[test]
    fn factor_shrinks_with_pressure() {
        let param = oil();
        let low = param.volume_factor(Pressure::new::<bar>(150.0));
        let high = param.volume_factor(Pressure::new::<bar>(250.0));

        assert!(high.value < low.value);
        assert!(high.d_dp < 0.0);

        // Check the second-order expansion directly.
        let x = 1.0e-9 * Pressure::new::<bar>(50.0).get::<pascal>();
        assert_relative_eq!(
            high.value.get::<ratio>(),
            1.2 / (1.0 + x + 0.5 * x * x),
            epsilon = 1e-14
        );
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let param = oil();
        let p = Pressure::new::<bar>(260.0);
        let dp = Pressure::new::<pascal>(1.0);

        let forward = param.volume_factor(p + dp).value.get::<ratio>();
        let backward = param.volume_factor(p - dp).value.get::<ratio>();
        let fd = (forward - backward) / 2.0;

        assert_relative_eq!(param.volume_factor(p).d_dp, fd, max_relative = 1e-6);
    }

    #[test]
    fn saturated_ratios_require_oil_and_gas() {
        let water_oil = ConstantCompressibility::new([
            (Phase::Water, PhaseCompressibility::incompressible(Ratio::new::<ratio>(1.0))),
            (Phase::Oil, oil()),
        ])
        .unwrap();

        assert!(
            water_oil
                .with_saturated_ratios(Ratio::new::<ratio>(100.0), Ratio::ZERO)
                .is_err()
        );
    }

    #[test]
    fn missing_phase_is_not_implemented() {
        let model = ConstantCompressibility::new([(Phase::Oil, oil())]).unwrap();
        let condition = FluidCondition::at_pressure(Pressure::new::<bar>(100.0));

        assert!(model.evaluate(Phase::Oil, &condition).is_ok());
        assert!(matches!(
            model.evaluate(Phase::Water, &condition),
            Err(PropertyError::NotImplemented { .. })
        ));
    }

    #[test]
    fn rejects_non_physical_reference_factor() {
        let mut bad = oil();
        bad.reference_volume_factor = Ratio::new::<ratio>(0.0);

        assert!(ConstantCompressibility::new([(Phase::Oil, bad)]).is_err());
    }
}
