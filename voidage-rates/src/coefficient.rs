use uom::{
    ConstZero,
    si::{
        f64::{Pressure, Ratio},
        ratio::ratio,
    },
};
use voidage_pvt::{BlackOilProperties, FluidCondition, Phase, PhaseMap, PropertyError};

use crate::{Config, Error, PreconditionError, RegionAverage};

/// Dissolved-gas and vaporized-oil ratios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Miscibility {
    pub dissolved_gas_ratio: Ratio,
    pub vaporized_oil_ratio: Ratio,
}

impl Miscibility {
    /// No miscibility: dead oil and dry gas.
    pub const IMMISCIBLE: Self = Self {
        dissolved_gas_ratio: Ratio::ZERO,
        vaporized_oil_ratio: Ratio::ZERO,
    };
}

/// A region's averaged state and the saturated miscibility ratios at its pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionCondition {
    pub average: RegionAverage,
    pub saturated: Miscibility,
}

impl RegionCondition {
    /// Evaluates the saturated ratios at the region's average pressure.
    ///
    /// The ratios are only requested when oil and gas are both active.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the evaluator cannot produce a ratio.
    pub fn evaluate<P: BlackOilProperties>(
        props: &P,
        average: RegionAverage,
    ) -> Result<Self, PropertyError> {
        if !props.phase_usage().has_hydrocarbon_pair() {
            return Ok(Self {
                average,
                saturated: Miscibility::IMMISCIBLE,
            });
        }

        Ok(Self {
            average,
            saturated: Miscibility {
                dissolved_gas_ratio: props.saturated_dissolved_gas_ratio(average.pressure)?,
                vaporized_oil_ratio: props.saturated_vaporized_oil_ratio(average.pressure)?,
            },
        })
    }
}

/// Volume factors and miscibility of one region, ready to be eliminated.
///
/// Surface rates relate to reservoir rates through
///
/// ```text
/// q_w,s = q_w,r / B_w
/// q_o,s = q_o,r / B_o + Rv · q_g,r / B_g
/// q_g,s = q_g,r / B_g + Rs · q_o,r / B_o
/// ```
///
/// which is triangular once inactive phases are dropped, and is solved with
/// the determinant `D = 1 − Rs·Rv`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VoidageSystem {
    /// Formation volume factors; zero for inactive phases.
    b: PhaseMap<f64>,
    rs: f64,
    rv: f64,
    det: f64,
}

/// Computes surface-to-reservoir conversion coefficients for one region.
///
/// The solver borrows a property evaluator and only ever calls it as a
/// function; evaluator failures are returned unchanged.
pub struct VoidageCoefficientSolver<'a, P> {
    props: &'a P,
    config: &'a Config,
}

impl<'a, P: BlackOilProperties> VoidageCoefficientSolver<'a, P> {
    #[must_use]
    pub fn new(props: &'a P, config: &'a Config) -> Self {
        Self { props, config }
    }

    /// Writes the coefficients `c` such that the total reservoir voidage rate
    /// is `Σ c[p]·q_s[p]`.
    ///
    /// Both slices are ordered like the evaluator's active phases.
    /// `surface_rates` only matters through the rate caps on Rs and Rv.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a volume factor cannot be evaluated or is
    /// non-physical, or if the miscibility system is singular.
    pub fn coefficients(
        &self,
        region: usize,
        condition: &RegionCondition,
        surface_rates: &[f64],
        coeff: &mut [f64],
    ) -> Result<(), Error> {
        self.check_len("surface_rates", surface_rates)?;
        self.check_len("coeff", coeff)?;

        let miscibility = self.effective_miscibility(condition, Some(surface_rates));
        let system = self.system(region, condition, miscibility)?;
        let usage = self.props.phase_usage();

        coeff.fill(0.0);

        if let Some(iw) = usage.position(Phase::Water) {
            coeff[iw] = system.b.water;
        }

        let io = usage.position(Phase::Oil);
        let ig = usage.position(Phase::Gas);

        // q_o,r = B_o (q_o,s − Rv q_g,s) / D
        if let Some(io) = io {
            coeff[io] += system.b.oil / system.det;
            if let Some(ig) = ig {
                coeff[ig] -= system.rv * system.b.oil / system.det;
            }
        }

        // q_g,r = B_g (q_g,s − Rs q_o,s) / D
        if let Some(ig) = ig {
            coeff[ig] += system.b.gas / system.det;
            if let Some(io) = io {
                coeff[io] -= system.rs * system.b.gas / system.det;
            }
        }

        Ok(())
    }

    /// Writes the reservoir rate of each phase for the given surface rates.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] under the same conditions as [`Self::coefficients`].
    pub fn reservoir_rates(
        &self,
        region: usize,
        condition: &RegionCondition,
        surface_rates: &[f64],
        reservoir_rates: &mut [f64],
    ) -> Result<(), Error> {
        self.check_len("surface_rates", surface_rates)?;
        self.check_len("reservoir_rates", reservoir_rates)?;

        let miscibility = self.effective_miscibility(condition, Some(surface_rates));
        let system = self.system(region, condition, miscibility)?;
        let usage = self.props.phase_usage();

        let rate = |phase: Phase| usage.position(phase).map_or(0.0, |i| surface_rates[i]);
        let (q_w, q_o, q_g) = (rate(Phase::Water), rate(Phase::Oil), rate(Phase::Gas));

        reservoir_rates.fill(0.0);

        if let Some(iw) = usage.position(Phase::Water) {
            reservoir_rates[iw] = system.b.water * q_w;
        }
        if let Some(io) = usage.position(Phase::Oil) {
            reservoir_rates[io] = system.b.oil * (q_o - system.rv * q_g) / system.det;
        }
        if let Some(ig) = usage.position(Phase::Gas) {
            reservoir_rates[ig] = system.b.gas * (q_g - system.rs * q_o) / system.det;
        }

        Ok(())
    }

    /// Writes coefficients for injected fluids.
    ///
    /// An injected phase is a single component, so every coefficient is the
    /// phase's own formation volume factor at the region pressure without
    /// miscibility.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a volume factor cannot be evaluated or is non-physical.
    pub fn injection_coefficients(
        &self,
        region: usize,
        condition: &RegionCondition,
        coeff: &mut [f64],
    ) -> Result<(), Error> {
        self.check_len("coeff", coeff)?;

        let system = self.system(region, condition, Miscibility::IMMISCIBLE)?;

        for (c, &phase) in coeff.iter_mut().zip(self.props.phase_usage().phases()) {
            *c = system.b[phase];
        }

        Ok(())
    }

    /// Rejects a per-phase slice of the wrong length.
    fn check_len(&self, argument: &'static str, values: &[f64]) -> Result<(), PreconditionError> {
        let expected = self.props.phase_usage().num_phases();
        if values.len() == expected {
            Ok(())
        } else {
            Err(PreconditionError::PhaseCountMismatch {
                argument,
                expected,
                actual: values.len(),
            })
        }
    }

    /// Returns the Rs and Rv used for a conversion in this region.
    ///
    /// Rs is zero unless oil and gas are active and oil is present; it is
    /// otherwise the region average capped by the saturated value.
    /// Rv follows symmetrically with gas presence.
    /// With rate-limited miscibility the ratios are further capped by the
    /// produced gas-oil and oil-gas ratios.
    #[must_use]
    pub fn effective_miscibility(
        &self,
        condition: &RegionCondition,
        surface_rates: Option<&[f64]>,
    ) -> Miscibility {
        let usage = self.props.phase_usage();
        let (Some(io), Some(ig)) = (usage.position(Phase::Oil), usage.position(Phase::Gas)) else {
            return Miscibility::IMMISCIBLE;
        };

        let average = &condition.average;
        let saturated = &condition.saturated;

        let mut rs = if average.presence.oil {
            average
                .dissolved_gas_ratio
                .get::<ratio>()
                .min(saturated.dissolved_gas_ratio.get::<ratio>())
        } else {
            0.0
        };
        let mut rv = if average.presence.gas {
            average
                .vaporized_oil_ratio
                .get::<ratio>()
                .min(saturated.vaporized_oil_ratio.get::<ratio>())
        } else {
            0.0
        };

        if let Some(rates) = surface_rates
            .filter(|rates| self.config.rate_limited_miscibility && rates.len() == usage.num_phases())
        {
            let (q_o, q_g) = (rates[io].abs(), rates[ig].abs());
            if q_o > 0.0 && q_g / q_o < rs {
                log::debug!("capping rs {rs} by produced gas-oil ratio {}", q_g / q_o);
                rs = q_g / q_o;
            }
            if q_g > 0.0 && q_o / q_g < rv {
                log::debug!("capping rv {rv} by produced oil-gas ratio {}", q_o / q_g);
                rv = q_o / q_g;
            }
        }

        Miscibility {
            dissolved_gas_ratio: Ratio::new::<ratio>(rs.max(0.0)),
            vaporized_oil_ratio: Ratio::new::<ratio>(rv.max(0.0)),
        }
    }

    fn system(
        &self,
        region: usize,
        condition: &RegionCondition,
        miscibility: Miscibility,
    ) -> Result<VoidageSystem, Error> {
        let rs = miscibility.dissolved_gas_ratio.get::<ratio>();
        let rv = miscibility.vaporized_oil_ratio.get::<ratio>();

        let det = 1.0 - rs * rv;
        if !det.is_finite() || det <= 0.0 {
            return Err(Error::SingularMiscibility { region, rs, rv });
        }

        let fluid = fluid_condition(condition.average.pressure, miscibility)
            .with_presence(condition.average.presence);

        let mut b = PhaseMap::splat(0.0);
        for &phase in self.props.phase_usage().phases() {
            let value = self
                .props
                .formation_volume_factor(phase, &fluid)?
                .get::<ratio>();
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::NonPhysicalVolumeFactor {
                    region,
                    phase,
                    value,
                });
            }
            b[phase] = value;
        }

        Ok(VoidageSystem { b, rs, rv, det })
    }
}

fn fluid_condition(pressure: Pressure, miscibility: Miscibility) -> FluidCondition {
    FluidCondition::at_pressure(pressure)
        .with_dissolved_gas_ratio(miscibility.dissolved_gas_ratio)
        .with_vaporized_oil_ratio(miscibility.vaporized_oil_ratio)
}
