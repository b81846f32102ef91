use voidage_pvt::BlackOilProperties;

use crate::{
    Config, Error, PreconditionError, RegionAverage, RegionCondition, RegionMapping,
    ReservoirState, VoidageCoefficientSolver, average,
};

/// Converts surface rates to reservoir voidage rates using region-averaged
/// fluid states.
///
/// A converter starts out unconfigured. [`define_state`] averages a
/// simulation state per region and makes the converter ready; every query
/// then uses the table built by the most recent successful call.
///
/// The property evaluator is shared and never mutated. Queries take `&self`,
/// so they may run concurrently while no state is being defined.
///
/// # Example
///
/// ```
/// use uom::si::{f64::Volume, volume::cubic_meter};
/// use voidage_pvt::{BlackOilProperties, PhaseUsage, model::incompressible::Incompressible};
/// use voidage_rates::{BlackOilState, RegionMapping, SurfaceToReservoirVoidage};
///
/// let props = Incompressible::new(PhaseUsage::water_oil());
/// let regions = RegionMapping::single(1).unwrap();
/// let mut converter = SurfaceToReservoirVoidage::new(&props, regions);
///
/// let state = BlackOilState::new(props.phase_usage(), vec![Volume::new::<cubic_meter>(1.0)]);
/// converter.define_state(&state).unwrap();
///
/// let mut coeff = [0.0; 2];
/// converter.calc_coeff(&[1.0e3, 1.0e1], 0, &mut coeff).unwrap();
/// assert_eq!(coeff, [1.0, 1.0]);
/// ```
///
/// [`define_state`]: SurfaceToReservoirVoidage::define_state
pub struct SurfaceToReservoirVoidage<'a, P> {
    props: &'a P,
    regions: RegionMapping,
    config: Config,
    table: Table,
}

/// Cached per-region conditions.
#[derive(Debug, Clone)]
enum Table {
    Unconfigured,
    Ready(Vec<RegionCondition>),
}

impl<'a, P: BlackOilProperties> SurfaceToReservoirVoidage<'a, P> {
    /// Creates an unconfigured converter with the default [`Config`].
    #[must_use]
    pub fn new(props: &'a P, regions: RegionMapping) -> Self {
        Self {
            props,
            regions,
            config: Config::default(),
            table: Table::Unconfigured,
        }
    }

    /// Creates an unconfigured converter with the given [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the config does not validate.
    pub fn with_config(props: &'a P, regions: RegionMapping, config: Config) -> Result<Self, Error> {
        config
            .validate()
            .map_err(|reason| Error::InvalidConfig { reason })?;

        Ok(Self {
            config,
            ..Self::new(props, regions)
        })
    }

    /// Averages `state` per region and replaces the cached table.
    ///
    /// On error the converter keeps whatever table it had before the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the state does not match the region
    /// mapping or a region has zero pore volume, and [`Error::Property`] if
    /// the saturated miscibility ratios cannot be evaluated.
    pub fn define_state(&mut self, state: &impl ReservoirState) -> Result<(), Error> {
        let averages = average(state, &self.regions, self.props.phase_usage(), &self.config)?;

        let conditions = averages
            .into_iter()
            .map(|average| RegionCondition::evaluate(self.props, average))
            .collect::<Result<Vec<_>, _>>()?;

        for (region, condition) in conditions.iter().enumerate() {
            log::trace!(
                "region {region}: p = {:.6e} Pa, rs = {}, rv = {}, pv = {:.6e} m3",
                condition.average.pressure.value,
                condition.average.dissolved_gas_ratio.value,
                condition.average.vaporized_oil_ratio.value,
                condition.average.pore_volume.value,
            );
        }
        log::debug!(
            "defined voidage conversion state for {} regions",
            conditions.len()
        );

        self.table = Table::Ready(conditions);
        Ok(())
    }

    /// Writes the coefficients `c` such that the reservoir voidage rate of
    /// `surface_rates` in `region` is `Σ c[p]·q_s[p]`.
    ///
    /// `surface_rates` and `coeff` hold one entry per active phase.
    /// `coeff` is overwritten entirely on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if no state is defined, `region` is out
    /// of range, or a slice has the wrong length, and an evaluation error if a
    /// volume factor cannot be produced.
    pub fn calc_coeff(
        &self,
        surface_rates: &[f64],
        region: usize,
        coeff: &mut [f64],
    ) -> Result<(), Error> {
        let condition = self.condition(region)?;
        self.solver()
            .coefficients(region, condition, surface_rates, coeff)
    }

    /// Writes the reservoir voidage rate of each phase.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] under the same conditions as [`Self::calc_coeff`].
    pub fn calc_reservoir_voidage_rates(
        &self,
        surface_rates: &[f64],
        region: usize,
        reservoir_rates: &mut [f64],
    ) -> Result<(), Error> {
        let condition = self.condition(region)?;
        self.solver()
            .reservoir_rates(region, condition, surface_rates, reservoir_rates)
    }

    /// Writes coefficients for fluids injected into `region`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] under the same conditions as [`Self::calc_coeff`].
    pub fn calc_inj_coeff(&self, region: usize, coeff: &mut [f64]) -> Result<(), Error> {
        let condition = self.condition(region)?;
        self.solver().injection_coefficients(region, condition, coeff)
    }

    /// Returns the averaged state of `region`, if a state is defined and the region exists.
    #[must_use]
    pub fn region_average(&self, region: usize) -> Option<&RegionAverage> {
        match &self.table {
            Table::Ready(conditions) => conditions.get(region).map(|c| &c.average),
            Table::Unconfigured => None,
        }
    }

    #[must_use]
    pub fn num_regions(&self) -> usize {
        self.regions.num_regions()
    }

    /// Returns true once a state has been defined.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.table, Table::Ready(_))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn condition(&self, region: usize) -> Result<&RegionCondition, PreconditionError> {
        let Table::Ready(conditions) = &self.table else {
            return Err(PreconditionError::Unconfigured);
        };

        conditions
            .get(region)
            .ok_or(PreconditionError::RegionOutOfRange {
                region,
                num_regions: conditions.len(),
            })
    }

    fn solver(&self) -> VoidageCoefficientSolver<'_, P> {
        VoidageCoefficientSolver::new(self.props, &self.config)
    }
}
