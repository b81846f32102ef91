use uom::{
    ConstZero,
    si::f64::{Pressure, Ratio, Volume},
};
use voidage_pvt::{PhaseMap, PhaseUsage};

/// Read-only view of a simulator's per-cell state.
///
/// All slices are indexed by cell and are expected to have the same length.
/// The converter only borrows a state for the duration of a single call.
pub trait ReservoirState {
    fn pressure(&self) -> &[Pressure];

    /// Saturation of every phase; inactive phases hold zero.
    fn saturation(&self) -> &[PhaseMap<f64>];

    /// Dissolved-gas ratio (Rs) of the oil.
    fn dissolved_gas_ratio(&self) -> &[Ratio];

    /// Vaporized-oil ratio (Rv) of the gas.
    fn vaporized_oil_ratio(&self) -> &[Ratio];

    fn pore_volume(&self) -> &[Volume];
}

/// An owned black-oil state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackOilState {
    pub pressure: Vec<Pressure>,
    pub saturation: Vec<PhaseMap<f64>>,
    pub dissolved_gas_ratio: Vec<Ratio>,
    pub vaporized_oil_ratio: Vec<Ratio>,
    pub pore_volume: Vec<Volume>,
}

impl BlackOilState {
    /// Creates a state with one cell per pore volume entry.
    ///
    /// Pressures and miscibility ratios start at zero and every cell is
    /// fully saturated with the first active phase.
    #[must_use]
    pub fn new(usage: &PhaseUsage, pore_volume: Vec<Volume>) -> Self {
        let num_cells = pore_volume.len();

        let mut saturation = PhaseMap::splat(0.0);
        if let Some(&first) = usage.phases().first() {
            saturation[first] = 1.0;
        }

        Self {
            pressure: vec![Pressure::ZERO; num_cells],
            saturation: vec![saturation; num_cells],
            dissolved_gas_ratio: vec![Ratio::ZERO; num_cells],
            vaporized_oil_ratio: vec![Ratio::ZERO; num_cells],
            pore_volume,
        }
    }

    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.pore_volume.len()
    }

    /// Returns a new state with the same pressure in every cell.
    #[must_use]
    pub fn with_uniform_pressure(self, pressure: Pressure) -> Self {
        let num_cells = self.num_cells();
        Self {
            pressure: vec![pressure; num_cells],
            ..self
        }
    }

    /// Returns a new state with the same saturations in every cell.
    #[must_use]
    pub fn with_uniform_saturation(self, saturation: PhaseMap<f64>) -> Self {
        let num_cells = self.num_cells();
        Self {
            saturation: vec![saturation; num_cells],
            ..self
        }
    }

    /// Returns a new state with the same miscibility ratios in every cell.
    #[must_use]
    pub fn with_uniform_ratios(self, rs: Ratio, rv: Ratio) -> Self {
        let num_cells = self.num_cells();
        Self {
            dissolved_gas_ratio: vec![rs; num_cells],
            vaporized_oil_ratio: vec![rv; num_cells],
            ..self
        }
    }
}

impl ReservoirState for BlackOilState {
    fn pressure(&self) -> &[Pressure] {
        &self.pressure
    }

    fn saturation(&self) -> &[PhaseMap<f64>] {
        &self.saturation
    }

    fn dissolved_gas_ratio(&self) -> &[Ratio] {
        &self.dissolved_gas_ratio
    }

    fn vaporized_oil_ratio(&self) -> &[Ratio] {
        &self.vaporized_oil_ratio
    }

    fn pore_volume(&self) -> &[Volume] {
        &self.pore_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{pressure::bar, volume::cubic_meter};
    use voidage_pvt::Phase;

    #[test]
    fn new_state_is_filled_with_first_phase() {
        let usage = PhaseUsage::oil_gas();
        let state = BlackOilState::new(&usage, vec![Volume::new::<cubic_meter>(1.0); 3]);

        assert_eq!(state.num_cells(), 3);
        assert_eq!(state.pressure().len(), 3);
        for saturation in state.saturation() {
            assert_eq!(saturation[Phase::Oil], 1.0);
            assert_eq!(saturation[Phase::Gas], 0.0);
            assert_eq!(saturation[Phase::Water], 0.0);
        }
    }

    #[test]
    fn uniform_setters_keep_cell_count() {
        let usage = PhaseUsage::water_oil();
        let state = BlackOilState::new(&usage, vec![Volume::new::<cubic_meter>(2.0); 2])
            .with_uniform_pressure(Pressure::new::<bar>(100.0))
            .with_uniform_saturation(PhaseMap::new(0.3, 0.7, 0.0));

        assert_eq!(state.pressure, vec![Pressure::new::<bar>(100.0); 2]);
        assert_eq!(state.saturation[1].oil, 0.7);
        assert_eq!(state.dissolved_gas_ratio.len(), 2);
    }
}
