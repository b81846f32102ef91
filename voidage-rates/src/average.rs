use uom::{
    ConstZero,
    si::f64::{Energy, Pressure, Ratio, Volume},
};
use voidage_pvt::{Phase, PhaseMap, PhasePresence, PhaseUsage};

use crate::{Config, ConfigurationError, RegionMapping, ReservoirState, Weighting};

/// The weighted-average thermodynamic state of one region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionAverage {
    pub pressure: Pressure,
    pub dissolved_gas_ratio: Ratio,
    pub vaporized_oil_ratio: Ratio,
    pub saturation: PhaseMap<f64>,

    /// Total pore volume of the region, regardless of the weighting used.
    pub pore_volume: Volume,

    /// Active phases whose average saturation exceeds the presence threshold.
    pub presence: PhasePresence,
}

/// Averages the state of every region.
///
/// Pressure, Rs, Rv and saturations are weighted arithmetic means over the
/// region's cells, with weights chosen by [`Config::weighting`].
/// The state is only read during the call.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if an array length differs from the
/// mapping's cell count, a cell holds a non-finite value or an invalid pore
/// volume, or a region has zero total pore volume.
pub fn average(
    state: &impl ReservoirState,
    regions: &RegionMapping,
    usage: &PhaseUsage,
    config: &Config,
) -> Result<Vec<RegionAverage>, ConfigurationError> {
    check_lengths(state, regions.num_cells())?;
    check_values(state)?;

    regions
        .regions()
        .map(|(region, cells)| average_region(state, region, cells, usage, config))
        .collect()
}

fn check_lengths(state: &impl ReservoirState, num_cells: usize) -> Result<(), ConfigurationError> {
    let lengths = [
        ("pressure", state.pressure().len()),
        ("saturation", state.saturation().len()),
        ("dissolved_gas_ratio", state.dissolved_gas_ratio().len()),
        ("vaporized_oil_ratio", state.vaporized_oil_ratio().len()),
        ("pore_volume", state.pore_volume().len()),
    ];

    match lengths.into_iter().find(|&(_, len)| len != num_cells) {
        Some((field, actual)) => Err(ConfigurationError::LengthMismatch {
            field,
            expected: num_cells,
            actual,
        }),
        None => Ok(()),
    }
}

fn check_values(state: &impl ReservoirState) -> Result<(), ConfigurationError> {
    for (cell, pv) in state.pore_volume().iter().enumerate() {
        if !pv.value.is_finite() || pv.value < 0.0 {
            return Err(ConfigurationError::InvalidPoreVolume {
                cell,
                value: pv.value,
            });
        }
    }

    check_finite("pressure", state.pressure().iter().map(|p| p.value))?;
    check_finite(
        "dissolved_gas_ratio",
        state.dissolved_gas_ratio().iter().map(|r| r.value),
    )?;
    check_finite(
        "vaporized_oil_ratio",
        state.vaporized_oil_ratio().iter().map(|r| r.value),
    )?;
    check_finite(
        "saturation",
        state
            .saturation()
            .iter()
            .map(|s| s.water + s.oil + s.gas),
    )
}

fn check_finite(
    field: &'static str,
    mut values: impl Iterator<Item = f64>,
) -> Result<(), ConfigurationError> {
    match values.position(|v| !v.is_finite()) {
        Some(cell) => Err(ConfigurationError::NonFiniteValue { field, cell }),
        None => Ok(()),
    }
}

fn average_region(
    state: &impl ReservoirState,
    region: usize,
    cells: &[usize],
    usage: &PhaseUsage,
    config: &Config,
) -> Result<RegionAverage, ConfigurationError> {
    let pv = state.pore_volume();
    let saturation = state.saturation();

    let pore_volume = cells.iter().fold(Volume::ZERO, |total, &cell| total + pv[cell]);
    if pore_volume <= Volume::ZERO {
        return Err(ConfigurationError::ZeroPoreVolume { region });
    }

    let pore_weights = || cells.iter().map(|&cell| pv[cell]).collect::<Vec<_>>();
    let weights = match config.weighting {
        Weighting::PoreVolume => pore_weights(),
        Weighting::HydrocarbonPoreVolume => {
            // Saturations may carry small negative round-off.
            let hydrocarbon: Vec<Volume> = cells
                .iter()
                .map(|&cell| pv[cell] * (saturation[cell].oil + saturation[cell].gas).max(0.0))
                .collect();
            let total = hydrocarbon.iter().fold(Volume::ZERO, |total, &w| total + w);
            if total > Volume::ZERO {
                hydrocarbon
            } else {
                pore_weights()
            }
        }
    };
    let total_weight = weights.iter().fold(Volume::ZERO, |total, &w| total + w);

    let mut pressure_sum = Energy::ZERO;
    let mut rs_sum = Volume::ZERO;
    let mut rv_sum = Volume::ZERO;
    let mut saturation_sum = PhaseMap::splat(Volume::ZERO);

    for (&cell, &w) in cells.iter().zip(&weights) {
        pressure_sum += w * state.pressure()[cell];
        rs_sum += w * state.dissolved_gas_ratio()[cell].value;
        rv_sum += w * state.vaporized_oil_ratio()[cell].value;
        for phase in Phase::ALL {
            saturation_sum[phase] += w * saturation[cell][phase];
        }
    }

    let saturation = saturation_sum.map(|s| (s / total_weight).value);
    let mut presence = PhasePresence::splat(false);
    for &phase in usage.phases() {
        presence[phase] = saturation[phase] > config.presence_threshold;
    }

    Ok(RegionAverage {
        pressure: pressure_sum / total_weight,
        dissolved_gas_ratio: rs_sum / total_weight,
        vaporized_oil_ratio: rv_sum / total_weight,
        saturation,
        pore_volume,
        presence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{pressure::bar, ratio::ratio, volume::cubic_meter};

    use crate::BlackOilState;

    fn volumes(values: &[f64]) -> Vec<Volume> {
        values.iter().map(|&v| Volume::new::<cubic_meter>(v)).collect()
    }

    fn pressures(values: &[f64]) -> Vec<Pressure> {
        values.iter().map(|&p| Pressure::new::<bar>(p)).collect()
    }

    #[test]
    fn pore_volume_weighted_pressure() {
        let usage = PhaseUsage::water_oil();
        let mut state = BlackOilState::new(&usage, volumes(&[1.0, 2.0, 3.0, 5.0]));
        state.pressure = pressures(&[100.0, 200.0, 400.0, 50.0]);

        let regions = RegionMapping::new(vec![0, 0, 0, 1]).unwrap();
        let averages = average(&state, &regions, &usage, &Config::default()).unwrap();

        assert_eq!(averages.len(), 2);

        // (1·100 + 2·200 + 3·400) / 6 = 1700 / 6
        assert_relative_eq!(
            averages[0].pressure.get::<bar>(),
            1700.0 / 6.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(averages[0].pore_volume.get::<cubic_meter>(), 6.0);
        assert_relative_eq!(averages[1].pressure.get::<bar>(), 50.0, max_relative = 1e-12);
    }

    #[test]
    fn miscibility_ratios_and_presence() {
        let usage = PhaseUsage::black_oil();
        let mut state = BlackOilState::new(&usage, volumes(&[1.0, 3.0]));
        state.saturation = vec![PhaseMap::new(0.2, 0.8, 0.0), PhaseMap::new(0.2, 0.6, 0.2)];
        state.dissolved_gas_ratio = vec![Ratio::new::<ratio>(100.0), Ratio::new::<ratio>(60.0)];

        let averages = average(
            &state,
            &RegionMapping::single(2).unwrap(),
            &usage,
            &Config::default(),
        )
        .unwrap();
        let region = &averages[0];

        assert_relative_eq!(region.dissolved_gas_ratio.get::<ratio>(), 70.0, epsilon = 1e-12);
        assert_relative_eq!(region.vaporized_oil_ratio.get::<ratio>(), 0.0);
        assert_relative_eq!(region.saturation.oil, 0.65, epsilon = 1e-12);
        assert_relative_eq!(region.saturation.gas, 0.15, epsilon = 1e-12);
        assert_eq!(region.presence, PhaseMap::new(true, true, true));
    }

    #[test]
    fn presence_respects_threshold_and_usage() {
        let usage = PhaseUsage::oil_gas();
        let mut state = BlackOilState::new(&usage, volumes(&[1.0]));
        state.saturation = vec![PhaseMap::new(0.5, 0.49, 0.01)];

        let config = Config {
            presence_threshold: 0.05,
            ..Config::default()
        };
        let averages = average(&state, &RegionMapping::single(1).unwrap(), &usage, &config).unwrap();

        // Water is inactive, gas is below the threshold.
        assert_eq!(averages[0].presence, PhaseMap::new(false, true, false));
    }

    #[test]
    fn hydrocarbon_weighting_ignores_water_filled_cells() {
        let usage = PhaseUsage::water_oil();
        let mut state = BlackOilState::new(&usage, volumes(&[1.0, 1.0]));
        state.pressure = pressures(&[100.0, 300.0]);
        state.saturation = vec![PhaseMap::new(1.0, 0.0, 0.0), PhaseMap::new(0.5, 0.5, 0.0)];

        let regions = RegionMapping::single(2).unwrap();
        let config = Config {
            weighting: Weighting::HydrocarbonPoreVolume,
            ..Config::default()
        };
        let averages = average(&state, &regions, &usage, &config).unwrap();
        assert_relative_eq!(averages[0].pressure.get::<bar>(), 300.0, max_relative = 1e-12);
        assert_relative_eq!(averages[0].pore_volume.get::<cubic_meter>(), 2.0);

        // Without hydrocarbons the weights fall back to pore volume.
        state.saturation = vec![PhaseMap::new(1.0, 0.0, 0.0); 2];
        let averages = average(&state, &regions, &usage, &config).unwrap();
        assert_relative_eq!(averages[0].pressure.get::<bar>(), 200.0, max_relative = 1e-12);
    }

    #[test]
    fn hydrocarbon_weights_ignore_negative_saturations() {
        let usage = PhaseUsage::water_oil();
        let mut state = BlackOilState::new(&usage, volumes(&[1.0, 1.0]));
        state.pressure = pressures(&[100.0, 300.0]);
        state.saturation = vec![PhaseMap::new(0.5, 0.5, 0.0), PhaseMap::new(1.5, -0.5, 0.0)];

        let regions = RegionMapping::single(2).unwrap();
        let config = Config {
            weighting: Weighting::HydrocarbonPoreVolume,
            ..Config::default()
        };
        let averages = average(&state, &regions, &usage, &config).unwrap();
        assert_relative_eq!(averages[0].pressure.get::<bar>(), 100.0, max_relative = 1e-12);

        // Hydrocarbon weights that cancel out fall back to pore volume.
        state.saturation = vec![PhaseMap::new(1.0, -1.0e-12, 0.0), PhaseMap::new(1.0, 0.0, 0.0)];
        let averages = average(&state, &regions, &usage, &config).unwrap();
        assert!(averages[0].pressure.value.is_finite());
        assert_relative_eq!(averages[0].pressure.get::<bar>(), 200.0, max_relative = 1e-12);
    }

    #[test]
    fn zero_pore_volume_region_is_a_configuration_error() {
        let usage = PhaseUsage::water_oil();
        let state = BlackOilState::new(&usage, volumes(&[1.0, 0.0, 0.0]));
        let regions = RegionMapping::new(vec![0, 1, 1]).unwrap();

        assert_eq!(
            average(&state, &regions, &usage, &Config::default()),
            Err(ConfigurationError::ZeroPoreVolume { region: 1 })
        );
    }

    #[test]
    fn malformed_state_is_rejected() {
        let usage = PhaseUsage::water_oil();
        let regions = RegionMapping::single(2).unwrap();

        let mut state = BlackOilState::new(&usage, volumes(&[1.0, 1.0]));
        state.pressure.pop();
        assert_eq!(
            average(&state, &regions, &usage, &Config::default()),
            Err(ConfigurationError::LengthMismatch {
                field: "pressure",
                expected: 2,
                actual: 1,
            })
        );

        let state = BlackOilState::new(&usage, volumes(&[1.0, -1.0]));
        assert!(matches!(
            average(&state, &regions, &usage, &Config::default()),
            Err(ConfigurationError::InvalidPoreVolume { cell: 1, .. })
        ));

        let mut state = BlackOilState::new(&usage, volumes(&[1.0, 1.0]));
        state.saturation[1].oil = f64::NAN;
        assert_eq!(
            average(&state, &regions, &usage, &Config::default()),
            Err(ConfigurationError::NonFiniteValue {
                field: "saturation",
                cell: 1,
            })
        );
    }
}
