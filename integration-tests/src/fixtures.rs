use serde::Deserialize;
use uom::si::{f64::Ratio, ratio::ratio};
use voidage_pvt::{
    Phase, PropertyError,
    model::compressible::{ConstantCompressibility, PhaseCompressibility},
};
use voidage_rates::Config;

/// A minimal black-oil fluid description, read from TOML.
///
/// Pressures are in pascal and compressibilities in 1/Pa.
#[derive(Debug, Deserialize)]
pub struct FluidDeck {
    pub water: Option<PhaseCompressibility>,
    pub oil: Option<PhaseCompressibility>,
    pub gas: Option<PhaseCompressibility>,

    #[serde(default)]
    pub miscibility: Option<SaturatedRatios>,

    #[serde(default)]
    pub converter: Config,
}

/// Constant saturated miscibility ratios of a live-oil / wet-gas fluid.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SaturatedRatios {
    #[serde(default)]
    pub dissolved_gas_ratio: f64,

    #[serde(default)]
    pub vaporized_oil_ratio: f64,
}

impl FluidDeck {
    /// Parses a deck from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a [`toml::de::Error`] if the text is not a valid deck.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Builds the property evaluator described by the deck.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] if the deck's parameters are non-physical.
    pub fn props(&self) -> Result<ConstantCompressibility, PropertyError> {
        let phases = [
            (Phase::Water, self.water),
            (Phase::Oil, self.oil),
            (Phase::Gas, self.gas),
        ]
        .into_iter()
        .filter_map(|(phase, param)| param.map(|param| (phase, param)));

        let props = ConstantCompressibility::new(phases)?;
        match self.miscibility {
            Some(ratios) => props.with_saturated_ratios(
                Ratio::new::<ratio>(ratios.dissolved_gas_ratio),
                Ratio::new::<ratio>(ratios.vaporized_oil_ratio),
            ),
            None => Ok(props),
        }
    }
}
