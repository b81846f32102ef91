/// How cells are weighted when averaging a region's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Weighting {
    /// Weight each cell by its pore volume.
    #[default]
    PoreVolume,

    /// Weight each cell by its hydrocarbon pore volume, `pv·(So + Sg)`.
    ///
    /// Regions without hydrocarbons fall back to pore-volume weights.
    HydrocarbonPoreVolume,
}

/// Configuration for the rate converter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub weighting: Weighting,

    /// A phase is present in a region when its average saturation exceeds this value.
    pub presence_threshold: f64,

    /// Caps Rs by the produced gas-oil ratio and Rv by the produced oil-gas ratio.
    pub rate_limited_miscibility: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weighting: Weighting::PoreVolume,
            presence_threshold: 0.0,
            rate_limited_miscibility: true,
        }
    }
}

impl Config {
    /// Validates that the presence threshold is a saturation.
    ///
    /// # Errors
    ///
    /// Returns an error if `presence_threshold` is non-finite or outside `[0, 1)`.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.presence_threshold.is_finite()
            || !(0.0..1.0).contains(&self.presence_threshold)
        {
            return Err("presence_threshold must be finite and in [0, 1)");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn threshold_must_be_a_saturation() {
        for threshold in [-0.1, 1.0, f64::NAN] {
            let config = Config {
                presence_threshold: threshold,
                ..Config::default()
            };
            assert!(config.validate().is_err(), "accepted {threshold}");
        }
    }
}
