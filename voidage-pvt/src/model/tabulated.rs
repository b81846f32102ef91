use ndarray::Array1;
use ninterp::{
    error::ValidateError,
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};
use thiserror::Error;
use uom::{
    ConstZero,
    si::{
        f64::{Pressure, Ratio},
        pressure::pascal,
        ratio::ratio,
    },
};

use crate::{Phase, PhaseMap, PhaseUsage, PropertyError};

use super::{BlackOilProperties, FluidCondition, VolumeFactor};

/// Errors that may occur when building a property table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error("table `{property}` has {pressures} pressures but {values} values")]
    LengthMismatch {
        property: &'static str,
        pressures: usize,
        values: usize,
    },

    #[error("table `{property}` has an invalid value {value}")]
    InvalidValue { property: &'static str, value: f64 },

    #[error("the {0} phase is not active")]
    InactivePhase(Phase),

    #[error("table `{0}` requires both oil and gas to be active")]
    MissingHydrocarbonPair(&'static str),

    #[error("`{property}` requires the `{table}` table")]
    MissingTable {
        property: &'static str,
        table: &'static str,
    },

    #[error("table `{0}` must be strictly increasing")]
    NotIncreasing(&'static str),
}

/// A property tabulated against pressure, interpolated linearly.
///
/// Pressures outside the tabulated range are an evaluation error; there is no
/// extrapolation.
struct PressureTable {
    property: &'static str,
    pressures: Vec<f64>,
    values: Vec<f64>,
    interp: Interp1DOwned<f64, Linear>,
}

impl PressureTable {
    fn new(
        property: &'static str,
        pressures: &[Pressure],
        values: &[f64],
        min_value: f64,
    ) -> Result<Self, TableError> {
        if pressures.len() != values.len() {
            return Err(TableError::LengthMismatch {
                property,
                pressures: pressures.len(),
                values: values.len(),
            });
        }
        if let Some(&value) = values.iter().find(|v| !v.is_finite() || **v < min_value) {
            return Err(TableError::InvalidValue { property, value });
        }

        let pressures: Vec<f64> = pressures.iter().map(|p| p.value).collect();
        let values = values.to_vec();
        let interp = Interp1DOwned::new(
            Array1::from(pressures.clone()),
            Array1::from(values.clone()),
            Linear,
            Extrapolate::Error,
        )?;

        Ok(Self {
            property,
            pressures,
            values,
            interp,
        })
    }

    fn value(&self, pressure: Pressure) -> Result<f64, PropertyError> {
        self.interp
            .interpolate(&[pressure.value])
            .map_err(|err| PropertyError::OutOfRange {
                property: self.property,
                pressure: pressure.value,
                context: err.to_string(),
            })
    }

    /// Slope of the segment containing `pressure`.
    fn slope(&self, pressure: Pressure) -> f64 {
        let n = self.pressures.len();
        if n < 2 {
            return 0.0;
        }
        let upper = self
            .pressures
            .partition_point(|&p| p <= pressure.value)
            .clamp(1, n - 1);
        let lower = upper - 1;

        (self.values[upper] - self.values[lower]) / (self.pressures[upper] - self.pressures[lower])
    }

    fn is_increasing(&self) -> bool {
        self.values.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Pressure, in pascal, at which the table reaches `value`.
    ///
    /// Only meaningful for strictly increasing tables.
    fn inverse(&self, value: f64) -> Option<f64> {
        let upper = self.values.partition_point(|&v| v < value);
        if upper == self.values.len() {
            return None;
        }
        if upper == 0 {
            return (self.values[0] == value).then_some(self.pressures[0]);
        }
        let lower = upper - 1;

        let t = (value - self.values[lower]) / (self.values[upper] - self.values[lower]);
        Some(self.pressures[lower] + t * (self.pressures[upper] - self.pressures[lower]))
    }
}

/// A black-oil property model built from pressure tables.
///
/// Each active phase carries a formation volume factor table, and live oil
/// or wet gas add saturated miscibility ratio tables.
///
/// The factor tables describe the saturated fluids. Gas factors never depend
/// on the requested Rv. Oil factors depend on the requested Rs only when an
/// undersaturated oil compressibility is set: present oil holding less gas
/// than it could dissolve is compressed from its bubble point,
///
/// ```text
/// B_o(p, Rs) = B_o,sat(p_b) / (1 + X + X²/2),   X = c_o (p − p_b),   Rs_sat(p_b) = Rs
/// ```
pub struct Tabulated {
    usage: PhaseUsage,
    factors: PhaseMap<Option<PressureTable>>,
    saturated_rs: Option<PressureTable>,
    saturated_rv: Option<PressureTable>,
    undersaturated_oil_compressibility: Option<f64>,
}

impl Tabulated {
    /// Creates a model for `usage` with no tables yet.
    ///
    /// Every active phase needs a factor table before it can be evaluated.
    #[must_use]
    pub fn new(usage: PhaseUsage) -> Self {
        Self {
            usage,
            factors: PhaseMap::new(None, None, None),
            saturated_rs: None,
            saturated_rv: None,
            undersaturated_oil_compressibility: None,
        }
    }

    /// Returns a new model with a formation volume factor table for `phase`.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the phase is inactive or the table is invalid.
    pub fn with_volume_factor_table(
        mut self,
        phase: Phase,
        pressures: &[Pressure],
        factors: &[f64],
    ) -> Result<Self, TableError> {
        if !self.usage.is_active(phase) {
            return Err(TableError::InactivePhase(phase));
        }
        let property = match phase {
            Phase::Water => "water formation volume factor",
            Phase::Oil => "oil formation volume factor",
            Phase::Gas => "gas formation volume factor",
        };
        let table = PressureTable::new(property, pressures, factors, f64::MIN_POSITIVE)?;
        self.factors[phase] = Some(table);
        Ok(self)
    }

    /// Returns a new model with a saturated dissolved-gas ratio table.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if oil and gas are not both active or the table is invalid.
    pub fn with_saturated_dissolved_gas_table(
        mut self,
        pressures: &[Pressure],
        ratios: &[f64],
    ) -> Result<Self, TableError> {
        let property = "saturated dissolved gas ratio";
        if !self.usage.has_hydrocarbon_pair() {
            return Err(TableError::MissingHydrocarbonPair(property));
        }
        let table = PressureTable::new(property, pressures, ratios, 0.0)?;
        if self.undersaturated_oil_compressibility.is_some() && !table.is_increasing() {
            return Err(TableError::NotIncreasing(property));
        }
        self.saturated_rs = Some(table);
        Ok(self)
    }

    /// Returns a new model with a saturated vaporized-oil ratio table.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if oil and gas are not both active or the table is invalid.
    pub fn with_saturated_vaporized_oil_table(
        mut self,
        pressures: &[Pressure],
        ratios: &[f64],
    ) -> Result<Self, TableError> {
        let property = "saturated vaporized oil ratio";
        if !self.usage.has_hydrocarbon_pair() {
            return Err(TableError::MissingHydrocarbonPair(property));
        }
        self.saturated_rv = Some(PressureTable::new(property, pressures, ratios, 0.0)?);
        Ok(self)
    }

    /// Returns a new model whose undersaturated oil has compressibility `c_o`, in 1/Pa.
    ///
    /// The saturated dissolved-gas ratio table must already be set and be
    /// strictly increasing, so that every Rs has a single bubble point.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the table is missing or not increasing,
    /// or the compressibility is negative or non-finite.
    pub fn with_undersaturated_oil_compressibility(
        mut self,
        compressibility: f64,
    ) -> Result<Self, TableError> {
        let property = "undersaturated oil compressibility";
        let Some(rs_table) = &self.saturated_rs else {
            return Err(TableError::MissingTable {
                property,
                table: "saturated dissolved gas ratio",
            });
        };
        if !rs_table.is_increasing() {
            return Err(TableError::NotIncreasing(rs_table.property));
        }
        if !compressibility.is_finite() || compressibility < 0.0 {
            return Err(TableError::InvalidValue {
                property,
                value: compressibility,
            });
        }
        self.undersaturated_oil_compressibility = Some(compressibility);
        Ok(self)
    }

    /// Oil factor below the bubble point curve, or `None` for saturated oil.
    fn undersaturated_oil(
        &self,
        table: &PressureTable,
        condition: &FluidCondition,
    ) -> Result<Option<VolumeFactor>, PropertyError> {
        let (Some(c), Some(rs_table)) = (self.undersaturated_oil_compressibility, &self.saturated_rs)
        else {
            return Ok(None);
        };
        if !condition.presence.oil {
            return Ok(None);
        }

        let rs = condition.dissolved_gas_ratio.get::<ratio>();
        if rs >= rs_table.value(condition.pressure)? {
            return Ok(None);
        }

        let bubble_point = rs_table
            .inverse(rs)
            .ok_or_else(|| PropertyError::OutOfRange {
                property: "bubble point pressure",
                pressure: condition.pressure.value,
                context: format!("no tabulated pressure saturates oil at rs = {rs}"),
            })?;
        let b_sat = table.value(Pressure::new::<pascal>(bubble_point))?;

        let x = c * (condition.pressure.value - bubble_point);
        let den = 1.0 + x + 0.5 * x * x;

        Ok(Some(VolumeFactor {
            value: Ratio::new::<ratio>(b_sat / den),
            d_dp: -b_sat * c * (1.0 + x) / (den * den),
        }))
    }
}

impl BlackOilProperties for Tabulated {
    fn phase_usage(&self) -> &PhaseUsage {
        &self.usage
    }

    fn evaluate(
        &self,
        phase: Phase,
        condition: &FluidCondition,
    ) -> Result<VolumeFactor, PropertyError> {
        let table = self.factors[phase]
            .as_ref()
            .ok_or(PropertyError::NotImplemented {
                property: "formation volume factor",
                phase,
            })?;

        if phase == Phase::Oil {
            if let Some(factor) = self.undersaturated_oil(table, condition)? {
                return Ok(factor);
            }
        }

        Ok(VolumeFactor {
            value: Ratio::new::<ratio>(table.value(condition.pressure)?),
            d_dp: table.slope(condition.pressure),
        })
    }

    fn saturated_dissolved_gas_ratio(&self, pressure: Pressure) -> Result<Ratio, PropertyError> {
        match &self.saturated_rs {
            Some(table) => Ok(Ratio::new::<ratio>(table.value(pressure)?)),
            None => Ok(Ratio::ZERO),
        }
    }

    fn saturated_vaporized_oil_ratio(&self, pressure: Pressure) -> Result<Ratio, PropertyError> {
        match &self.saturated_rv {
            Some(table) => Ok(Ratio::new::<ratio>(table.value(pressure)?)),
            None => Ok(Ratio::ZERO),
        }
    }
}
