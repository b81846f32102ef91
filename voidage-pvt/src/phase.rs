use std::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::PropertyError;

/// A fluid phase of the black-oil model.
///
/// Phases are ordered canonically as water, oil, gas.
/// Rate and coefficient vectors use this order restricted to the active phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Phase {
    Water,
    Oil,
    Gas,
}

impl Phase {
    /// All phases in canonical order.
    pub const ALL: [Phase; 3] = [Phase::Water, Phase::Oil, Phase::Gas];

    /// Returns the canonical index of the phase (water = 0, oil = 1, gas = 2).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Phase::Water => 0,
            Phase::Oil => 1,
            Phase::Gas => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Water => "water",
            Phase::Oil => "oil",
            Phase::Gas => "gas",
        };
        f.write_str(name)
    }
}

/// One value per canonical phase.
///
/// # Example
///
/// ```
/// use voidage_pvt::{Phase, PhaseMap};
///
/// let mut saturation = PhaseMap::splat(0.0);
/// saturation[Phase::Oil] = 0.8;
/// saturation[Phase::Water] = 0.2;
///
/// assert_eq!(saturation.oil, 0.8);
/// assert_eq!(saturation.iter().map(|(_, s)| s).sum::<f64>(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseMap<T> {
    pub water: T,
    pub oil: T,
    pub gas: T,
}

impl<T> PhaseMap<T> {
    /// Creates a map from the three phase values.
    pub const fn new(water: T, oil: T, gas: T) -> Self {
        Self { water, oil, gas }
    }

    /// Iterates over `(phase, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &T)> {
        [
            (Phase::Water, &self.water),
            (Phase::Oil, &self.oil),
            (Phase::Gas, &self.gas),
        ]
        .into_iter()
    }

    /// Applies `f` to every value.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PhaseMap<U> {
        PhaseMap {
            water: f(self.water),
            oil: f(self.oil),
            gas: f(self.gas),
        }
    }
}

impl<T: Clone> PhaseMap<T> {
    /// Creates a map holding the same value for every phase.
    pub fn splat(value: T) -> Self {
        Self {
            water: value.clone(),
            oil: value.clone(),
            gas: value,
        }
    }
}

impl<T> Index<Phase> for PhaseMap<T> {
    type Output = T;

    fn index(&self, phase: Phase) -> &T {
        match phase {
            Phase::Water => &self.water,
            Phase::Oil => &self.oil,
            Phase::Gas => &self.gas,
        }
    }
}

impl<T> IndexMut<Phase> for PhaseMap<T> {
    fn index_mut(&mut self, phase: Phase) -> &mut T {
        match phase {
            Phase::Water => &mut self.water,
            Phase::Oil => &mut self.oil,
            Phase::Gas => &mut self.gas,
        }
    }
}

/// Which phases are mobile in the fluid whose properties are requested.
///
/// Evaluators may use this to pick saturated or undersaturated branches.
pub type PhasePresence = PhaseMap<bool>;

/// The set of active phases and their positions in rate vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Phase>", into = "Vec<Phase>"))]
pub struct PhaseUsage {
    phases: Vec<Phase>,
}

impl PhaseUsage {
    /// Creates a phase usage from a list of active phases.
    ///
    /// The phases are stored in canonical order regardless of input order.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::InvalidInput`] if `phases` is empty or lists a phase twice.
    pub fn new(phases: &[Phase]) -> Result<Self, PropertyError> {
        if phases.is_empty() {
            return Err(PropertyError::InvalidInput(
                "at least one phase must be active".into(),
            ));
        }

        let mut sorted = phases.to_vec();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(PropertyError::InvalidInput(format!(
                "the {} phase is listed more than once",
                pair[0]
            )));
        }

        Ok(Self { phases: sorted })
    }

    /// Water and oil.
    #[must_use]
    pub fn water_oil() -> Self {
        Self {
            phases: vec![Phase::Water, Phase::Oil],
        }
    }

    /// Oil and gas.
    #[must_use]
    pub fn oil_gas() -> Self {
        Self {
            phases: vec![Phase::Oil, Phase::Gas],
        }
    }

    /// Water, oil and gas.
    #[must_use]
    pub fn black_oil() -> Self {
        Self {
            phases: Phase::ALL.to_vec(),
        }
    }

    #[must_use]
    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    /// Active phases in canonical order.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    #[must_use]
    pub fn is_active(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    /// Returns the position of `phase` in rate vectors, if active.
    #[must_use]
    pub fn position(&self, phase: Phase) -> Option<usize> {
        self.phases.iter().position(|&p| p == phase)
    }

    /// Returns true if both oil and gas are active, so miscibility can couple them.
    #[must_use]
    pub fn has_hydrocarbon_pair(&self) -> bool {
        self.is_active(Phase::Oil) && self.is_active(Phase::Gas)
    }
}

impl TryFrom<Vec<Phase>> for PhaseUsage {
    type Error = PropertyError;

    fn try_from(phases: Vec<Phase>) -> Result<Self, Self::Error> {
        Self::new(&phases)
    }
}

impl From<PhaseUsage> for Vec<Phase> {
    fn from(usage: PhaseUsage) -> Self {
        usage.phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_stored_in_canonical_order() {
        let usage = PhaseUsage::new(&[Phase::Gas, Phase::Water]).unwrap();

        assert_eq!(usage.phases(), &[Phase::Water, Phase::Gas]);
        assert_eq!(usage.position(Phase::Water), Some(0));
        assert_eq!(usage.position(Phase::Gas), Some(1));
        assert_eq!(usage.position(Phase::Oil), None);
        assert!(!usage.has_hydrocarbon_pair());
    }

    #[test]
    fn usage_rejects_empty_and_duplicate_phases() {
        assert!(matches!(
            PhaseUsage::new(&[]),
            Err(PropertyError::InvalidInput(_))
        ));
        assert!(matches!(
            PhaseUsage::new(&[Phase::Oil, Phase::Oil]),
            Err(PropertyError::InvalidInput(_))
        ));
    }

    #[test]
    fn phase_map_indexing() {
        let mut map = PhaseMap::new(1, 2, 3);
        map[Phase::Gas] += 10;

        assert_eq!(map[Phase::Water], 1);
        assert_eq!(map[Phase::Oil], 2);
        assert_eq!(map[Phase::Gas], 13);
        assert_eq!(
            map.map(|v| v * 2).iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            vec![2, 4, 26]
        );
    }
}
