pub mod cyclical;
pub mod policy;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use cyclical::{CyclePhase, CyclicalEffect, PhaseLevels};
pub use policy::{GdpEffectMode, PolicyEffect, PolicyKind, ProfessionShock};

/// Per-year magnitudes of an effect. Years without an entry contribute zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearSchedule(BTreeMap<i32, f64>);

impl YearSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same magnitude for every year of `start..=end`.
    pub fn constant(start: i32, end: i32, magnitude: f64) -> Self {
        (start..=end).map(|year| (year, magnitude)).collect()
    }

    pub fn at(&self, year: i32) -> f64 {
        self.0.get(&year).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, year: i32) -> bool {
        self.0.contains_key(&year)
    }

    pub fn set(&mut self, year: i32, magnitude: f64) {
        self.0.insert(year, magnitude);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.0.iter().map(|(&year, &magnitude)| (year, magnitude))
    }
}

impl FromIterator<(i32, f64)> for YearSchedule {
    fn from_iter<T: IntoIterator<Item = (i32, f64)>>(iter: T) -> Self {
        YearSchedule(iter.into_iter().collect())
    }
}

/// Compose simultaneous fractional effects: `Π (1 + e_i)`.
///
/// Effects are never summed; `[0.1, 0.1]` gives `1.21`, not `1.2`.
pub fn combined_multiplier<I: IntoIterator<Item = f64>>(effects: I) -> f64 {
    effects.into_iter().map(|e| 1.0 + e).product()
}
