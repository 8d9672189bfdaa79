use serde::{Deserialize, Serialize};

use crate::data::Profession;
use crate::error::{ForecastError, Result};

/// Per-head income of a profession in each half of its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseLevels {
    pub peak_per_head: f64,
    pub trough_per_head: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    Peak,
    Trough,
}

/// A recurring phenomenon driving one profession's income.
///
/// Trigger years satisfy `year mod period == phase_offset`; the income peak
/// lands `lag` years after each trigger. The sturgeon surge, for instance, has
/// `period = 3`, `phase_offset = 0`, `lag = 1`: surges in 99 and 102, high
/// fisher income in 100 and 103.
///
/// Without `levels` the cycle is a plain multiplicative bump of `magnitude` in
/// peak years. With `levels` the profession's income is re-anchored every
/// year to `level × headcount`, which is how the fishing cycle was calibrated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CyclicalEffect {
    pub name: String,
    pub profession: Profession,
    pub period: u32,
    pub phase_offset: u32,
    pub lag: u32,
    #[serde(default)]
    pub magnitude: f64,
    #[serde(default)]
    pub levels: Option<PhaseLevels>,
}

impl CyclicalEffect {
    pub fn new(
        name: impl Into<String>,
        profession: Profession,
        period: u32,
        phase_offset: u32,
        lag: u32,
        magnitude: f64,
    ) -> Self {
        CyclicalEffect {
            name: name.into(),
            profession,
            period,
            phase_offset,
            lag,
            magnitude,
            levels: None,
        }
    }

    pub fn with_levels(mut self, levels: PhaseLevels) -> Self {
        self.levels = Some(levels);
        self
    }

    fn checked_period(&self) -> Result<i32> {
        if self.period == 0 {
            return Err(ForecastError::domain(
                "cycle phase",
                format!("cycle '{}' has a zero period", self.name),
            ));
        }
        Ok(self.period as i32)
    }

    pub fn is_trigger_year(&self, year: i32) -> Result<bool> {
        let period = self.checked_period()?;
        Ok(year.rem_euclid(period) == self.phase_offset as i32 % period)
    }

    pub fn phase_at(&self, year: i32) -> Result<CyclePhase> {
        if self.is_trigger_year(year - self.lag as i32)? {
            Ok(CyclePhase::Peak)
        } else {
            Ok(CyclePhase::Trough)
        }
    }

    /// Multiplicative delta for `year`; zero for level-anchored cycles.
    pub fn adjustment(&self, year: i32) -> Result<f64> {
        if self.levels.is_some() {
            return Ok(0.0);
        }
        Ok(match self.phase_at(year)? {
            CyclePhase::Peak => self.magnitude,
            CyclePhase::Trough => 0.0,
        })
    }

    /// Per-head income the profession is re-anchored to in `year`, if any.
    pub fn level_per_head(&self, year: i32) -> Result<Option<f64>> {
        let Some(levels) = self.levels else {
            return Ok(None);
        };
        Ok(Some(match self.phase_at(year)? {
            CyclePhase::Peak => levels.peak_per_head,
            CyclePhase::Trough => levels.trough_per_head,
        }))
    }

    /// Move the trigger years by `years`, after actual data has shown the
    /// assumed phase to be wrong.
    pub fn shift_phase(&mut self, years: i32) -> Result<()> {
        let period = self.checked_period()?;
        self.phase_offset = (self.phase_offset as i32 + years).rem_euclid(period) as u32;
        Ok(())
    }
}
