use serde::{Deserialize, Serialize};

use super::YearSchedule;
use crate::data::Profession;

// ─────────────────────────────────────────────────────────────────────────────
// One-off events hitting a single profession
// ─────────────────────────────────────────────────────────────────────────────

/// A disaster, weather swing or recovery acting on one profession's income.
///
/// Magnitudes are fractional (`-0.82` is −82 %) and keyed by the year in which
/// the income is affected, not the year the event happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfessionShock {
    pub name: String,
    pub profession: Profession,
    pub magnitudes: YearSchedule,
}

impl ProfessionShock {
    pub fn new(name: impl Into<String>, profession: Profession, magnitudes: YearSchedule) -> Self {
        ProfessionShock {
            name: name.into(),
            profession,
            magnitudes,
        }
    }

    pub fn is_active(&self, year: i32) -> bool {
        self.magnitudes.contains(year)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    General,
    /// Security or enforcement action; narrows the gap between the formal and
    /// full-economy Gini while active.
    Enforcement,
}

/// How a policy's GDP schedule is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GdpEffectMode {
    /// Fraction folded into the combined policy multiplier.
    #[default]
    Relative,
    /// Amount added to GDP after every multiplier has been applied.
    Absolute,
}

/// A government or community intervention with an activation window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyEffect {
    pub name: String,
    #[serde(default)]
    pub kind: PolicyKind,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub gdp_mode: GdpEffectMode,
    #[serde(default)]
    pub gdp: YearSchedule,
    /// Happiness index points added per year.
    #[serde(default)]
    pub happiness: YearSchedule,
    /// Gini delta per year, applied to both inequality tracks.
    #[serde(default)]
    pub gini: YearSchedule,
}

impl PolicyEffect {
    /// A policy with the same relative GDP effect in every active year.
    pub fn relative(
        name: impl Into<String>,
        start_year: i32,
        end_year: i32,
        magnitude: f64,
    ) -> Self {
        PolicyEffect {
            name: name.into(),
            kind: PolicyKind::General,
            start_year,
            end_year,
            gdp_mode: GdpEffectMode::Relative,
            gdp: YearSchedule::constant(start_year, end_year, magnitude),
            happiness: YearSchedule::new(),
            gini: YearSchedule::new(),
        }
    }

    /// A policy adding a fixed amount of GDP in every active year.
    pub fn absolute(name: impl Into<String>, start_year: i32, end_year: i32, amount: f64) -> Self {
        PolicyEffect {
            gdp_mode: GdpEffectMode::Absolute,
            ..Self::relative(name, start_year, end_year, amount)
        }
    }

    pub fn enforcement(mut self) -> Self {
        self.kind = PolicyKind::Enforcement;
        self
    }

    pub fn with_happiness(mut self, points_per_year: f64) -> Self {
        self.happiness = YearSchedule::constant(self.start_year, self.end_year, points_per_year);
        self
    }

    pub fn with_gini(mut self, delta_per_year: f64) -> Self {
        self.gini = YearSchedule::constant(self.start_year, self.end_year, delta_per_year);
        self
    }

    pub fn is_active(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    /// Relative GDP effect in `year`; zero outside the window or for
    /// absolute policies.
    pub fn relative_gdp(&self, year: i32) -> f64 {
        match self.gdp_mode {
            GdpEffectMode::Relative if self.is_active(year) => self.gdp.at(year),
            _ => 0.0,
        }
    }

    pub fn absolute_gdp(&self, year: i32) -> f64 {
        match self.gdp_mode {
            GdpEffectMode::Absolute if self.is_active(year) => self.gdp.at(year),
            _ => 0.0,
        }
    }

    pub fn happiness_delta(&self, year: i32) -> f64 {
        if self.is_active(year) {
            self.happiness.at(year)
        } else {
            0.0
        }
    }

    pub fn gini_delta(&self, year: i32) -> f64 {
        if self.is_active(year) {
            self.gini.at(year)
        } else {
            0.0
        }
    }
}
