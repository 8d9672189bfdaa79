use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calibration::ParameterSet;
use crate::data::Profession;
use crate::effects::{
    combined_multiplier, CyclePhase, CyclicalEffect, PolicyEffect, PolicyKind, ProfessionShock,
};
use crate::error::Result;

/// How tracked profession incomes are turned into GDP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// `gdp = tracked_total × scale_factor × productivity × policy`, with the
    /// scale factor fixed at the anchor year.
    #[default]
    Scaled,
    /// `gdp = (prior_gdp + Σ profession deltas) × productivity × policy`.
    CarryForward,
}

/// Long-run behaviour of the two Gini tracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InequalitySettings {
    pub target_gini: f64,
    pub reversion_rate: f64,
    /// Share of the full-vs-formal gap closed per year of active enforcement.
    pub enforcement_gap_closure: f64,
    pub informal_professions: Vec<Profession>,
}

impl Default for InequalitySettings {
    fn default() -> Self {
        InequalitySettings {
            target_gini: 0.30,
            reversion_rate: 0.02,
            enforcement_gap_closure: 0.25,
            informal_professions: vec![Profession::from("smuggler")],
        }
    }
}

/// Everything that drives a forecast chain besides the anchor year itself.
///
/// All per-year behaviour is data: growth rates, cycles, shocks and policies
/// are looked up by `(profession, year)` or `year`, never special-cased.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub tracked: Vec<Profession>,
    pub aggregation: AggregationMode,
    pub base_growth: BTreeMap<Profession, f64>,
    pub cycles: Vec<CyclicalEffect>,
    pub shocks: Vec<ProfessionShock>,
    pub policies: Vec<PolicyEffect>,
    /// Workforce productivity factor per year; missing years count as 1.0.
    pub population_productivity: BTreeMap<i32, f64>,
    pub inequality: InequalitySettings,
    pub baseline_happiness: f64,
    /// Annual population growth measured by calibration; reported only.
    pub population_growth: Option<f64>,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            tracked: vec![
                Profession::Fisher,
                Profession::Farmer,
                Profession::Craftsman,
                Profession::ServiceProvider,
                Profession::CivilServant,
            ],
            aggregation: AggregationMode::Scaled,
            base_growth: BTreeMap::new(),
            cycles: Vec::new(),
            shocks: Vec::new(),
            policies: Vec::new(),
            population_productivity: BTreeMap::new(),
            inequality: InequalitySettings::default(),
            baseline_happiness: 70.0,
            population_growth: None,
        }
    }
}

impl Scenario {
    /// Merge calibrated parameters. Entries sharing a name (or, for growth,
    /// a profession) with existing ones replace them, so re-running
    /// calibration on new evidence supersedes earlier estimates.
    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.base_growth.extend(parameters.growth);
        if parameters.population_growth.is_some() {
            self.population_growth = parameters.population_growth;
        }
        for cycle in parameters.cycles {
            self.cycles.retain(|c| c.name != cycle.name);
            self.cycles.push(cycle);
        }
        for shock in parameters.shocks {
            self.shocks.retain(|s| s.name != shock.name);
            self.shocks.push(shock);
        }
        self
    }

    pub fn growth_rate(&self, profession: &Profession) -> f64 {
        self.base_growth.get(profession).copied().unwrap_or(0.0)
    }

    pub fn productivity(&self, year: i32) -> f64 {
        self.population_productivity
            .get(&year)
            .copied()
            .unwrap_or(1.0)
    }

    /// Per-head level a cycle anchors `profession` to in `year`, if any.
    pub fn cycle_level(&self, profession: &Profession, year: i32) -> Result<Option<f64>> {
        for cycle in self.cycles.iter().filter(|c| &c.profession == profession) {
            if let Some(level) = cycle.level_per_head(year)? {
                return Ok(Some(level));
            }
        }
        Ok(None)
    }

    /// Combined cyclical delta for `(profession, year)`.
    pub fn cyclical_adjustment(&self, profession: &Profession, year: i32) -> Result<f64> {
        let mut deltas = Vec::new();
        for cycle in self.cycles.iter().filter(|c| &c.profession == profession) {
            deltas.push(cycle.adjustment(year)?);
        }
        Ok(combined_multiplier(deltas) - 1.0)
    }

    /// Combined event delta for `(profession, year)`.
    pub fn event_adjustment(&self, profession: &Profession, year: i32) -> f64 {
        combined_multiplier(
            self.shocks
                .iter()
                .filter(|s| &s.profession == profession)
                .map(|s| s.magnitudes.at(year)),
        ) - 1.0
    }

    /// `Π (1 + e)` over the relative GDP effects of every policy active in `year`.
    pub fn policy_multiplier(&self, year: i32) -> f64 {
        combined_multiplier(self.policies.iter().map(|p| p.relative_gdp(year)))
    }

    pub fn absolute_policy_gdp(&self, year: i32) -> f64 {
        self.policies.iter().map(|p| p.absolute_gdp(year)).sum()
    }

    pub fn happiness_delta(&self, year: i32) -> f64 {
        self.policies.iter().map(|p| p.happiness_delta(year)).sum()
    }

    pub fn gini_delta(&self, year: i32) -> f64 {
        self.policies.iter().map(|p| p.gini_delta(year)).sum()
    }

    pub fn enforcement_active(&self, year: i32) -> bool {
        self.policies
            .iter()
            .any(|p| p.kind == PolicyKind::Enforcement && p.is_active(year))
    }

    /// Names of the cycles in their peak, shocks and policies active in `year`.
    pub fn notes_for(&self, year: i32) -> Result<Vec<String>> {
        let mut notes = Vec::new();
        for cycle in &self.cycles {
            if cycle.phase_at(year)? == CyclePhase::Peak {
                notes.push(format!("{} peak", cycle.name));
            }
        }
        notes.extend(
            self.shocks
                .iter()
                .filter(|s| s.is_active(year) && s.magnitudes.at(year) != 0.0)
                .map(|s| format!("{} {:+.1}%", s.name, s.magnitudes.at(year) * 100.0)),
        );
        notes.extend(
            self.policies
                .iter()
                .filter(|p| p.is_active(year))
                .map(|p| p.name.clone()),
        );
        Ok(notes)
    }
}
