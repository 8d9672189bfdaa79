use std::any::Any;
use std::collections::BTreeMap;

use krabmaga::engine::{schedule::Schedule, state::State};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::{HistoricalTable, IncomeScope, Profession, YearlyEconomicRecord};
use crate::error::{ForecastError, MissingData, Result};
use crate::inequality::{gini, GiniTracks};
use crate::projection::{advance_year, Forecast, YearAdvanceAgent};
use crate::scenario::Scenario;

// ─────────────────────────────────────────────────────────────────────────────
// Forecast state
// ─────────────────────────────────────────────────────────────────────────────

/// One tracked profession in one year.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessionLine {
    pub income: f64,
    pub headcount: u32,
    pub per_head: f64,
    /// Relative change of `income` against the previous year.
    pub change: f64,
}

/// Snapshot carried from one year to the next.
///
/// Seeded once from the last actual year, then replaced by
/// [`advance_year`] one year at a time. Nothing else mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastState {
    pub year: i32,
    pub gdp: f64,
    pub professions: BTreeMap<Profession, ProfessionLine>,
    pub tracked_total: f64,
    /// Every islander on record in the anchor year, carried unchanged.
    pub population: u32,
    /// `actual_gdp / tracked_total` at the anchor year; constant along a chain.
    pub scale_factor: f64,
    pub productivity: f64,
    pub policy_multiplier: f64,
    pub gini: GiniTracks,
    pub happiness: f64,
    pub notes: Vec<String>,
    pub is_actual: bool,
}

impl ForecastState {
    /// Seed a chain from the actual data of `anchor_year`.
    pub fn seed(table: &HistoricalTable, anchor_year: i32, scenario: &Scenario) -> Result<Self> {
        let gdp = table.gdp(anchor_year)?;

        let mut professions = BTreeMap::new();
        for profession in &scenario.tracked {
            let totals = table.totals(anchor_year, profession)?;
            if totals.headcount == 0 {
                return Err(ForecastError::division_by_zero(
                    anchor_year,
                    format!("{profession} headcount"),
                ));
            }
            professions.insert(
                profession.clone(),
                ProfessionLine {
                    income: totals.income,
                    headcount: totals.headcount,
                    per_head: totals.income / f64::from(totals.headcount),
                    change: 0.0,
                },
            );
        }

        let tracked_total: f64 = professions.values().map(|line| line.income).sum();
        if tracked_total == 0.0 {
            return Err(ForecastError::division_by_zero(
                anchor_year,
                "tracked income total",
            ));
        }

        let informal = &scenario.inequality.informal_professions;
        let gini = GiniTracks {
            formal: gini(&table.positive_incomes(anchor_year, IncomeScope::Formal, informal)),
            full: gini(&table.positive_incomes(anchor_year, IncomeScope::Full, informal)),
        };

        Ok(ForecastState {
            year: anchor_year,
            gdp,
            professions,
            tracked_total,
            population: table.population(anchor_year)?,
            scale_factor: gdp / tracked_total,
            productivity: 1.0,
            policy_multiplier: 1.0,
            gini,
            happiness: scenario.baseline_happiness,
            notes: vec!["actual".to_string()],
            is_actual: true,
        })
    }

    pub fn line(&self, profession: &Profession) -> Result<&ProfessionLine> {
        self.professions.get(profession).ok_or_else(|| {
            MissingData::Profession {
                year: self.year,
                profession: profession.clone(),
            }
            .into()
        })
    }

    pub fn record(&self) -> YearlyEconomicRecord {
        YearlyEconomicRecord {
            year: self.year,
            gdp: self.gdp,
            profession_income: self
                .professions
                .iter()
                .map(|(p, line)| (p.clone(), line.income))
                .collect(),
            profession_headcount: self
                .professions
                .iter()
                .map(|(p, line)| (p.clone(), line.headcount))
                .collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Forecast chain (implements krabmaga State)
// ─────────────────────────────────────────────────────────────────────────────

/// A forward chain from one anchor year, stepped by a krabmaga [`Schedule`].
///
/// Each schedule step runs [`YearAdvanceAgent`], which replaces `current`
/// with the next year. The first failure stops the chain for good.
pub struct ForecastChain {
    pub anchor: ForecastState,
    pub current: ForecastState,
    pub years: Vec<ForecastState>,
    pub failure: Option<ForecastError>,
    pub scenario: Scenario,
}

impl ForecastChain {
    pub fn new(anchor: ForecastState, scenario: Scenario) -> Self {
        ForecastChain {
            current: anchor.clone(),
            anchor,
            years: Vec::new(),
            failure: None,
            scenario,
        }
    }

    /// Advance `current` by one year unless the chain has already failed.
    pub fn advance(&mut self) {
        if self.failure.is_some() {
            return;
        }
        match advance_year(&self.current, &self.scenario) {
            Ok(next) => {
                self.years.push(next.clone());
                self.current = next;
            }
            Err(err) => {
                warn!(year = self.current.year + 1, error = %err, "forecast chain aborted");
                self.failure = Some(err);
            }
        }
    }

    /// Consume the chain into its forecast, or the error that stopped it.
    pub fn finish(self) -> Result<Forecast> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        Ok(Forecast {
            anchor: self.anchor,
            years: self.years,
            scenario: self.scenario,
        })
    }
}

impl State for ForecastChain {
    /// The chain has a single repeating agent: one year per step.
    fn init(&mut self, schedule: &mut Schedule) {
        schedule.schedule_repeating(Box::new(YearAdvanceAgent), 0.0, 0);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_state_mut(&mut self) -> &mut dyn State {
        self
    }

    fn as_state(&self) -> &dyn State {
        self
    }

    fn reset(&mut self) {
        self.current = self.anchor.clone();
        self.years.clear();
        self.failure = None;
    }

    fn before_step(&mut self, _schedule: &mut Schedule) {}

    fn after_step(&mut self, _schedule: &mut Schedule) {}

    fn update(&mut self, _step: u64) {}
}
