use std::collections::BTreeMap;
use std::fmt;

use krabmaga::engine::{agent::Agent, schedule::Schedule, state::State};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ForecastError, MissingData, Result};
use crate::scenario::{AggregationMode, Scenario};
use crate::state::{ForecastChain, ForecastState, ProfessionLine};

/// Upper bound of the happiness index; the lower bound is zero.
const HAPPINESS_MAX: f64 = 100.0;

/// Advance the economy from `prior` into the following year.
///
/// 1. Each tracked profession's income becomes
///    `base × (1 + cyclical) × (1 + event)`, where `base` is either the cycle's
///    per-head level times headcount or `prior_income × (1 + growth)`.
/// 2. Incomes are summed into the tracked total.
/// 3. The total is mapped to GDP through the chain's scale factor (or, in
///    carry-forward mode, added to last year's GDP as a delta).
/// 4. The result is multiplied by the productivity factor and the combined
///    policy multiplier; absolute policy amounts are added last.
///
/// A tracked profession with zero headcount or zero prior income fails the
/// whole year rather than being skipped.
pub fn advance_year(prior: &ForecastState, scenario: &Scenario) -> Result<ForecastState> {
    let year = prior.year + 1;

    let mut professions = BTreeMap::new();
    for profession in &scenario.tracked {
        let last = prior.professions.get(profession).ok_or_else(|| {
            ForecastError::from(MissingData::Profession {
                year: prior.year,
                profession: profession.clone(),
            })
        })?;
        if last.headcount == 0 {
            return Err(ForecastError::division_by_zero(
                year,
                format!("{profession} headcount"),
            ));
        }
        if last.income == 0.0 {
            return Err(ForecastError::division_by_zero(
                year,
                format!("{profession} prior income"),
            ));
        }

        let heads = f64::from(last.headcount);
        let base = match scenario.cycle_level(profession, year)? {
            Some(per_head) => per_head * heads,
            None => last.income * (1.0 + scenario.growth_rate(profession)),
        };
        let income = base
            * (1.0 + scenario.cyclical_adjustment(profession, year)?)
            * (1.0 + scenario.event_adjustment(profession, year));

        professions.insert(
            profession.clone(),
            ProfessionLine {
                income,
                headcount: last.headcount,
                per_head: income / heads,
                change: income / last.income - 1.0,
            },
        );
    }

    let tracked_total: f64 = professions.values().map(|line| line.income).sum();
    let carried = match scenario.aggregation {
        AggregationMode::Scaled => tracked_total * prior.scale_factor,
        AggregationMode::CarryForward => prior.gdp + (tracked_total - prior.tracked_total),
    };
    let productivity = scenario.productivity(year);
    let policy_multiplier = scenario.policy_multiplier(year);
    let gdp = carried * productivity * policy_multiplier + scenario.absolute_policy_gdp(year);

    debug!(
        year,
        tracked_total,
        productivity,
        policy_multiplier,
        gdp,
        "advanced forecast year"
    );

    Ok(ForecastState {
        year,
        gdp,
        professions,
        tracked_total,
        population: prior.population,
        scale_factor: prior.scale_factor,
        productivity,
        policy_multiplier,
        gini: prior.gini.advance(scenario, year),
        happiness: (prior.happiness + scenario.happiness_delta(year)).clamp(0.0, HAPPINESS_MAX),
        notes: scenario.notes_for(year)?,
        is_actual: false,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Forecast output
// ─────────────────────────────────────────────────────────────────────────────

/// A completed chain: its anchor, every projected year, and the scenario that
/// produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub anchor: ForecastState,
    pub years: Vec<ForecastState>,
    pub scenario: Scenario,
}

impl Forecast {
    pub fn anchor_year(&self) -> i32 {
        self.anchor.year
    }

    pub fn year(&self, year: i32) -> Option<&ForecastState> {
        self.years.iter().find(|state| state.year == year)
    }

    pub fn gdp_series(&self) -> Vec<(i32, f64)> {
        self.years.iter().map(|state| (state.year, state.gdp)).collect()
    }
}

/// Run a chain of `horizon` years from `anchor` on a krabmaga schedule.
pub fn project(anchor: ForecastState, scenario: &Scenario, horizon: u32) -> Result<Forecast> {
    let mut chain = ForecastChain::new(anchor, scenario.clone());
    let mut schedule = Schedule::new();
    chain.init(&mut schedule);

    for _ in 0..horizon {
        schedule.step(&mut chain);
        if chain.failure.is_some() {
            break;
        }
    }

    chain.finish()
}

// ─────────────────────────────────────────────────────────────────────────────
// krabmaga Agent proxy
// ─────────────────────────────────────────────────────────────────────────────

/// Proxy agent that advances its [`ForecastChain`] by one year per step.
#[derive(Clone)]
pub struct YearAdvanceAgent;

impl fmt::Display for YearAdvanceAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YearAdvanceAgent")
    }
}

impl Agent for YearAdvanceAgent {
    fn step(&mut self, state: &mut dyn State) {
        match state.as_any_mut().downcast_mut::<ForecastChain>() {
            Some(chain) => chain.advance(),
            None => error!("YearAdvanceAgent scheduled on a state that is not a ForecastChain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HistoricalTable, Profession, ProfessionTotals};
    use crate::effects::{CyclicalEffect, PhaseLevels, PolicyEffect, ProfessionShock};

    fn table() -> HistoricalTable {
        let mut t = HistoricalTable::new();
        t.insert_gdp(100, 2000.0);
        t.insert_totals(100, Profession::Fisher, ProfessionTotals::new(1000.0, 10));
        t.insert_totals(100, Profession::Farmer, ProfessionTotals::new(500.0, 5));
        t
    }

    fn scenario() -> Scenario {
        Scenario {
            tracked: vec![Profession::Fisher, Profession::Farmer],
            cycles: vec![CyclicalEffect::new("sturgeon", Profession::Fisher, 3, 0, 1, 0.0)
                .with_levels(PhaseLevels {
                    peak_per_head: 120.0,
                    trough_per_head: 80.0,
                })],
            shocks: vec![ProfessionShock::new(
                "locust damage",
                Profession::Farmer,
                [(101, -0.5)].into_iter().collect(),
            )],
            ..Scenario::default()
        }
    }

    fn anchor(s: &Scenario) -> ForecastState {
        ForecastState::seed(&table(), 100, s).unwrap()
    }

    #[test]
    fn low_phase_fishers_and_locust_damaged_farmers() {
        let s = scenario();
        let next = advance_year(&anchor(&s), &s).unwrap();

        assert_eq!(next.year, 101);
        assert!((next.line(&Profession::Fisher).unwrap().income - 800.0).abs() < 1e-9);
        assert!((next.line(&Profession::Farmer).unwrap().income - 250.0).abs() < 1e-9);
        assert!((next.tracked_total - 1050.0).abs() < 1e-9);
        assert!((next.gdp - 1400.0).abs() < 1e-9);
        assert!((next.line(&Profession::Farmer).unwrap().change + 0.5).abs() < 1e-12);
    }

    #[test]
    fn matching_anchor_means_unit_scale_factor() {
        let mut t = table();
        t.insert_gdp(100, 1500.0);
        let s = scenario();
        let seed = ForecastState::seed(&t, 100, &s).unwrap();
        assert_eq!(seed.scale_factor, 1.0);

        let next = advance_year(&seed, &s).unwrap();
        assert_eq!(next.gdp, next.tracked_total);
    }

    #[test]
    fn growth_applies_where_no_cycle_anchors() {
        let mut s = scenario();
        s.shocks.clear();
        s.base_growth.insert(Profession::Farmer, 0.10);
        let next = advance_year(&anchor(&s), &s).unwrap();
        assert!((next.line(&Profession::Farmer).unwrap().income - 550.0).abs() < 1e-9);
    }

    #[test]
    fn policies_and_productivity_multiply_gdp() {
        let mut s = scenario();
        s.population_productivity.insert(101, 1.002);
        s.policies = vec![
            PolicyEffect::relative("harbour", 101, 101, 0.10),
            PolicyEffect::relative("tax change", 101, 101, -0.05),
            PolicyEffect::relative("training", 101, 101, 0.08),
            PolicyEffect::absolute("relief grant", 101, 101, 25.0),
        ];
        let next = advance_year(&anchor(&s), &s).unwrap();
        let multiplier = 1.10 * 0.95 * 1.08;

        assert!((next.policy_multiplier - multiplier).abs() < 1e-12);
        assert!((next.gdp - (1400.0 * 1.002 * multiplier + 25.0)).abs() < 1e-6);
    }

    #[test]
    fn carry_forward_adds_profession_deltas_to_last_gdp() {
        let mut s = scenario();
        s.aggregation = AggregationMode::CarryForward;
        s.population_productivity.insert(101, 1.001);
        let next = advance_year(&anchor(&s), &s).unwrap();
        assert!((next.gdp - (2000.0 - 450.0) * 1.001).abs() < 1e-9);
    }

    #[test]
    fn zero_prior_income_fails_the_year() {
        let s = scenario();
        let mut seed = anchor(&s);
        if let Some(line) = seed.professions.get_mut(&Profession::Farmer) {
            line.income = 0.0;
        }
        assert!(matches!(
            advance_year(&seed, &s),
            Err(ForecastError::DivisionByZero { year: 101, .. })
        ));
    }

    #[test]
    fn happiness_follows_policy_points_within_bounds() {
        let mut s = scenario();
        s.baseline_happiness = 98.0;
        s.policies = vec![PolicyEffect::relative("festival", 101, 105, 0.0).with_happiness(1.5)];
        let forecast = project(anchor(&s), &s, 3).unwrap();
        assert_eq!(forecast.years[0].happiness, 99.5);
        assert_eq!(forecast.years[2].happiness, 100.0);
    }

    #[test]
    fn schedule_runs_one_year_per_step() {
        let s = scenario();
        let forecast = project(anchor(&s), &s, 5).unwrap();
        let years: Vec<i32> = forecast.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![101, 102, 103, 104, 105]);
        assert!(forecast.years[2].notes.contains(&"sturgeon peak".to_string()));
        let fishers = forecast.year(103).unwrap().line(&Profession::Fisher).unwrap();
        assert!((fishers.income - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn failing_year_aborts_the_chain() {
        let mut s = scenario();
        s.cycles[0].period = 0;
        assert!(matches!(
            project(anchor(&s), &s, 5),
            Err(ForecastError::Domain { .. })
        ));
    }
}
