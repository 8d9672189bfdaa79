//! Deriving model constants from the historical table.
//!
//! Parameters are recalibrated, not fitted: every run re-derives them from the
//! years named in a [`CalibrationPlan`], so when new actuals falsify an
//! estimate the fix is an edit to the plan followed by a fresh chain, never a
//! literal patched into the engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::{HistoricalTable, Profession};
use crate::effects::{CyclicalEffect, PhaseLevels, ProfessionShock, YearSchedule};
use crate::error::{ForecastError, MissingData, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Primitive estimators
// ─────────────────────────────────────────────────────────────────────────────

/// Mean per-head income of `profession` over `years`.
pub fn cyclical_average(
    table: &HistoricalTable,
    profession: &Profession,
    years: &BTreeSet<i32>,
) -> Result<f64> {
    if years.is_empty() {
        return Err(MissingData::EmptyYearSet {
            profession: profession.clone(),
        }
        .into());
    }

    let mut sum = 0.0;
    for &year in years {
        let totals = table.totals(year, profession)?;
        if totals.headcount == 0 {
            return Err(ForecastError::division_by_zero(
                year,
                format!("{profession} headcount"),
            ));
        }
        sum += totals.income / f64::from(totals.headcount);
    }
    Ok(sum / years.len() as f64)
}

/// Solve `end = start × (1 + g)^num_years` for `g`.
pub fn annualized_growth(start_value: f64, end_value: f64, num_years: u32) -> Result<f64> {
    if start_value <= 0.0 {
        return Err(ForecastError::domain(
            "annualized growth",
            format!("start value must be positive, got {start_value}"),
        ));
    }
    if end_value < 0.0 {
        return Err(ForecastError::domain(
            "annualized growth",
            format!("end value must not be negative, got {end_value}"),
        ));
    }
    if num_years == 0 {
        return Err(ForecastError::domain(
            "annualized growth",
            "growth window spans zero years",
        ));
    }
    Ok((end_value / start_value).powf(1.0 / f64::from(num_years)) - 1.0)
}

/// Fractional income shock `(post − pre) / pre` of a one-off event.
///
/// This is a point estimate from a single occurrence and carries all of that
/// occurrence's noise. No smoothing or interval is attempted; when a later
/// occurrence disagrees, recalibrate against it.
pub fn event_damage_ratio(pre_value: f64, post_value: f64) -> Result<f64> {
    if pre_value == 0.0 {
        return Err(ForecastError::domain(
            "event damage ratio",
            "pre-event value is zero",
        ));
    }
    Ok((post_value - pre_value) / pre_value)
}

/// Simple (non-compounded) annual population growth between two years.
pub fn population_growth_rate(
    table: &HistoricalTable,
    from_year: i32,
    to_year: i32,
) -> Result<f64> {
    if to_year <= from_year {
        return Err(ForecastError::domain(
            "population growth",
            format!("window {from_year}..{to_year} is empty"),
        ));
    }
    let start = table.population(from_year)?;
    let end = table.population(to_year)?;
    if start == 0 {
        return Err(ForecastError::division_by_zero(from_year, "population"));
    }
    let start = f64::from(start);
    Ok((f64::from(end) - start) / start / f64::from((to_year - from_year) as u32))
}

// ─────────────────────────────────────────────────────────────────────────────
// Calibration plan
// ─────────────────────────────────────────────────────────────────────────────

/// Which years feed a cycle's peak and trough per-head levels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CyclePlan {
    pub name: String,
    pub profession: Profession,
    pub period: u32,
    pub phase_offset: u32,
    pub lag: u32,
    pub peak_years: BTreeSet<i32>,
    pub trough_years: BTreeSet<i32>,
}

/// Growth trend of a profession's total income over a window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthPlan {
    pub profession: Profession,
    pub start_year: i32,
    pub end_year: i32,
}

/// A one-off event observed between `pre_year` and `post_year`, replayed in
/// `apply_year`.
///
/// `recovery` lists the income level of each following year as a fraction of
/// the pre-event level (`[0.7, 1.0]`: 70 % the year after, fully back the year
/// after that).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventPlan {
    pub name: String,
    pub profession: Profession,
    pub pre_year: i32,
    pub post_year: i32,
    pub apply_year: i32,
    #[serde(default)]
    pub recovery: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationPlan {
    pub cycles: Vec<CyclePlan>,
    pub growth: Vec<GrowthPlan>,
    pub events: Vec<EventPlan>,
    /// Trends taken as given rather than measured.
    pub fixed_growth: BTreeMap<Profession, f64>,
    /// `(from, to)` window for [`population_growth_rate`].
    pub population_window: Option<(i32, i32)>,
}

/// Output of [`calibrate`], merged into a scenario with
/// [`Scenario::with_parameters`](crate::Scenario::with_parameters).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub growth: BTreeMap<Profession, f64>,
    pub cycles: Vec<CyclicalEffect>,
    pub shocks: Vec<ProfessionShock>,
    pub population_growth: Option<f64>,
}

/// Derive every parameter named in `plan` from `table`.
///
/// Any missing year or profession aborts the whole calibration.
pub fn calibrate(table: &HistoricalTable, plan: &CalibrationPlan) -> Result<ParameterSet> {
    let mut parameters = ParameterSet {
        growth: plan.fixed_growth.clone(),
        ..ParameterSet::default()
    };

    for cycle in &plan.cycles {
        let levels = PhaseLevels {
            peak_per_head: cyclical_average(table, &cycle.profession, &cycle.peak_years)?,
            trough_per_head: cyclical_average(table, &cycle.profession, &cycle.trough_years)?,
        };
        let magnitude = event_damage_ratio(levels.trough_per_head, levels.peak_per_head)?;
        info!(
            cycle = %cycle.name,
            peak = levels.peak_per_head,
            trough = levels.trough_per_head,
            "calibrated cycle levels"
        );
        parameters.cycles.push(
            CyclicalEffect::new(
                cycle.name.clone(),
                cycle.profession.clone(),
                cycle.period,
                cycle.phase_offset,
                cycle.lag,
                magnitude,
            )
            .with_levels(levels),
        );
    }

    for growth in &plan.growth {
        if growth.end_year <= growth.start_year {
            return Err(ForecastError::domain(
                "annualized growth",
                format!(
                    "window {}..{} for {} is empty",
                    growth.start_year, growth.end_year, growth.profession
                ),
            ));
        }
        let start = table.totals(growth.start_year, &growth.profession)?.income;
        let end = table.totals(growth.end_year, &growth.profession)?.income;
        let rate = annualized_growth(start, end, (growth.end_year - growth.start_year) as u32)?;
        info!(profession = %growth.profession, rate, "calibrated growth trend");
        parameters.growth.insert(growth.profession.clone(), rate);
    }

    for event in &plan.events {
        let pre = table.totals(event.pre_year, &event.profession)?.income;
        let post = table.totals(event.post_year, &event.profession)?.income;
        let damage = event_damage_ratio(pre, post)?;
        info!(event = %event.name, damage, "calibrated event damage");
        parameters.shocks.push(ProfessionShock::new(
            event.name.clone(),
            event.profession.clone(),
            event_schedule(event, damage)?,
        ));
    }

    if let Some((from, to)) = plan.population_window {
        parameters.population_growth = Some(population_growth_rate(table, from, to)?);
    }

    Ok(parameters)
}

/// Turn a damage ratio and a recovery path into chained year-on-year deltas.
fn event_schedule(event: &EventPlan, damage: f64) -> Result<YearSchedule> {
    let mut schedule = YearSchedule::new();
    schedule.set(event.apply_year, damage);

    let mut level = 1.0 + damage;
    for (offset, &target) in (1..).zip(&event.recovery) {
        if level == 0.0 {
            return Err(ForecastError::domain(
                "event recovery",
                format!("'{}' wipes out income, recovery is undefined", event.name),
            ));
        }
        schedule.set(event.apply_year + offset, target / level - 1.0);
        level = target;
    }
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProfessionTotals;

    fn table() -> HistoricalTable {
        let mut t = HistoricalTable::new();
        let rows = [
            (91, 4600.0, 2700.0, 5371.0),
            (92, 2700.0, 2720.0, 5400.0),
            (93, 2680.0, 2760.0, 5420.0),
            (94, 4700.0, 2800.0, 5450.0),
            (100, 4650.0, 2000.0, 5671.0),
        ];
        for (year, fisher, farmer, craftsman) in rows {
            t.insert_gdp(year, fisher + farmer + craftsman);
            t.insert_totals(year, Profession::Fisher, ProfessionTotals::new(fisher * 2.0, 2));
            t.insert_totals(year, Profession::Farmer, ProfessionTotals::new(farmer, 1));
            t.insert_totals(year, Profession::Craftsman, ProfessionTotals::new(craftsman, 1));
        }
        t
    }

    #[test]
    fn cyclical_average_is_per_head() {
        let years = BTreeSet::from([91, 94]);
        let avg = cyclical_average(&table(), &Profession::Fisher, &years).unwrap();
        assert!((avg - 4650.0).abs() < 1e-9);
    }

    #[test]
    fn cyclical_average_rejects_empty_and_unknown_years() {
        let t = table();
        assert!(matches!(
            cyclical_average(&t, &Profession::Fisher, &BTreeSet::new()),
            Err(ForecastError::MissingData(MissingData::EmptyYearSet { .. }))
        ));
        assert!(matches!(
            cyclical_average(&t, &Profession::Fisher, &BTreeSet::from([91, 95])),
            Err(ForecastError::MissingData(MissingData::Year(95)))
        ));
    }

    #[test]
    fn annualized_growth_inverts_compounding() {
        let g = annualized_growth(100.0, 121.0, 2).unwrap();
        assert!((g - 0.1).abs() < 1e-12);
        assert!((100.0 * (1.0 + g).powi(2) - 121.0).abs() < 1e-9);
    }

    #[test]
    fn annualized_growth_needs_a_positive_base() {
        for start in [0.0, -5.0] {
            assert!(matches!(
                annualized_growth(start, 10.0, 3),
                Err(ForecastError::Domain { .. })
            ));
        }
    }

    #[test]
    fn damage_ratio_is_relative_change() {
        assert!((event_damage_ratio(2000.0, 360.0).unwrap() + 0.82).abs() < 1e-12);
        assert!(event_damage_ratio(0.0, 10.0).is_err());
    }

    #[test]
    fn calibrate_builds_cycles_trends_and_events() {
        let plan = CalibrationPlan {
            cycles: vec![CyclePlan {
                name: "sturgeon".into(),
                profession: Profession::Fisher,
                period: 3,
                phase_offset: 0,
                lag: 1,
                peak_years: BTreeSet::from([91, 94]),
                trough_years: BTreeSet::from([92, 93]),
            }],
            growth: vec![GrowthPlan {
                profession: Profession::Craftsman,
                start_year: 91,
                end_year: 100,
            }],
            events: vec![EventPlan {
                name: "locusts".into(),
                profession: Profession::Farmer,
                pre_year: 94,
                post_year: 100,
                apply_year: 101,
                recovery: vec![0.7, 1.0],
            }],
            fixed_growth: BTreeMap::from([(Profession::CivilServant, -0.02)]),
            population_window: Some((91, 100)),
        };
        let params = calibrate(&table(), &plan).unwrap();

        let levels = params.cycles[0].levels.unwrap();
        assert!((levels.peak_per_head - 4650.0).abs() < 1e-9);
        assert!((levels.trough_per_head - 2690.0).abs() < 1e-9);

        let craftsman = params.growth[&Profession::Craftsman];
        assert!((5371.0 * (1.0 + craftsman).powi(9) - 5671.0).abs() < 1e-6);
        assert_eq!(params.growth[&Profession::CivilServant], -0.02);

        let locusts = &params.shocks[0].magnitudes;
        let damage = (2000.0 - 2800.0) / 2800.0;
        assert!((locusts.at(101) - damage).abs() < 1e-12);
        // chained recovery lands on 70 % then 100 % of the pre-event level
        let after_102 = (1.0 + damage) * (1.0 + locusts.at(102));
        assert!((after_102 - 0.7).abs() < 1e-12);
        assert!((after_102 * (1.0 + locusts.at(103)) - 1.0).abs() < 1e-12);

        assert_eq!(params.population_growth, Some(0.0));
    }

    #[test]
    fn calibrate_aborts_on_missing_profession() {
        let plan = CalibrationPlan {
            growth: vec![GrowthPlan {
                profession: Profession::ServiceProvider,
                start_year: 91,
                end_year: 100,
            }],
            ..CalibrationPlan::default()
        };
        assert!(matches!(
            calibrate(&table(), &plan),
            Err(ForecastError::MissingData(MissingData::Profession { year: 91, .. }))
        ));
    }
}
