/*!
# `island_forecast` — Hagelslag Island GDP forecaster

Year-by-year projection of the island economy from historical per-profession
income records, with Gini analysis of the income distribution.

Data flows strictly forward:

1. [`HistoricalTable`]: GDP per year, per-profession totals, individual incomes.
2. [`calibrate`]: derives cycle levels, growth trends and event damage from
   the years named in a [`CalibrationPlan`].
3. [`project`]: seeds a [`ForecastState`] from the last actual year and
   advances it one year per step of a krABMaga schedule.
4. [`Report`]: formats the result.

Regime changes (a falsified cycle phase, a re-estimated disaster) are always
explicit: edit the plan or scenario, then [`ForecastHistory::rebase`] a fresh
chain. Superseded chains are kept for scoring.

## Quick start

```no_run
use island_forecast::{Config, ForecastHistory, HistoricalTable};

let config = Config::default();
let table = HistoricalTable::load(&config.gdp_path, &config.income_path)?;
let mut history = ForecastHistory::new();
let forecast = history.rebase(&table, &config.calibration, &config.scenario, config.horizon)?;
for (year, gdp) in forecast.gdp_series() {
    println!("{year}: {gdp:.2}");
}
# Ok::<(), Box<dyn std::error::Error>>(())
```

With the `python` feature the same pipeline is exposed as a Python extension
module via [PyO3](https://pyo3.rs).
*/

mod calibration;
mod config;
mod data;
mod effects;
mod error;
mod history;
mod inequality;
mod loader;
mod projection;
mod report;
mod scenario;
mod state;

#[cfg(feature = "python")]
mod python;

pub use calibration::{
    annualized_growth, calibrate, cyclical_average, event_damage_ratio, population_growth_rate,
    CalibrationPlan, CyclePlan, EventPlan, GrowthPlan, ParameterSet,
};
pub use config::Config;
pub use data::{HistoricalTable, IncomeScope, Profession, ProfessionTotals, YearlyEconomicRecord};
pub use effects::{
    combined_multiplier, CyclePhase, CyclicalEffect, GdpEffectMode, PhaseLevels, PolicyEffect,
    PolicyKind, ProfessionShock, YearSchedule,
};
pub use error::{ForecastError, LoadError, MissingData};
pub use history::{compare, validate, Analogue, Comparison, ForecastHistory, GdpChange, Validation};
pub use inequality::{gini, percentile, project_gini, GiniTracks, IncomeSummary};
pub use projection::{advance_year, project, Forecast, YearAdvanceAgent};
pub use report::Report;
pub use scenario::{AggregationMode, InequalitySettings, Scenario};
pub use state::{ForecastChain, ForecastState, ProfessionLine};
