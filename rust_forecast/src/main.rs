//! Command-line report for the Hagelslag Island forecast.
//!
//! Usage: `island-forecast [config.json]`. Without an argument the built-in
//! year-100 configuration is used and the input files are read from the
//! working directory.

use std::path::Path;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use island_forecast::{
    compare, validate, Config, ForecastHistory, HistoricalTable, IncomeScope, IncomeSummary,
    Report,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load(Path::new(&path))
            .with_context(|| format!("reading configuration {}", Path::new(&path).display()))?,
        None => Config::default(),
    };
    info!(
        gdp_path = %config.gdp_path.display(),
        income_path = %config.income_path.display(),
        horizon = config.horizon,
        "configuration loaded"
    );

    let table = HistoricalTable::load(&config.gdp_path, &config.income_path)
        .context("loading historical data")?;

    let mut history = ForecastHistory::new();
    let forecast = history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .context("building forecast chain")?;

    let comparisons = match &config.actuals_path {
        Some(path) => {
            let actuals = HistoricalTable::load_gdp(path).context("loading later actuals")?;
            compare(forecast, &actuals)
        }
        None => Vec::new(),
    };

    let validation = validate(&table, &config.validation, forecast);

    let anchor_year = forecast.anchor_year();
    let distribution = IncomeSummary::from_incomes(&table.positive_incomes(
        anchor_year,
        IncomeScope::Formal,
        &forecast.scenario.inequality.informal_professions,
    ));

    let last_year = forecast.years.last().map_or(anchor_year, |state| state.year);
    let title = format!(
        "GDP FORECAST FOR HAGELSLAG ISLAND (Years {}-{})",
        anchor_year + 1,
        last_year
    );
    let report = Report {
        title: &title,
        forecast,
        comparisons: &comparisons,
        distribution: Some(&distribution),
        validation: Some(&validation),
    };
    println!("{report}");

    Ok(())
}
