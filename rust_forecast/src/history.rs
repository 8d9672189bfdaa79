use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calibration::{calibrate, CalibrationPlan};
use crate::data::HistoricalTable;
use crate::error::{ForecastError, Result};
use crate::projection::{project, Forecast};
use crate::scenario::Scenario;
use crate::state::ForecastState;

/// Forecast against what actually happened, for one year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub year: i32,
    pub forecast: f64,
    pub actual: f64,
    pub error: f64,
    /// `error / actual × 100`; `None` when the actual is zero.
    pub error_pct: Option<f64>,
}

/// Compare every year of `forecast` that now has an actual GDP in `table`.
pub fn compare(forecast: &Forecast, table: &HistoricalTable) -> Vec<Comparison> {
    forecast
        .years
        .iter()
        .filter_map(|state| match table.gdp(state.year) {
            Ok(actual) => {
                let error = state.gdp - actual;
                Some(Comparison {
                    year: state.year,
                    forecast: state.gdp,
                    actual,
                    error,
                    error_pct: (actual != 0.0).then(|| error / actual * 100.0),
                })
            }
            Err(_) => {
                debug!(year = state.year, "no actual yet for forecast year");
                None
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Back-test against historical analogues
// ─────────────────────────────────────────────────────────────────────────────

/// A past year pair whose GDP change resembles a forecast event, e.g. the
/// locust year 79 → 80 for a locust forecast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Analogue {
    pub label: String,
    pub from_year: i32,
    pub to_year: i32,
}

impl Analogue {
    pub fn new(label: impl Into<String>, from_year: i32, to_year: i32) -> Self {
        Analogue {
            label: label.into(),
            from_year,
            to_year,
        }
    }
}

/// GDP change in percent between two years.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GdpChange {
    pub label: String,
    pub from_year: i32,
    pub to_year: i32,
    pub change_pct: f64,
}

/// Historical analogue changes next to the forecast's first-year change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub historical: Vec<GdpChange>,
    pub forecast: Option<GdpChange>,
}

fn pct_change(from: f64, to: f64) -> Option<f64> {
    (from != 0.0).then(|| (to - from) / from * 100.0)
}

/// Set the actual GDP change of every analogue in `table` against the first
/// forecast year. Analogues with a missing or zero-GDP year are skipped.
pub fn validate(
    table: &HistoricalTable,
    analogues: &[Analogue],
    forecast: &Forecast,
) -> Validation {
    let historical = analogues
        .iter()
        .filter_map(|analogue| {
            let change = match (table.gdp(analogue.from_year), table.gdp(analogue.to_year)) {
                (Ok(from), Ok(to)) => pct_change(from, to),
                _ => None,
            };
            if change.is_none() {
                debug!(label = %analogue.label, "analogue years not usable, skipped");
            }
            change.map(|change_pct| GdpChange {
                label: analogue.label.clone(),
                from_year: analogue.from_year,
                to_year: analogue.to_year,
                change_pct,
            })
        })
        .collect();

    let anchor = &forecast.anchor;
    let forecast = forecast.years.first().and_then(|first| {
        pct_change(anchor.gdp, first.gdp).map(|change_pct| GdpChange {
            label: "forecast".to_string(),
            from_year: anchor.year,
            to_year: first.year,
            change_pct,
        })
    });

    Validation {
        historical,
        forecast,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Forecast history
// ─────────────────────────────────────────────────────────────────────────────

/// Every chain produced so far, oldest first.
///
/// A rebase never discards earlier chains: they stay available to be scored
/// against the actuals that superseded them.
#[derive(Clone, Debug, Default)]
pub struct ForecastHistory {
    chains: Vec<Forecast>,
}

impl ForecastHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, forecast: Forecast) {
        self.chains.push(forecast);
    }

    pub fn latest(&self) -> Option<&Forecast> {
        self.chains.last()
    }

    pub fn chains(&self) -> &[Forecast] {
        &self.chains
    }

    /// Chains that a newer chain has replaced.
    pub fn superseded(&self) -> &[Forecast] {
        match self.chains.split_last() {
            Some((_, older)) => older,
            None => &[],
        }
    }

    /// Recalibrate on `table` and start a fresh chain from its newest actual
    /// year.
    pub fn rebase(
        &mut self,
        table: &HistoricalTable,
        plan: &CalibrationPlan,
        scenario: &Scenario,
        horizon: u32,
    ) -> Result<&Forecast> {
        let anchor_year = table
            .last_actual_year()
            .ok_or_else(|| ForecastError::domain("rebase", "no actual GDP has been loaded"))?;

        let parameters = calibrate(table, plan)?;
        let scenario = scenario.clone().with_parameters(parameters);
        let anchor = ForecastState::seed(table, anchor_year, &scenario)?;
        let forecast = project(anchor, &scenario, horizon)?;

        info!(
            anchor_year,
            horizon,
            chains = self.chains.len() + 1,
            "forecast chain rebased"
        );
        self.push(forecast);
        self.chains
            .last()
            .ok_or_else(|| ForecastError::domain("rebase", "chain was not recorded"))
    }

    /// Score every superseded chain against `table`.
    pub fn scorecard(&self, table: &HistoricalTable) -> Vec<(i32, Vec<Comparison>)> {
        self.superseded()
            .iter()
            .map(|forecast| (forecast.anchor_year(), compare(forecast, table)))
            .collect()
    }
}
