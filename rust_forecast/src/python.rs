use std::collections::HashMap;
use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::config::Config;
use crate::data::HistoricalTable;
use crate::error::LoadError;
use crate::history::ForecastHistory;
use crate::inequality;
use crate::state::ForecastState;

// ─────────────────────────────────────────────────────────────────────────────
// Python-visible year record
// ─────────────────────────────────────────────────────────────────────────────

/// One actual or forecast year.
///
/// All fields are read-only from Python.
#[pyclass(get_all)]
#[derive(Clone, Debug)]
pub struct PyYearRecord {
    pub year: i32,
    pub gdp: f64,
    pub tracked_total: f64,
    pub population: u32,
    pub policy_multiplier: f64,
    pub gini_formal: f64,
    pub gini_full: f64,
    pub happiness: f64,
    pub is_actual: bool,
    pub notes: Vec<String>,
}

impl From<&ForecastState> for PyYearRecord {
    fn from(state: &ForecastState) -> Self {
        PyYearRecord {
            year: state.year,
            gdp: state.gdp,
            tracked_total: state.tracked_total,
            population: state.population,
            policy_multiplier: state.policy_multiplier,
            gini_formal: state.gini.formal,
            gini_full: state.gini.full,
            happiness: state.happiness,
            is_actual: state.is_actual,
            notes: state.notes.clone(),
        }
    }
}

#[pymethods]
impl PyYearRecord {
    fn __repr__(&self) -> String {
        format!(
            "PyYearRecord(year={}, gdp={:.2}, gini_formal={:.4}, happiness={:.1})",
            self.year, self.gdp, self.gini_formal, self.happiness
        )
    }

    /// Numeric fields as a plain dict for pandas / polars.
    fn to_dict(&self) -> HashMap<String, f64> {
        let mut m = HashMap::new();
        m.insert("year".to_string(), f64::from(self.year));
        m.insert("gdp".to_string(), self.gdp);
        m.insert("tracked_total".to_string(), self.tracked_total);
        m.insert("population".to_string(), f64::from(self.population));
        m.insert("policy_multiplier".to_string(), self.policy_multiplier);
        m.insert("gini_formal".to_string(), self.gini_formal);
        m.insert("gini_full".to_string(), self.gini_full);
        m.insert("happiness".to_string(), self.happiness);
        m
    }
}

fn load_error(err: LoadError) -> PyErr {
    match err {
        LoadError::Io { .. } => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Calibrate on the given files and forecast from their last actual year.
///
/// Args:
///     gdp_path: CSV with ``year,gdp`` columns.
///     income_path: CSV with ``year,profession,income`` columns.
///     config_json: Optional JSON overriding the default configuration.
///
/// Returns:
///     A list of :class:`PyYearRecord`, the anchor year first.
#[pyfunction]
#[pyo3(signature = (gdp_path, income_path, config_json=None))]
fn run_forecast(
    gdp_path: PathBuf,
    income_path: PathBuf,
    config_json: Option<String>,
) -> PyResult<Vec<PyYearRecord>> {
    let config = match config_json {
        Some(text) => Config::from_json_str(&text).map_err(load_error)?,
        None => Config::default(),
    };
    let table = HistoricalTable::load(&gdp_path, &income_path).map_err(load_error)?;

    let mut history = ForecastHistory::new();
    let forecast = history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    Ok(std::iter::once(&forecast.anchor)
        .chain(&forecast.years)
        .map(PyYearRecord::from)
        .collect())
}

/// Gini coefficient of strictly positive incomes; ``0.0`` for an empty list.
#[pyfunction]
#[pyo3(name = "gini")]
fn py_gini(incomes: Vec<f64>) -> PyResult<f64> {
    if incomes.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(PyValueError::new_err(
            "gini() expects strictly positive, finite incomes",
        ));
    }
    Ok(inequality::gini(&incomes))
}

// ─────────────────────────────────────────────────────────────────────────────
// Module definition
// ─────────────────────────────────────────────────────────────────────────────

/// Hagelslag Island GDP forecaster.
#[pymodule]
fn island_forecast(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyYearRecord>()?;
    m.add_function(wrap_pyfunction!(run_forecast, m)?)?;
    m.add_function(wrap_pyfunction!(py_gini, m)?)?;
    Ok(())
}
