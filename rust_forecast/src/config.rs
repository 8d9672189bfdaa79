use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationPlan, CyclePlan, EventPlan, GrowthPlan};
use crate::data::Profession;
use crate::effects::ProfessionShock;
use crate::error::LoadError;
use crate::history::Analogue;
use crate::scenario::Scenario;

/// Configuration for one forecasting run.
///
/// Default values reproduce the year-100 Hagelslag Island revision: five
/// forecast years, the 3-year sturgeon cycle, the 91–100 profession trends,
/// the locust event of year 79 replayed in 101, and the weather and
/// workforce outlook for 101–105. The validation analogues are the past
/// locust years and craftsmen strikes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gdp_path: PathBuf,
    pub income_path: PathBuf,
    /// GDP table (`year,gdp`) with actuals published after the anchor year,
    /// used only for the forecast-vs-actual comparison.
    pub actuals_path: Option<PathBuf>,
    pub horizon: u32,
    pub calibration: CalibrationPlan,
    pub scenario: Scenario,
    /// Historical year pairs set against the first forecast year.
    pub validation: Vec<Analogue>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gdp_path: PathBuf::from("gdp_island"),
            income_path: PathBuf::from("integrated_population_data_year100.csv"),
            actuals_path: None,
            horizon: 5,

            calibration: CalibrationPlan {
                cycles: vec![CyclePlan {
                    name: "sturgeon surge".to_string(),
                    profession: Profession::Fisher,
                    period: 3,
                    phase_offset: 0,
                    lag: 1,
                    peak_years: BTreeSet::from([91, 94, 97, 100]),
                    trough_years: BTreeSet::from([92, 93, 95, 96, 98, 99]),
                }],
                growth: vec![
                    GrowthPlan {
                        profession: Profession::Craftsman,
                        start_year: 91,
                        end_year: 100,
                    },
                    GrowthPlan {
                        profession: Profession::ServiceProvider,
                        start_year: 91,
                        end_year: 100,
                    },
                ],
                events: vec![EventPlan {
                    name: "locust infestation".to_string(),
                    profession: Profession::Farmer,
                    pre_year: 79,
                    post_year: 80,
                    apply_year: 101,
                    recovery: vec![0.7, 1.0],
                }],
                fixed_growth: BTreeMap::from([(Profession::CivilServant, -0.02)]),
                population_window: Some((95, 100)),
            },

            scenario: Scenario {
                shocks: vec![
                    ProfessionShock::new(
                        "weather",
                        Profession::Farmer,
                        [(102, -0.03), (103, 0.02), (105, -0.01)].into_iter().collect(),
                    ),
                    ProfessionShock::new(
                        "flood risk",
                        Profession::Fisher,
                        [(105, -0.01)].into_iter().collect(),
                    ),
                ],
                population_productivity: BTreeMap::from([
                    (101, 1.001),
                    (102, 1.002),
                    (103, 1.003),
                    (104, 1.002),
                    (105, 1.002),
                ]),
                ..Scenario::default()
            },

            validation: vec![
                Analogue::new("locust in year 2", 2, 3),
                Analogue::new("locust + sturgeon in year 9", 9, 10),
                Analogue::new("locust in year 79", 79, 80),
                Analogue::new("surge + strike in year 6", 5, 6),
                Analogue::new("surge + strike in year 81", 80, 81),
                Analogue::new("stability after strike", 81, 82),
            ],
        }
    }
}

impl Config {
    /// Parse a JSON configuration; omitted fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
