use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MissingData, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Professions
// ─────────────────────────────────────────────────────────────────────────────

/// Occupational category of an islander, as written in the population files.
///
/// Unknown labels are kept verbatim in [`Profession::Other`] so that a new
/// category in a later data drop never aborts loading.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Profession {
    Fisher,
    Farmer,
    Craftsman,
    ServiceProvider,
    CivilServant,
    Retired,
    Homemaker,
    Unemployed,
    NewEntrant,
    Child,
    Other(String),
}

impl Profession {
    pub fn label(&self) -> &str {
        match self {
            Profession::Fisher => "fisher",
            Profession::Farmer => "farmer",
            Profession::Craftsman => "craftsman",
            Profession::ServiceProvider => "service provider",
            Profession::CivilServant => "civil servant",
            Profession::Retired => "retired",
            Profession::Homemaker => "homemaker",
            Profession::Unemployed => "unemployed",
            Profession::NewEntrant => "new entrants",
            Profession::Child => "child",
            Profession::Other(label) => label,
        }
    }
}

impl From<&str> for Profession {
    fn from(raw: &str) -> Self {
        let normalised = raw.trim().to_lowercase().replace('_', " ");
        match normalised.as_str() {
            "fisher" => Profession::Fisher,
            "farmer" => Profession::Farmer,
            "craftsman" => Profession::Craftsman,
            "service provider" => Profession::ServiceProvider,
            "civil servant" => Profession::CivilServant,
            "retired" => Profession::Retired,
            "homemaker" => Profession::Homemaker,
            "unemployed" => Profession::Unemployed,
            "new entrants" | "new entrant" => Profession::NewEntrant,
            "child" => Profession::Child,
            _ => Profession::Other(normalised),
        }
    }
}

impl From<String> for Profession {
    fn from(raw: String) -> Self {
        Profession::from(raw.as_str())
    }
}

impl From<Profession> for String {
    fn from(profession: Profession) -> Self {
        profession.label().to_string()
    }
}

impl FromStr for Profession {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Profession::from(s))
    }
}

impl fmt::Display for Profession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-year aggregates
// ─────────────────────────────────────────────────────────────────────────────

/// Summed income and worker count of one profession in one year.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessionTotals {
    pub income: f64,
    pub headcount: u32,
}

impl ProfessionTotals {
    pub fn new(income: f64, headcount: u32) -> Self {
        ProfessionTotals { income, headcount }
    }
}

/// One historical or forecast year.
///
/// For historical years `gdp` is ground truth and need not equal the sum of
/// `profession_income`; the projection engine reconciles the two with a
/// scale factor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyEconomicRecord {
    pub year: i32,
    pub gdp: f64,
    pub profession_income: BTreeMap<Profession, f64>,
    pub profession_headcount: BTreeMap<Profession, u32>,
}

impl YearlyEconomicRecord {
    /// Sum of the incomes of `professions`; absent professions contribute nothing.
    pub fn tracked_total(&self, professions: &[Profession]) -> f64 {
        professions
            .iter()
            .filter_map(|p| self.profession_income.get(p))
            .sum()
    }
}

/// Which income sources count towards an inequality measure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeScope {
    /// Legitimate income only.
    Formal,
    /// Every recorded income source, untracked ones included.
    Full,
}

#[derive(Clone, Debug, PartialEq)]
struct IndividualIncome {
    profession: Profession,
    income: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Historical table
// ─────────────────────────────────────────────────────────────────────────────

/// Everything known about the past: GDP per year, per-profession totals and
/// the raw individual incomes used for distributional statistics.
#[derive(Clone, Debug, Default)]
pub struct HistoricalTable {
    gdp_by_year: BTreeMap<i32, f64>,
    income_by_year: BTreeMap<i32, BTreeMap<Profession, ProfessionTotals>>,
    population_by_year: BTreeMap<i32, u32>,
    individuals: BTreeMap<i32, Vec<IndividualIncome>>,
}

impl HistoricalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_gdp(&mut self, year: i32, gdp: f64) {
        self.gdp_by_year.insert(year, gdp);
    }

    /// Register one islander's income for `year`.
    ///
    /// Every row counts towards the population and the profession headcount;
    /// only strictly positive incomes enter the individual sample.
    pub fn insert_individual(&mut self, year: i32, profession: Profession, income: f64) {
        let totals = self
            .income_by_year
            .entry(year)
            .or_default()
            .entry(profession.clone())
            .or_default();
        totals.income += income;
        totals.headcount += 1;

        *self.population_by_year.entry(year).or_default() += 1;

        if income > 0.0 {
            self.individuals
                .entry(year)
                .or_default()
                .push(IndividualIncome { profession, income });
        }
    }

    /// Set a profession's aggregate directly, for tables built without
    /// individual rows.
    pub fn insert_totals(&mut self, year: i32, profession: Profession, totals: ProfessionTotals) {
        *self.population_by_year.entry(year).or_default() += totals.headcount;
        self.income_by_year
            .entry(year)
            .or_default()
            .insert(profession, totals);
    }

    /// Fold newer actuals into this table. Years present in both are
    /// replaced by `newer`.
    pub fn absorb(&mut self, newer: HistoricalTable) {
        self.gdp_by_year.extend(newer.gdp_by_year);
        self.income_by_year.extend(newer.income_by_year);
        self.population_by_year.extend(newer.population_by_year);
        self.individuals.extend(newer.individuals);
    }

    pub fn gdp(&self, year: i32) -> Result<f64> {
        self.gdp_by_year
            .get(&year)
            .copied()
            .ok_or_else(|| MissingData::Year(year).into())
    }

    pub fn professions(&self, year: i32) -> Result<&BTreeMap<Profession, ProfessionTotals>> {
        self.income_by_year
            .get(&year)
            .ok_or_else(|| MissingData::Year(year).into())
    }

    pub fn totals(&self, year: i32, profession: &Profession) -> Result<ProfessionTotals> {
        self.professions(year)?
            .get(profession)
            .copied()
            .ok_or_else(|| {
                MissingData::Profession {
                    year,
                    profession: profession.clone(),
                }
                .into()
            })
    }

    pub fn population(&self, year: i32) -> Result<u32> {
        self.population_by_year
            .get(&year)
            .copied()
            .ok_or_else(|| MissingData::Year(year).into())
    }

    /// Latest year with a GDP figure, i.e. the newest possible forecast anchor.
    pub fn last_actual_year(&self) -> Option<i32> {
        self.gdp_by_year.keys().next_back().copied()
    }

    /// Strictly positive individual incomes of `year` within `scope`.
    ///
    /// `informal` lists the professions whose income only counts in the full
    /// economy. A year without individual rows yields an empty sample.
    pub fn positive_incomes(
        &self,
        year: i32,
        scope: IncomeScope,
        informal: &[Profession],
    ) -> Vec<f64> {
        self.individuals
            .get(&year)
            .map(|rows| {
                rows.iter()
                    .filter(|row| scope == IncomeScope::Full || !informal.contains(&row.profession))
                    .map(|row| row.income)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Assemble the full record of a historical year.
    pub fn record(&self, year: i32) -> Result<YearlyEconomicRecord> {
        let gdp = self.gdp(year)?;
        let professions = self.professions(year)?;
        Ok(YearlyEconomicRecord {
            year,
            gdp,
            profession_income: professions
                .iter()
                .map(|(p, t)| (p.clone(), t.income))
                .collect(),
            profession_headcount: professions
                .iter()
                .map(|(p, t)| (p.clone(), t.headcount))
                .collect(),
        })
    }
}
