//! Reading the island's flat files into a [`HistoricalTable`].
//!
//! Two inputs are understood:
//!
//! * the GDP table, `year,gdp`, one row per historical year;
//! * the population table, `year,profession,income`, one row per islander per
//!   year.
//!
//! Extra columns are ignored so the richer population exports can be fed in
//! unchanged.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::data::{HistoricalTable, Profession};
use crate::error::LoadError;

#[derive(Debug, Deserialize)]
struct GdpRow {
    year: i32,
    gdp: f64,
}

#[derive(Debug, Deserialize)]
struct IncomeRow {
    year: i32,
    profession: String,
    income: f64,
}

impl HistoricalTable {
    /// Load both input files from disk.
    pub fn load(gdp_path: &Path, income_path: &Path) -> Result<Self, LoadError> {
        let open = |path: &Path| {
            File::open(path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        let table = Self::from_readers_named(
            open(gdp_path)?,
            &gdp_path.display().to_string(),
            open(income_path)?,
            &income_path.display().to_string(),
        )?;
        Ok(table)
    }

    /// Load a GDP table alone, e.g. actuals published after a forecast.
    pub fn load_gdp(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::gdp_from_reader(file, &path.display().to_string())
    }

    pub fn gdp_from_reader<G: Read>(gdp: G, origin: &str) -> Result<Self, LoadError> {
        let mut table = HistoricalTable::new();
        let rows = read_gdp_rows(&mut table, gdp, origin)?;
        info!(rows, origin, "gdp table loaded");
        Ok(table)
    }

    /// Parse both inputs from arbitrary readers (in-memory text in tests).
    pub fn from_readers<G: Read, I: Read>(gdp: G, income: I) -> Result<Self, LoadError> {
        Self::from_readers_named(gdp, "gdp table", income, "population table")
    }

    fn from_readers_named<G: Read, I: Read>(
        gdp: G,
        gdp_origin: &str,
        income: I,
        income_origin: &str,
    ) -> Result<Self, LoadError> {
        let mut table = HistoricalTable::new();

        let gdp_rows = read_gdp_rows(&mut table, gdp, gdp_origin)?;

        let mut income_rows = 0usize;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(income);
        for row in reader.deserialize::<IncomeRow>() {
            let row = row.map_err(|source| LoadError::Csv {
                origin: income_origin.to_string(),
                source,
            })?;
            table.insert_individual(row.year, Profession::from(row.profession), row.income);
            income_rows += 1;
        }

        info!(
            gdp_rows,
            income_rows,
            last_actual_year = table.last_actual_year(),
            "historical tables loaded"
        );
        Ok(table)
    }
}

fn read_gdp_rows<G: Read>(
    table: &mut HistoricalTable,
    gdp: G,
    origin: &str,
) -> Result<usize, LoadError> {
    let mut rows = 0usize;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(gdp);
    for row in reader.deserialize::<GdpRow>() {
        let row = row.map_err(|source| LoadError::Csv {
            origin: origin.to_string(),
            source,
        })?;
        table.insert_gdp(row.year, row.gdp);
        rows += 1;
    }
    Ok(rows)
}
