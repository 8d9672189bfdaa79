use crate::data::Profession;

/// A key required by a calibration or projection step is absent.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MissingData {
    #[error("no record for year {0}")]
    Year(i32),
    #[error("no {profession} income recorded for year {year}")]
    Profession { year: i32, profession: Profession },
    #[error("year set for the {profession} cycle average is empty")]
    EmptyYearSet { profession: Profession },
}

/// Failures of the deterministic forecasting core.
///
/// None of these are retried: every variant aborts the calibration or the
/// forecast chain that raised it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("missing data: {0}")]
    MissingData(#[from] MissingData),

    #[error("domain error in {operation}: {reason}")]
    Domain {
        operation: &'static str,
        reason: String,
    },

    #[error("division by zero: {subject} in year {year}")]
    DivisionByZero { year: i32, subject: String },
}

impl ForecastError {
    pub(crate) fn domain(operation: &'static str, reason: impl Into<String>) -> Self {
        ForecastError::Domain {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn division_by_zero(year: i32, subject: impl Into<String>) -> Self {
        ForecastError::DivisionByZero {
            year,
            subject: subject.into(),
        }
    }
}

/// Failures while reading input files. Outside the core's contract.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
