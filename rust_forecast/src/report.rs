//! Console report. Presentation only: every number shown is computed
//! elsewhere.

use std::fmt;

use crate::history::{Comparison, Validation};
use crate::inequality::IncomeSummary;
use crate::projection::Forecast;
use crate::scenario::AggregationMode;

const WIDTH: usize = 70;

/// Everything printed for one forecasting run.
pub struct Report<'a> {
    pub title: &'a str,
    pub forecast: &'a Forecast,
    pub comparisons: &'a [Comparison],
    pub distribution: Option<&'a IncomeSummary>,
    pub validation: Option<&'a Validation>,
}

/// Format with two decimals and thousands separators.
fn money(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

fn rule(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    writeln!(f, "{}", ch.to_string().repeat(WIDTH))
}

impl Report<'_> {
    fn parameters(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scenario = &self.forecast.scenario;
        writeln!(f, "Model parameters:")?;
        for cycle in &scenario.cycles {
            write!(
                f,
                "  {:<28} {} every {} yrs (offset {}, lag {})",
                cycle.name, cycle.profession, cycle.period, cycle.phase_offset, cycle.lag
            )?;
            match cycle.levels {
                Some(levels) => writeln!(
                    f,
                    ", HIGH={}/head LOW={}/head",
                    money(levels.peak_per_head),
                    money(levels.trough_per_head)
                )?,
                None => writeln!(f, ", {:+.1}% at peak", cycle.magnitude * 100.0)?,
            }
        }
        for (profession, rate) in &scenario.base_growth {
            writeln!(f, "  {:<28} {:+.2}% annual", format!("{profession} trend"), rate * 100.0)?;
        }
        for shock in &scenario.shocks {
            let schedule: Vec<String> = shock
                .magnitudes
                .iter()
                .map(|(year, m)| format!("{year}: {:+.1}%", m * 100.0))
                .collect();
            writeln!(
                f,
                "  {:<28} {} [{}]",
                shock.name,
                shock.profession,
                schedule.join(", ")
            )?;
        }
        for policy in &scenario.policies {
            writeln!(
                f,
                "  {:<28} policy, years {}-{}",
                policy.name, policy.start_year, policy.end_year
            )?;
        }
        match scenario.aggregation {
            AggregationMode::Scaled => writeln!(
                f,
                "  {:<28} scaled (factor {:.4})",
                "aggregation", self.forecast.anchor.scale_factor
            ),
            AggregationMode::CarryForward => {
                writeln!(f, "  {:<28} carry-forward", "aggregation")
            }
        }
    }

    fn baseline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let anchor = &self.forecast.anchor;
        writeln!(f, "Year {} baseline:", anchor.year)?;
        writeln!(f, "  {:<20}{:>15}", "Total GDP", money(anchor.gdp))?;
        for (profession, line) in &anchor.professions {
            writeln!(
                f,
                "  {:<20}{:>15}  ({} workers, {}/head)",
                profession.label(),
                money(line.income),
                line.headcount,
                money(line.per_head)
            )?;
        }
        writeln!(
            f,
            "  {:<20}{:>15.4}  (full economy {:.4})",
            "Gini (formal)", anchor.gini.formal, anchor.gini.full
        )?;
        writeln!(f, "  {:<20}{:>15.1}", "Happiness", anchor.happiness)?;
        writeln!(f, "  {:<20}{:>15}", "Population", anchor.population)?;
        match self.forecast.scenario.population_growth {
            Some(rate) => {
                writeln!(f, "  {:<20}{:>14.2}%  annually", "Pop growth", rate * 100.0)
            }
            None => Ok(()),
        }
    }

    fn forecast_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        rule(f, '-')?;
        writeln!(f, "{:<8}{:>15}{:>12}  Notes", "Year", "GDP", "Change")?;
        rule(f, '-')?;
        let anchor = &self.forecast.anchor;
        writeln!(f, "{:<8}{:>15}{:>12}  Actual", anchor.year, money(anchor.gdp), "")?;

        let mut previous = anchor.gdp;
        for state in &self.forecast.years {
            let change = if previous == 0.0 {
                "n/a".to_string()
            } else {
                format!("{:+.1}%", (state.gdp - previous) / previous * 100.0)
            };
            writeln!(
                f,
                "{:<8}{:>15}{:>12}  {}",
                state.year,
                money(state.gdp),
                change,
                state.notes.join(" + ")
            )?;
            previous = state.gdp;
        }
        rule(f, '-')
    }

    fn comparison_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast vs actual:")?;
        writeln!(f, "{:<8}{:>15}{:>15}{:>12}", "Year", "Forecast", "Actual", "Error")?;
        for row in self.comparisons {
            let pct = row
                .error_pct
                .map(|p| format!("{p:+.1}%"))
                .unwrap_or_else(|| "n/a".to_string());
            writeln!(
                f,
                "{:<8}{:>15}{:>15}{:>12}",
                row.year,
                money(row.forecast),
                money(row.actual),
                pct
            )?;
        }
        Ok(())
    }

    fn validation_table(&self, f: &mut fmt::Formatter<'_>, v: &Validation) -> fmt::Result {
        writeln!(f, "Model validation:")?;
        for row in &v.historical {
            writeln!(
                f,
                "  {:<24}{:>+9.1}%  ({})",
                format!("Year {} -> {} actual", row.from_year, row.to_year),
                row.change_pct,
                row.label
            )?;
        }
        if let Some(row) = &v.forecast {
            writeln!(
                f,
                "  {:<24}{:>+9.1}%",
                format!("Year {} -> {} forecast", row.from_year, row.to_year),
                row.change_pct
            )?;
        }
        Ok(())
    }

    fn wellbeing_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inequality and wellbeing:")?;
        writeln!(
            f,
            "{:<8}{:>14}{:>14}{:>12}",
            "Year", "Gini formal", "Gini full", "Happiness"
        )?;
        for state in std::iter::once(&self.forecast.anchor).chain(&self.forecast.years) {
            writeln!(
                f,
                "{:<8}{:>14.4}{:>14.4}{:>12.1}",
                state.year, state.gini.formal, state.gini.full, state.happiness
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        rule(f, '=')?;
        writeln!(f, "{}", self.title)?;
        rule(f, '=')?;
        writeln!(f)?;
        self.parameters(f)?;
        writeln!(f)?;
        self.baseline(f)?;
        writeln!(f)?;
        self.forecast_table(f)?;

        if !self.comparisons.is_empty() {
            writeln!(f)?;
            self.comparison_table(f)?;
        }

        if let Some(validation) = self.validation {
            writeln!(f)?;
            self.validation_table(f, validation)?;
        }

        writeln!(f)?;
        self.wellbeing_table(f)?;

        if let Some(summary) = self.distribution {
            writeln!(f)?;
            writeln!(f, "Income distribution, year {}:", self.forecast.anchor.year)?;
            writeln!(
                f,
                "  n={}  mean={}  p10={}  median={}  p90={}  gini={:.4}",
                summary.count,
                money(summary.mean),
                money(summary.p10),
                money(summary.median),
                money(summary.p90),
                summary.gini
            )?;
        }
        rule(f, '=')
    }
}
