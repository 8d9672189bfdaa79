//! Gini coefficient and income-distribution statistics, plus the forward
//! projection of the formal and full-economy Gini tracks.

use serde::{Deserialize, Serialize};

use crate::scenario::Scenario;

/// Largest Gini value a projected track may take.
const GINI_CEILING: f64 = 1.0 - 1e-9;

/// Discrete Gini coefficient of a positive-income sample.
///
/// Callers pass strictly positive incomes only. An empty sample is the
/// degenerate case and yields `0.0` by convention. Otherwise, with incomes
/// sorted ascending and 1-based ranks `i`:
///
/// `G = 2 Σ i·xᵢ / (n Σ xᵢ) − (n + 1) / n`
pub fn gini(incomes: &[f64]) -> f64 {
    if incomes.is_empty() {
        return 0.0;
    }
    let mut sorted = incomes.to_vec();
    sorted.sort_by(f64::total_cmp);

    // A uniform sample is exactly equal; skip the rounding noise of the formula.
    if sorted.first() == sorted.last() {
        return 0.0;
    }

    let n = sorted.len() as f64;
    let total: f64 = sorted.iter().sum();
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();

    (2.0 * weighted / (n * total) - (n + 1.0) / n).max(0.0)
}

/// Linearly interpolated percentile (`p` in `0..=100`) of `values`.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        sorted[lower] * (1.0 - w) + sorted[upper] * w
    }
}

/// Distribution summary of one year's positive incomes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeSummary {
    pub count: usize,
    pub mean: f64,
    pub p10: f64,
    pub median: f64,
    pub p90: f64,
    pub gini: f64,
}

impl IncomeSummary {
    pub fn from_incomes(incomes: &[f64]) -> Self {
        if incomes.is_empty() {
            return IncomeSummary::default();
        }
        let mut sorted = incomes.to_vec();
        sorted.sort_by(f64::total_cmp);
        IncomeSummary {
            count: sorted.len(),
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p10: percentile_sorted(&sorted, 10.0),
            median: percentile_sorted(&sorted, 50.0),
            p90: percentile_sorted(&sorted, 90.0),
            gini: gini(&sorted),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Forward projection
// ─────────────────────────────────────────────────────────────────────────────

/// Gini of the same population measured on legitimate income only and on
/// every income source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GiniTracks {
    pub formal: f64,
    pub full: f64,
}

impl GiniTracks {
    /// Advance both tracks into `year`.
    ///
    /// Each track moves by the Gini deltas of the policies active in `year`
    /// plus `(target − gini) × reversion_rate`. While an enforcement policy is
    /// active the full-economy track additionally closes
    /// `enforcement_gap_closure` of its gap to the formal track.
    pub fn advance(&self, scenario: &Scenario, year: i32) -> GiniTracks {
        let settings = &scenario.inequality;
        let policy = scenario.gini_delta(year);
        let step =
            |gini: f64| gini + policy + (settings.target_gini - gini) * settings.reversion_rate;

        let formal = step(self.formal);
        let mut full = step(self.full);
        if scenario.enforcement_active(year) {
            full -= (self.full - self.formal) * settings.enforcement_gap_closure;
        }

        GiniTracks {
            formal: formal.clamp(0.0, GINI_CEILING),
            full: full.clamp(0.0, GINI_CEILING),
        }
    }
}

/// Project `start` over `years` consecutive years after `from_year`.
pub fn project_gini(
    start: GiniTracks,
    scenario: &Scenario,
    from_year: i32,
    years: u32,
) -> Vec<GiniTracks> {
    let mut out = Vec::with_capacity(years as usize);
    let mut current = start;
    for offset in 1..=years as i32 {
        current = current.advance(scenario, from_year + offset);
        out.push(current);
    }
    out
}
