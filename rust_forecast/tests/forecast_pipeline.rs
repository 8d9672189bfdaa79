//! End-to-end runs: CSV text in, calibrated forecast chain and report out.

use island_forecast::{
    advance_year, compare, project, validate, Analogue, Config, ForecastError, ForecastHistory,
    ForecastState, HistoricalTable, IncomeScope, IncomeSummary, PolicyEffect, Profession,
    ProfessionTotals, Report, Scenario,
};

const GDP: &str = "\
year,gdp
97,1900
98,1700
99,1750
100,2000
";

const POPULATION: &str = "\
year,profession,income
97,fisher,600
97,fisher,600
97,farmer,300
97,farmer,300
98,fisher,400
98,fisher,400
98,farmer,150
98,farmer,150
99,fisher,400
99,fisher,400
99,farmer,300
99,farmer,300
100,fisher,600
100,fisher,600
100,farmer,330
100,farmer,330
100,smuggler,5000
";

const CONFIG: &str = r#"{
    "horizon": 3,
    "calibration": {
        "cycles": [{
            "name": "sturgeon surge",
            "profession": "fisher",
            "period": 3,
            "phase_offset": 0,
            "lag": 1,
            "peak_years": [97, 100],
            "trough_years": [98, 99]
        }],
        "growth": [{"profession": "farmer", "start_year": 99, "end_year": 100}],
        "events": [{
            "name": "locust infestation",
            "profession": "farmer",
            "pre_year": 97,
            "post_year": 98,
            "apply_year": 102
        }],
        "population_window": [97, 100]
    },
    "scenario": {
        "tracked": ["fisher", "farmer"],
        "population_productivity": {}
    }
}"#;

fn island() -> HistoricalTable {
    HistoricalTable::from_readers(GDP.as_bytes(), POPULATION.as_bytes()).unwrap()
}

fn config() -> Config {
    Config::from_json_str(CONFIG).unwrap()
}

fn income(state: &ForecastState, profession: Profession) -> f64 {
    state.line(&profession).unwrap().income
}

#[test]
fn calibrated_chain_follows_cycle_growth_and_event() {
    let config = config();
    let mut history = ForecastHistory::new();
    let forecast = history
        .rebase(&island(), &config.calibration, &config.scenario, config.horizon)
        .unwrap();

    assert_eq!(forecast.anchor_year(), 100);
    let years: Vec<i32> = forecast.years.iter().map(|s| s.year).collect();
    assert_eq!(years, vec![101, 102, 103]);

    let y101 = forecast.year(101).unwrap();
    let y102 = forecast.year(102).unwrap();
    let y103 = forecast.year(103).unwrap();

    // fishers sit at the trough level (400/head) until the year-103 peak
    assert!((income(y101, Profession::Fisher) - 800.0).abs() < 1e-9);
    assert!((income(y102, Profession::Fisher) - 800.0).abs() < 1e-9);
    assert!((income(y103, Profession::Fisher) - 1200.0).abs() < 1e-9);

    // farmers grow 10 % a year; the locust year halves them
    assert!((income(y101, Profession::Farmer) - 726.0).abs() < 1e-9);
    assert!((income(y102, Profession::Farmer) - 399.3).abs() < 1e-9);
    assert!((income(y103, Profession::Farmer) - 439.23).abs() < 1e-9);

    let scale = 2000.0 / 1860.0;
    assert!((forecast.anchor.scale_factor - scale).abs() < 1e-12);
    assert!((y101.gdp - 1526.0 * scale).abs() < 1e-9);
    assert!(y103.notes.contains(&"sturgeon surge peak".to_string()));
}

#[test]
fn repeated_runs_are_bit_identical() {
    let config = config();
    let table = island();
    let mut history = ForecastHistory::new();
    let first = history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .unwrap()
        .clone();
    let second = history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .unwrap();

    assert_eq!(&first, second);
    let bits = |f: &island_forecast::Forecast| -> Vec<u64> {
        f.gdp_series().iter().map(|(_, gdp)| gdp.to_bits()).collect()
    };
    assert_eq!(bits(&first), bits(second));
}

#[test]
fn shifting_a_falsified_phase_moves_the_peak() {
    let config = config();
    let mut history = ForecastHistory::new();
    let forecast = history
        .rebase(&island(), &config.calibration, &config.scenario, config.horizon)
        .unwrap()
        .clone();

    let mut scenario = forecast.scenario.clone();
    scenario.cycles[0].shift_phase(1).unwrap();
    let shifted = project(forecast.anchor.clone(), &scenario, 3).unwrap();

    assert!((income(&shifted.years[0], Profession::Fisher) - 1200.0).abs() < 1e-9);
    assert!((income(&shifted.years[2], Profession::Fisher) - 800.0).abs() < 1e-9);
}

#[test]
fn new_actuals_rebase_and_score_the_old_chain() {
    let config = config();
    let mut table = island();
    let mut history = ForecastHistory::new();
    history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .unwrap();

    let newer = HistoricalTable::from_readers(
        "year,gdp\n101,1700\n".as_bytes(),
        "year,profession,income\n101,fisher,600\n101,fisher,600\n101,farmer,360\n101,farmer,360\n"
            .as_bytes(),
    )
    .unwrap();
    table.absorb(newer);

    let rebased = history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .unwrap();
    assert_eq!(rebased.anchor_year(), 101);
    assert_eq!(rebased.years[0].year, 102);

    let scorecard = history.scorecard(&table);
    assert_eq!(scorecard.len(), 1);
    let (anchor, rows) = &scorecard[0];
    assert_eq!(*anchor, 100);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].actual, 1700.0);
}

#[test]
fn simultaneous_policies_compound() {
    let mut t = HistoricalTable::new();
    t.insert_gdp(100, 1500.0);
    t.insert_totals(100, Profession::Fisher, ProfessionTotals::new(1000.0, 10));
    t.insert_totals(100, Profession::Farmer, ProfessionTotals::new(500.0, 5));

    let scenario = Scenario {
        tracked: vec![Profession::Fisher, Profession::Farmer],
        policies: vec![
            PolicyEffect::relative("harbour", 101, 103, 0.10),
            PolicyEffect::relative("school", 101, 103, 0.08),
            PolicyEffect::relative("market hall", 101, 103, 0.06),
        ],
        ..Scenario::default()
    };
    let anchor = ForecastState::seed(&t, 100, &scenario).unwrap();
    assert_eq!(anchor.scale_factor, 1.0);

    let next = advance_year(&anchor, &scenario).unwrap();
    let compounded = 1.10 * 1.08 * 1.06;
    assert!((next.gdp - 1500.0 * compounded).abs() < 1e-9);
    assert!((next.gdp - 1500.0 * 1.24).abs() > 1.0);
}

#[test]
fn missing_tracked_profession_is_reported() {
    let mut config = config();
    config.scenario.tracked.push(Profession::Craftsman);
    let mut history = ForecastHistory::new();
    let err = history
        .rebase(&island(), &config.calibration, &config.scenario, config.horizon)
        .unwrap_err();
    assert!(matches!(err, ForecastError::MissingData(_)), "{err}");
}

#[test]
fn informal_income_only_counts_in_the_full_economy() {
    let table = island();
    let informal = Scenario::default().inequality.informal_professions;
    let formal = table.positive_incomes(100, IncomeScope::Formal, &informal);
    let full = table.positive_incomes(100, IncomeScope::Full, &informal);
    assert_eq!(formal.len(), 4);
    assert_eq!(full.len(), 5);

    let config = config();
    let mut history = ForecastHistory::new();
    let forecast = history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .unwrap();
    assert!(forecast.anchor.gini.full > forecast.anchor.gini.formal);
}

#[test]
fn report_renders_every_section() {
    let config = config();
    let mut table = island();
    let mut history = ForecastHistory::new();
    let forecast = history
        .rebase(&table, &config.calibration, &config.scenario, config.horizon)
        .unwrap()
        .clone();

    let actuals =
        HistoricalTable::gdp_from_reader("year,gdp\n101,1690\n".as_bytes(), "actuals").unwrap();
    table.absorb(actuals);
    let comparisons = compare(&forecast, &table);
    let summary = IncomeSummary::from_incomes(&table.positive_incomes(
        100,
        IncomeScope::Formal,
        &forecast.scenario.inequality.informal_professions,
    ));

    let validation = validate(
        &table,
        &[
            Analogue::new("locust in year 98", 98, 99),
            Analogue::new("locust in year 2", 2, 3),
        ],
        &forecast,
    );

    let text = Report {
        title: "GDP FORECAST FOR HAGELSLAG ISLAND (Years 101-103)",
        forecast: &forecast,
        comparisons: &comparisons,
        distribution: Some(&summary),
        validation: Some(&validation),
    }
    .to_string();

    assert!(text.contains("GDP FORECAST FOR HAGELSLAG ISLAND (Years 101-103)"));
    assert!(text.contains("sturgeon surge"));
    assert!(text.contains("Year 100 baseline:"));
    assert!(text.contains("2,000.00"));
    assert!(text.contains("Forecast vs actual:"));
    assert!(text.contains("Income distribution, year 100:"));

    // four islanders in year 97, five in year 100
    assert_eq!(forecast.anchor.population, 5);
    assert!(text.contains("Population"));
    assert!(text.contains("8.33%  annually"), "{text}");

    assert!(text.contains("Model validation:"));
    assert!(text.contains("Year 98 -> 99 actual"));
    assert!(text.contains("+2.9%  (locust in year 98)"));
    assert!(text.contains("Year 100 -> 101 forecast"));
    assert!(!text.contains("Year 2 -> 3"));
}

#[test]
fn calibrated_population_growth_survives_the_rebase() {
    let config = config();
    let mut history = ForecastHistory::new();
    let forecast = history
        .rebase(&island(), &config.calibration, &config.scenario, config.horizon)
        .unwrap();

    let rate = forecast.scenario.population_growth.unwrap();
    assert!((rate - 1.0 / 12.0).abs() < 1e-12);
    assert!(forecast.years.iter().all(|year| year.population == 5));
}
