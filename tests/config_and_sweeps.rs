//! Run files, parallel sweeps and sensitivity sampling through the public API.

use fermentopt::{
    Bounds, DecisionVector, Method, OptError, OptimizerConfig, ParameterSet, RunSpec, Variable,
    best_report, evaluate, multi_start, optimize, parameter_sweep, profile, random_guesses,
    surface,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_run_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Run files
// ============================================================================

#[test]
fn run_file_drives_an_optimization() {
    let file = write_run_file(
        r#"{
            "parameters": { "k_s": 1.0, "c_inhib": 5.0, "price": 10.0, "alpha_r": 1.0 },
            "bounds": {
                "substrate": [0.0, 10.0],
                "biomass": [0.0, 10.0],
                "temperature_gain": [0.0, 10.0],
                "ph_gain": [0.0, 10.0]
            },
            "initial_guess": { "substrate": 1.0, "biomass": 1.0, "temperature_gain": 0.1, "ph_gain": 0.1 },
            "optimizer": { "method": "bounded", "max_iterations": 200, "tolerance": 1e-7 }
        }"#,
    );

    let spec = RunSpec::from_path(file.path()).unwrap();
    assert_eq!(spec.optimizer.method, Method::Bounded);
    assert_eq!(spec.optimizer.max_iterations, 200);

    let report = optimize(&spec.parameters, &spec.bounds, spec.initial_guess, &spec.optimizer).unwrap();
    assert!(report.state.is_completed());
    assert_eq!(report.violations, [0.0; 4]);
}

#[test]
fn run_file_with_inverted_bounds_fails_validation() {
    let file = write_run_file(r#"{ "bounds": { "biomass": [8.0, 2.0] } }"#);
    let err = RunSpec::from_path(file.path()).unwrap_err();
    assert!(matches!(err, OptError::InvalidBounds { variable: "X_0", .. }));
}

#[test]
fn missing_run_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = RunSpec::from_path(&path).unwrap_err();
    match err {
        OptError::ConfigRead { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_json_is_a_parse_error() {
    let file = write_run_file("{ \"optimizer\": ");
    assert!(matches!(
        RunSpec::from_path(file.path()),
        Err(OptError::ConfigParse(_))
    ));
}

// ============================================================================
// Sweeps
// ============================================================================

#[test]
fn multi_start_finds_at_least_the_single_start_profit() {
    let parameters = ParameterSet::baseline();
    let bounds = Bounds::uniform(0.0, 10.0);
    let config = OptimizerConfig::default();

    let mut guesses = vec![DecisionVector::default()];
    guesses.extend(random_guesses(&bounds, 6, 2024).unwrap());
    let results = multi_start(&parameters, &bounds, &guesses, &config);
    assert_eq!(results.len(), guesses.len());

    let single = optimize(&parameters, &bounds, DecisionVector::default(), &config).unwrap();
    let best = best_report(&results).unwrap();
    assert!(best.profit >= single.profit);
    // The first run is independent of the others
    assert_eq!(results[0].as_ref().unwrap(), &single);
}

#[test]
fn higher_price_never_lowers_optimal_profit() {
    let prices = [5.0, 10.0, 20.0];
    let sets: Vec<ParameterSet> = prices
        .iter()
        .map(|&price| ParameterSet {
            price,
            ..ParameterSet::baseline()
        })
        .collect();

    let results = parameter_sweep(
        &sets,
        &Bounds::uniform(0.0, 10.0),
        DecisionVector::default(),
        &OptimizerConfig::default().with_method(Method::Bounded),
    );
    let profits: Vec<f64> = results.iter().map(|r| r.as_ref().unwrap().profit).collect();
    assert!(profits.windows(2).all(|w| w[1] > w[0]), "{profits:?}");
}

// ============================================================================
// Sensitivity
// ============================================================================

#[test]
fn profile_through_the_optimum_peaks_near_it() {
    let parameters = ParameterSet::baseline();
    let bounds = Bounds::uniform(0.0, 10.0);
    let report = optimize(
        &parameters,
        &bounds,
        DecisionVector::default(),
        &OptimizerConfig::default().with_method(Method::Bounded),
    )
    .unwrap();

    let curve = profile(
        &parameters,
        &bounds,
        &report.decision,
        Variable::Substrate,
        201,
        0.0,
    )
    .unwrap();
    let best_sample = curve
        .iter()
        .map(|p| p.evaluation.profit())
        .fold(f64::NEG_INFINITY, f64::max);

    assert!(best_sample <= report.profit + 1e-6);
    let optimum = evaluate(&report.decision, &parameters, &bounds, 0.0).profit();
    assert!(optimum - best_sample < 1e-2);
}

#[test]
fn surface_covers_both_axes() {
    let grid = surface(
        &ParameterSet::baseline(),
        &Bounds::uniform(0.0, 10.0),
        &DecisionVector::default(),
        Variable::TemperatureGain,
        Variable::PhGain,
        5,
    )
    .unwrap();

    assert_eq!(grid.x_values, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    assert_eq!(grid.y_values, grid.x_values);
    // Gains only add cost without synergy, so the origin is the best cell
    let (x, y, _) = grid.peak().unwrap();
    assert_eq!((x, y), (0.0, 0.0));
}
