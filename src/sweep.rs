//! Independent optimizer runs executed in parallel.
//!
//! Each run owns its inputs and optimizer state; the only thing shared
//! between threads is read-only data, so no synchronization is needed.

use crate::core::{
    Bounds, DecisionVector, OptResult, OptimizationReport, OptimizerConfig, ParameterSet,
    validate_bounds,
};
use crate::optimizer::optimize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

/// Reproducible starting guesses drawn uniformly inside `bounds`
pub fn random_guesses(bounds: &Bounds, count: usize, seed: u64) -> OptResult<Vec<DecisionVector>> {
    validate_bounds(bounds)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let pairs = bounds.pairs();
    let guesses = (0..count)
        .map(|_| {
            let mut values = [0.0; 4];
            for (value, &(min, max)) in values.iter_mut().zip(pairs.iter()) {
                *value = rng.gen_range(min..=max);
            }
            DecisionVector::from_array(values)
        })
        .collect();

    Ok(guesses)
}

/// One run per starting guess; results come back in input order
pub fn multi_start(
    parameters: &ParameterSet,
    bounds: &Bounds,
    guesses: &[DecisionVector],
    config: &OptimizerConfig,
) -> Vec<OptResult<OptimizationReport>> {
    info!(starts = guesses.len(), method = %config.method, "multi-start sweep");
    guesses
        .par_iter()
        .map(|guess| optimize(parameters, bounds, *guess, config))
        .collect()
}

/// One run per parameter set from a common starting guess
pub fn parameter_sweep(
    parameter_sets: &[ParameterSet],
    bounds: &Bounds,
    initial: DecisionVector,
    config: &OptimizerConfig,
) -> Vec<OptResult<OptimizationReport>> {
    info!(runs = parameter_sets.len(), method = %config.method, "parameter sweep");
    parameter_sets
        .par_iter()
        .map(|parameters| optimize(parameters, bounds, initial, config))
        .collect()
}

/// Highest-profit report among runs that did not fail
pub fn best_report(results: &[OptResult<OptimizationReport>]) -> Option<&OptimizationReport> {
    results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .filter(|report| report.state.is_completed())
        .max_by(|a, b| a.profit.total_cmp(&b.profit))
}
