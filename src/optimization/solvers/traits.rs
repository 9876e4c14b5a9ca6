use crate::core::{OptResult, TerminalState};

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub state: TerminalState,
    /// Objective at `params`
    pub cost: f64,
    pub iterations: u32,
    pub params: Vec<f64>,
    pub cost_evals: usize,
    pub grad_evals: usize,
}

/// Callback interface for optimization progress
pub trait OptimizationCallback {
    /// Called at each iteration with current parameters and cost
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) -> OptResult<()>;

    /// Check if optimization should stop early
    fn should_stop(&self) -> bool {
        false
    }
}

/// Callback that ignores progress
pub struct NoCallback;

impl OptimizationCallback for NoCallback {
    fn on_iteration(&mut self, _iteration: u32, _params: &[f64], _cost: f64) -> OptResult<()> {
        Ok(())
    }
}

/// Core problem definition - just the essentials
pub trait Problem {
    /// Objective to minimize; must return a finite value for finite input
    fn cost(&self, params: &[f64]) -> f64;

    /// Number of parameters
    fn num_params(&self) -> usize;

    /// Initial parameter values
    fn initial_params(&self) -> &[f64];

    /// Parameter bounds (min, max) for each parameter
    fn bounds(&self) -> &[(f64, f64)];
}

/// Solver interface - takes problem and callback
///
/// Numerical trouble (divergence, unrecoverable line search) is reported
/// through `SolverResult::state`, not as an error. `Err` is reserved for a
/// callback aborting the run or a backend refusing its configuration.
pub trait Solver {
    fn name(&self) -> &str;

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> OptResult<SolverResult>;
}
