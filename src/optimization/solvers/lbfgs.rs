//! argmin-backed L-BFGS for the penalty method.
//!
//! The problem is wrapped in an adapter that exposes `CostFunction` and a
//! central-difference `Gradient` to argmin. argmin owns the iteration loop,
//! so the progress callback only sees the final iterate.

use super::gradient::central_gradient;
use super::traits::{OptimizationCallback, Problem, Solver, SolverResult};
use crate::core::{OptResult, TerminalState};
use argmin::core::{
    CostFunction, Error, Executor, Gradient, State, TerminationReason, TerminationStatus,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use std::cell::Cell;
use tracing::warn;

/// History size for L-BFGS runs
pub const DEFAULT_LBFGS_MEM: usize = 7;

type MoreThuenteLS = MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64>;
type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Vec<f64>, Vec<f64>, f64>;

/// Bridges a `Problem` to argmin's `CostFunction` and `Gradient`
struct ArgminAdapter<'a> {
    problem: &'a dyn Problem,
    cost_evals: &'a Cell<usize>,
    grad_evals: &'a Cell<usize>,
}

impl CostFunction for ArgminAdapter<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        self.cost_evals.set(self.cost_evals.get() + 1);
        Ok(self.problem.cost(params))
    }
}

impl Gradient for ArgminAdapter<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> Result<Self::Gradient, Error> {
        let mut grad = vec![0.0; params.len()];
        let evals = central_gradient(|p| self.problem.cost(p), params, &mut grad);
        self.cost_evals.set(self.cost_evals.get() + evals);
        self.grad_evals.set(self.grad_evals.get() + 1);
        Ok(grad)
    }
}

pub struct LbfgsOptimizer {
    max_iter: u32,
    tolerance: f64,
    memory: usize,
}

impl LbfgsOptimizer {
    pub fn new(max_iter: u32, tolerance: f64) -> Self {
        Self {
            max_iter,
            tolerance,
            memory: DEFAULT_LBFGS_MEM,
        }
    }

    pub fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory.max(1);
        self
    }

    fn build(&self) -> OptResult<LbfgsMoreThuente> {
        let solver = LBFGS::new(MoreThuenteLS::new(), self.memory)
            .with_tolerance_grad(self.tolerance)?
            .with_tolerance_cost(0.1 * self.tolerance)?;
        Ok(solver)
    }
}

fn map_termination(status: &TerminationStatus) -> TerminalState {
    match status {
        TerminationStatus::Terminated(
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached,
        ) => TerminalState::Converged,
        TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
            TerminalState::MaxIterationsReached
        }
        other => TerminalState::Failed(other.to_string()),
    }
}

impl Solver for LbfgsOptimizer {
    fn name(&self) -> &str {
        "argmin L-BFGS (More-Thuente)"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> OptResult<SolverResult> {
        let solver = self.build()?;
        let initial = problem.initial_params().to_vec();
        let initial_cost = problem.cost(&initial);

        let cost_counter = Cell::new(1);
        let grad_counter = Cell::new(0);
        let adapter = ArgminAdapter {
            problem,
            cost_evals: &cost_counter,
            grad_evals: &grad_counter,
        };

        let max_iters = u64::from(self.max_iter);
        let outcome = Executor::new(adapter, solver)
            .configure(|state| state.param(initial.clone()).max_iters(max_iters))
            .run();

        let cost_evals = cost_counter.get();
        let grad_evals = grad_counter.get();

        let result = match outcome {
            Ok(res) => {
                let state = res.state();
                let iterations = u32::try_from(state.get_iter()).unwrap_or(u32::MAX);
                match state.get_best_param() {
                    Some(best) if best.iter().all(|v| v.is_finite()) => SolverResult {
                        state: map_termination(state.get_termination_status()),
                        cost: state.get_best_cost(),
                        iterations,
                        params: best.clone(),
                        cost_evals,
                        grad_evals,
                    },
                    _ => SolverResult {
                        state: TerminalState::Failed(
                            "solver produced no finite best parameters".to_string(),
                        ),
                        cost: initial_cost,
                        iterations,
                        params: initial,
                        cost_evals,
                        grad_evals,
                    },
                }
            }
            Err(err) => {
                warn!(error = %err, "argmin run failed");
                SolverResult {
                    state: TerminalState::Failed(err.to_string()),
                    cost: initial_cost,
                    iterations: 0,
                    params: initial,
                    cost_evals,
                    grad_evals,
                }
            }
        };

        callback.on_iteration(result.iterations, &result.params, result.cost)?;
        Ok(result)
    }
}
