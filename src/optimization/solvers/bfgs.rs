use super::gradient::central_gradient;
use super::traits::{OptimizationCallback, Problem, Solver, SolverResult};
use crate::core::{OptResult, TerminalState, clamp_to_bounds};
use crate::objective::LARGE_OBJECTIVE;
use tracing::{debug, warn};

/// Curvature pairs with `s'y <= CURVATURE_EPS * |s| |y|` are skipped
const CURVATURE_EPS: f64 = 1e-10;

/// A stalled line search counts as convergence within this multiple of the tolerance
const STALL_FACTOR: f64 = 100.0;

/// Dense BFGS with Armijo backtracking line search.
///
/// In projected mode every trial point is clamped into the bounds and
/// variables held on a bound by the gradient are frozen in the search
/// direction, so iterates never leave the box. Otherwise the search is
/// unconstrained and bounds are left to the objective.
pub struct BfgsOptimizer {
    max_iter: u32,
    tolerance: f64,
    projected: bool,
    armijo_c: f64,         // Armijo condition parameter
    backtrack_factor: f64, // Line search backtracking
    max_backtracks: u32,
}

impl BfgsOptimizer {
    pub fn new(max_iter: u32, tolerance: f64) -> Self {
        Self {
            max_iter,
            tolerance,
            projected: false,
            armijo_c: 1e-4,
            backtrack_factor: 0.5,
            max_backtracks: 40,
        }
    }

    /// Bound-constrained variant
    pub fn projected(max_iter: u32, tolerance: f64) -> Self {
        Self {
            projected: true,
            ..Self::new(max_iter, tolerance)
        }
    }

    pub fn with_line_search(mut self, armijo_c: f64, backtrack_factor: f64) -> Self {
        self.armijo_c = armijo_c;
        self.backtrack_factor = backtrack_factor;
        self
    }

    #[inline]
    fn project(&self, params: &mut [f64], bounds: &[(f64, f64)]) {
        if self.projected {
            clamp_to_bounds(params, bounds);
        }
    }

    /// Variables that may move; pinned ones sit on a bound with the gradient pushing outward
    fn free_mask(&self, params: &[f64], grad: &[f64], bounds: &[(f64, f64)]) -> Vec<bool> {
        params
            .iter()
            .zip(grad.iter())
            .zip(bounds.iter())
            .map(|((&x, &g), &(lo, hi))| {
                !self.projected || !((x <= lo && g > 0.0) || (x >= hi && g < 0.0))
            })
            .collect()
    }

    /// Infinity norm of the (projected) gradient
    fn stationarity(&self, params: &[f64], grad: &[f64], bounds: &[(f64, f64)]) -> f64 {
        params
            .iter()
            .zip(grad.iter())
            .zip(bounds.iter())
            .map(|((&x, &g), &(lo, hi))| {
                if self.projected {
                    ((x - g).clamp(lo, hi) - x).abs()
                } else {
                    g.abs()
                }
            })
            .fold(0.0, f64::max)
    }

    /// Armijo backtracking along `dir`, starting from the full quasi-Newton step
    #[allow(clippy::too_many_arguments)]
    fn line_search(
        &self,
        problem: &dyn Problem,
        params: &[f64],
        cost: f64,
        gradient: &[f64],
        dir: &[f64],
        bounds: &[(f64, f64)],
        cost_evals: &mut usize,
    ) -> Option<(Vec<f64>, f64)> {
        let mut alpha = 1.0;

        for _ in 0..self.max_backtracks {
            let mut trial: Vec<f64> = params
                .iter()
                .zip(dir.iter())
                .map(|(&x, &d)| x + alpha * d)
                .collect();
            self.project(&mut trial, bounds);

            let decrease: f64 = gradient
                .iter()
                .zip(trial.iter().zip(params.iter()))
                .map(|(&g, (&t, &x))| g * (t - x))
                .sum();

            if decrease < 0.0 {
                let new_cost = problem.cost(&trial);
                *cost_evals += 1;

                // Armijo condition: sufficient decrease
                if new_cost.is_finite() && new_cost <= cost + self.armijo_c * decrease {
                    return Some((trial, new_cost));
                }
            }

            // Backtrack
            alpha *= self.backtrack_factor;
        }

        None
    }
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// `d = -H g` restricted to the free variables
fn search_direction(inv_hessian: &[Vec<f64>], gradient: &[f64], free: &[bool]) -> Vec<f64> {
    inv_hessian
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if !free[i] {
                return 0.0;
            }
            -row.iter()
                .zip(gradient.iter())
                .zip(free.iter())
                .filter(|(_, is_free)| **is_free)
                .map(|((h, g), _)| h * g)
                .sum::<f64>()
        })
        .collect()
}

/// Inverse-Hessian BFGS update
///
/// `H+ = (I - rho s y') H (I - rho y s') + rho s s'`, expanded using `H y`.
fn bfgs_update(inv_hessian: &mut [Vec<f64>], s: &[f64], y: &[f64], sy: f64) {
    let n = s.len();
    let rho = 1.0 / sy;
    let hy: Vec<f64> = inv_hessian.iter().map(|row| dot(row, y)).collect();
    let yhy = dot(y, &hy);
    let ss_weight = rho * rho * yhy + rho;

    for i in 0..n {
        for j in 0..n {
            inv_hessian[i][j] += -rho * (hy[i] * s[j] + s[i] * hy[j]) + ss_weight * s[i] * s[j];
        }
    }
}

impl Solver for BfgsOptimizer {
    fn name(&self) -> &str {
        if self.projected {
            "ProjectedBFGS"
        } else {
            "BFGS"
        }
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> OptResult<SolverResult> {
        let n = problem.num_params();
        let bounds = problem.bounds();

        let mut params = problem.initial_params().to_vec();
        self.project(&mut params, bounds);

        let mut cost_evals = 0;
        let mut grad_evals = 0;

        let mut cost = problem.cost(&params);
        cost_evals += 1;

        let mut gradient = vec![0.0; n];
        cost_evals += central_gradient(|p| problem.cost(p), &params, &mut gradient);
        grad_evals += 1;

        let mut inv_hessian = identity(n);
        let mut scaled = false;

        let finish = |state: TerminalState,
                      params: Vec<f64>,
                      cost: f64,
                      iterations: u32,
                      cost_evals: usize,
                      grad_evals: usize| SolverResult {
            state,
            cost,
            iterations,
            params,
            cost_evals,
            grad_evals,
        };

        for iter in 0..self.max_iter {
            if !cost.is_finite() || cost.abs() >= LARGE_OBJECTIVE || !all_finite(&gradient) {
                return Ok(finish(
                    TerminalState::Failed(format!(
                        "objective diverged (cost {cost:e}) at iteration {}",
                        iter + 1
                    )),
                    params,
                    cost,
                    iter + 1,
                    cost_evals,
                    grad_evals,
                ));
            }

            callback.on_iteration(iter + 1, &params, cost)?;

            let measure = self.stationarity(&params, &gradient, bounds);
            if measure <= self.tolerance {
                return Ok(finish(
                    TerminalState::Converged,
                    params,
                    cost,
                    iter + 1,
                    cost_evals,
                    grad_evals,
                ));
            }

            if callback.should_stop() {
                return Ok(finish(
                    TerminalState::MaxIterationsReached,
                    params,
                    cost,
                    iter + 1,
                    cost_evals,
                    grad_evals,
                ));
            }

            let free = self.free_mask(&params, &gradient, bounds);
            let mut dir = search_direction(&inv_hessian, &gradient, &free);
            if dot(&gradient, &dir) >= 0.0 {
                debug!(iteration = iter + 1, "quasi-Newton direction not descent, resetting curvature");
                inv_hessian = identity(n);
                scaled = false;
                dir = search_direction(&inv_hessian, &gradient, &free);
            }

            let mut step = self.line_search(
                problem,
                &params,
                cost,
                &gradient,
                &dir,
                bounds,
                &mut cost_evals,
            );

            if step.is_none() && scaled {
                // Retry once along steepest descent before giving up
                inv_hessian = identity(n);
                scaled = false;
                dir = search_direction(&inv_hessian, &gradient, &free);
                step = self.line_search(
                    problem,
                    &params,
                    cost,
                    &gradient,
                    &dir,
                    bounds,
                    &mut cost_evals,
                );
            }

            let Some((new_params, new_cost)) = step else {
                let state = if measure <= STALL_FACTOR * self.tolerance {
                    debug!(iteration = iter + 1, measure, "line search stalled near a stationary point");
                    TerminalState::Converged
                } else {
                    TerminalState::Failed(format!(
                        "line search could not reduce the objective (gradient norm {measure:e})"
                    ))
                };
                return Ok(finish(state, params, cost, iter + 1, cost_evals, grad_evals));
            };

            let mut new_gradient = vec![0.0; n];
            cost_evals += central_gradient(|p| problem.cost(p), &new_params, &mut new_gradient);
            grad_evals += 1;

            if !all_finite(&new_params) || !all_finite(&new_gradient) {
                return Ok(finish(
                    TerminalState::Failed(format!(
                        "non-finite iterate or gradient at iteration {}",
                        iter + 1
                    )),
                    params,
                    cost,
                    iter + 1,
                    cost_evals,
                    grad_evals,
                ));
            }

            let s: Vec<f64> = new_params.iter().zip(&params).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = new_gradient.iter().zip(&gradient).map(|(a, b)| a - b).collect();

            let step_norm = s.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            let param_norm = new_params.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            let cost_change = (cost - new_cost).abs();

            params = new_params;
            cost = new_cost;
            gradient = new_gradient;

            if step_norm <= self.tolerance * (1.0 + param_norm)
                && cost_change <= self.tolerance * (1.0 + cost.abs())
            {
                // A short step only means convergence near a stationary point;
                // elsewhere it comes from curvature learned across a kink
                let measure = self.stationarity(&params, &gradient, bounds);
                if measure <= STALL_FACTOR * self.tolerance {
                    return Ok(finish(
                        TerminalState::Converged,
                        params,
                        cost,
                        iter + 1,
                        cost_evals,
                        grad_evals,
                    ));
                }
                debug!(
                    iteration = iter + 1,
                    measure, "step collapsed away from a stationary point, resetting curvature"
                );
                inv_hessian = identity(n);
                scaled = false;
                continue;
            }

            let sy = dot(&s, &y);
            let yy = dot(&y, &y);
            if sy > CURVATURE_EPS * dot(&s, &s).sqrt() * yy.sqrt() {
                if !scaled {
                    // Shanno-Phua scaling of the initial inverse Hessian
                    let gamma = sy / yy;
                    for (i, row) in inv_hessian.iter_mut().enumerate() {
                        for (j, h) in row.iter_mut().enumerate() {
                            *h = if i == j { gamma } else { 0.0 };
                        }
                    }
                    scaled = true;
                }
                bfgs_update(&mut inv_hessian, &s, &y, sy);

                if inv_hessian.iter().any(|row| !all_finite(row)) {
                    warn!(iteration = iter + 1, "inverse Hessian became non-finite, resetting");
                    inv_hessian = identity(n);
                    scaled = false;
                }
            } else {
                debug!(iteration = iter + 1, sy, "skipping curvature update");
            }
        }

        Ok(finish(
            TerminalState::MaxIterationsReached,
            params,
            cost,
            self.max_iter,
            cost_evals,
            grad_evals,
        ))
    }
}
