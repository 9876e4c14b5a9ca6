mod bfgs;
pub mod gradient;
mod lbfgs;
pub mod traits;

pub use bfgs::BfgsOptimizer;
pub use lbfgs::{DEFAULT_LBFGS_MEM, LbfgsOptimizer};
pub use traits::{NoCallback, OptimizationCallback, Problem, Solver, SolverResult};

use crate::core::{Engine, Method, OptimizerConfig};

/// Pick the solver for a validated configuration.
///
/// Returns the solver together with a short description of the choice for logging.
pub fn select_solver(config: &OptimizerConfig) -> (Box<dyn Solver>, String) {
    let max_iter = config.max_iterations;
    let tol = config.tolerance;

    match (config.method, config.engine) {
        (Method::Bounded, _) => (
            Box::new(BfgsOptimizer::projected(max_iter, tol)),
            "bounded → projected BFGS (iterates never leave the box)".to_string(),
        ),
        (Method::PenaltyUnconstrained, Engine::NativeBfgs) => (
            Box::new(BfgsOptimizer::new(max_iter, tol)),
            format!(
                "penalty (coefficient {:e}) → BFGS",
                config.penalty_coefficient
            ),
        ),
        (Method::PenaltyUnconstrained, Engine::ArgminLbfgs) => (
            Box::new(LbfgsOptimizer::new(max_iter, tol)),
            format!(
                "penalty (coefficient {:e}) → argmin L-BFGS (m={})",
                config.penalty_coefficient, DEFAULT_LBFGS_MEM
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_method_and_engine() {
        let config = OptimizerConfig::default();
        let (solver, _) = select_solver(&config);
        assert_eq!(solver.name(), "BFGS");

        let (solver, reason) = select_solver(&config.clone().with_method(Method::Bounded));
        assert_eq!(solver.name(), "ProjectedBFGS");
        assert!(reason.starts_with("bounded"));

        let (solver, _) = select_solver(&config.with_engine(Engine::ArgminLbfgs));
        assert!(solver.name().contains("L-BFGS"));
    }
}
