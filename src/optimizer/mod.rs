mod report;

use crate::core::{
    Bounds, DecisionVector, OptResult, OptimizationReport, OptimizerConfig, ParameterSet,
    TerminalState, validate_run,
};
use crate::optimization::{ProfitProblem, RunCallback, select_solver};
use report::{build_report, final_point};
use tracing::{info, warn};

/// Optimizer driver bound to one configuration.
///
/// Holds no state between runs, so one `Optimizer` may be shared across
/// threads and used for any number of independent runs.
#[derive(Clone, Debug, Default)]
pub struct Optimizer {
    pub config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn optimize(
        &self,
        parameters: &ParameterSet,
        bounds: &Bounds,
        initial: DecisionVector,
    ) -> OptResult<OptimizationReport> {
        optimize(parameters, bounds, initial, &self.config)
    }
}

/// Search for the profit-maximizing operating point.
///
/// Inputs are validated before the objective is evaluated even once. The
/// returned report always carries a point inside `bounds`; whether the search
/// converged, hit the iteration cap or failed is recorded in its `state`.
pub fn optimize(
    parameters: &ParameterSet,
    bounds: &Bounds,
    initial: DecisionVector,
    config: &OptimizerConfig,
) -> OptResult<OptimizationReport> {
    validate_run(parameters, bounds, &initial, config)?;

    let problem = ProfitProblem::new(parameters, bounds, initial, config);
    let (mut solver, reason) = select_solver(config);

    info!(
        method = %config.method,
        engine = %config.engine,
        solver = solver.name(),
        start = %initial,
        max_iterations = config.max_iterations,
        tolerance = config.tolerance,
        "optimization start: {reason}"
    );

    let mut callback = RunCallback::new(config.record_history);
    let result = solver.solve(&problem, &mut callback)?;

    let point = final_point(&result, callback.last_finite(), &initial, bounds);
    let report = build_report(
        point,
        &result,
        parameters,
        bounds,
        config,
        callback.into_history(),
    );

    match &report.state {
        TerminalState::Converged => {}
        TerminalState::MaxIterationsReached => warn!(
            iterations = report.iterations,
            "iteration cap reached before convergence"
        ),
        TerminalState::Failed(reason) => warn!(
            iterations = report.iterations,
            reason = reason.as_str(),
            "optimization failed, reporting last finite point"
        ),
    }

    info!(
        state = %report.state,
        iterations = report.iterations,
        cost_evals = report.cost_evals,
        profit = report.profit,
        decision = %report.decision,
        "optimization complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Method, OptError};
    use crate::objective::profit;
    use crate::optimization::{BfgsOptimizer, NoCallback, Solver};

    #[test]
    fn baseline_converges_to_a_better_point() {
        let parameters = ParameterSet::baseline();
        let bounds = Bounds::default();
        let start = DecisionVector::new(1.0, 1.0, 0.1, 0.1);

        let report = optimize(&parameters, &bounds, start, &OptimizerConfig::default()).unwrap();

        assert_eq!(report.state, TerminalState::Converged);
        assert!(report.profit > 0.0);
        assert!(report.profit > profit(&start, &parameters));
        assert!(bounds.contains(&report.decision));
    }

    #[test]
    fn invalid_bounds_fail_before_search() {
        let mut bounds = Bounds::default();
        bounds.biomass = (5.0, 1.0);
        let err = optimize(
            &ParameterSet::baseline(),
            &bounds,
            DecisionVector::default(),
            &OptimizerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptError::InvalidBounds { variable: "X_0", .. }));
    }

    #[test]
    fn history_is_recorded_when_enabled() {
        let optimizer = Optimizer::new(OptimizerConfig::default().with_method(Method::Bounded));
        let report = optimizer
            .optimize(&ParameterSet::baseline(), &Bounds::default(), DecisionVector::default())
            .unwrap();
        assert!(!report.history.is_empty());
        assert!(report.history.windows(2).all(|w| w[0].iteration < w[1].iteration));
    }

    #[test]
    fn iteration_cap_allows_that_many_steps() {
        let parameters = ParameterSet::baseline();
        let bounds = Bounds::default();
        let start = DecisionVector::default();

        for cap in [1, 2] {
            let config = OptimizerConfig::default().with_max_iterations(cap);
            let report = optimize(&parameters, &bounds, start, &config).unwrap();
            assert_eq!(report.state, TerminalState::MaxIterationsReached);
            assert_eq!(report.iterations, cap);
            assert_ne!(report.unclamped, start);

            // The driver's callback must not cut the search short
            let problem = ProfitProblem::new(&parameters, &bounds, start, &config);
            let direct = BfgsOptimizer::new(cap, config.tolerance)
                .solve(&problem, &mut NoCallback)
                .unwrap();
            assert_eq!(report.unclamped.to_array().to_vec(), direct.params);
        }
    }
}
