use crate::core::{
    Bounds, DecisionVector, IterationRecord, OptimizationReport, OptimizerConfig, ParameterSet,
    TerminalState, violation_amounts,
};
use crate::objective::evaluate;
use crate::optimization::SolverResult;

/// Where the reported point came from, before clamping
pub(crate) struct FinalPoint {
    pub unclamped: DecisionVector,
    pub state: TerminalState,
}

/// Choose the pre-clamp point for the report.
///
/// The solver's final point is used when finite. Otherwise fall back to the
/// last finite iterate seen by the callback, then to the clamped starting
/// guess, and mark the run failed.
pub(crate) fn final_point(
    result: &SolverResult,
    last_finite: Option<&[f64]>,
    initial: &DecisionVector,
    bounds: &Bounds,
) -> FinalPoint {
    if let Some(v) = DecisionVector::from_slice(&result.params).filter(DecisionVector::is_finite) {
        return FinalPoint {
            unclamped: v,
            state: result.state.clone(),
        };
    }

    let reason = match &result.state {
        TerminalState::Failed(reason) => reason.clone(),
        _ => "solver returned a non-finite point".to_string(),
    };
    let unclamped = last_finite
        .and_then(DecisionVector::from_slice)
        .filter(DecisionVector::is_finite)
        .unwrap_or_else(|| bounds.clamp(initial));

    FinalPoint {
        unclamped,
        state: TerminalState::Failed(reason),
    }
}

/// Clamp, re-evaluate and package the outcome of a run
pub(crate) fn build_report(
    point: FinalPoint,
    result: &SolverResult,
    parameters: &ParameterSet,
    bounds: &Bounds,
    config: &OptimizerConfig,
    history: Vec<IterationRecord>,
) -> OptimizationReport {
    let pairs = bounds.pairs();
    let raw = point.unclamped.to_array();

    let mut violations = [0.0; 4];
    violations.copy_from_slice(&violation_amounts(&raw, &pairs));

    let decision = bounds.clamp(&point.unclamped);
    let evaluation = evaluate(&decision, parameters, bounds, config.penalty_coefficient);

    let solver_objective = if result.cost.is_finite() {
        result.cost
    } else {
        evaluation.objective
    };

    OptimizationReport {
        decision,
        unclamped: point.unclamped,
        state: point.state,
        method: config.method,
        engine: config.engine,
        iterations: result.iterations,
        cost_evals: result.cost_evals,
        grad_evals: result.grad_evals,
        evaluation,
        profit: evaluation.profit(),
        violations,
        solver_objective,
        history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_at(params: Vec<f64>, state: TerminalState) -> SolverResult {
        SolverResult {
            state,
            cost: -1.0,
            iterations: 3,
            params,
            cost_evals: 10,
            grad_evals: 3,
        }
    }

    #[test]
    fn report_is_clamped_and_reevaluated() {
        let parameters = ParameterSet::baseline();
        let bounds = Bounds::default();
        let config = OptimizerConfig::default();
        let result = result_at(vec![1.5, 1.2, -0.25, 10.5], TerminalState::Converged);

        let point = final_point(&result, None, &DecisionVector::default(), &bounds);
        let report = build_report(point, &result, &parameters, &bounds, &config, Vec::new());

        assert_eq!(report.decision, DecisionVector::new(1.5, 1.2, 0.0, 10.0));
        assert_eq!(report.violations, [0.0, 0.0, -0.25, 0.5]);
        assert!(report.required_clamping());
        assert_eq!(report.evaluation.penalty, 0.0);
        assert_eq!(
            report.evaluation,
            evaluate(&report.decision, &parameters, &bounds, config.penalty_coefficient)
        );
        assert_eq!(report.profit, report.evaluation.profit());
    }

    #[test]
    fn non_finite_result_falls_back_to_last_finite_iterate() {
        let bounds = Bounds::default();
        let result = result_at(vec![f64::NAN, 1.0, 0.1, 0.1], TerminalState::Converged);

        let point = final_point(&result, Some(&[2.0, 2.0, 0.5, 0.5][..]), &DecisionVector::default(), &bounds);
        assert_eq!(point.unclamped, DecisionVector::new(2.0, 2.0, 0.5, 0.5));
        assert!(matches!(point.state, TerminalState::Failed(_)));
    }

    #[test]
    fn without_history_falls_back_to_clamped_start() {
        let bounds = Bounds::default();
        let result = result_at(vec![f64::INFINITY; 4], TerminalState::Failed("diverged".into()));
        let start = DecisionVector::new(-1.0, 12.0, 0.1, 0.1);

        let point = final_point(&result, None, &start, &bounds);
        assert_eq!(point.unclamped, DecisionVector::new(0.0, 10.0, 0.1, 0.1));
        assert_eq!(point.state, TerminalState::Failed("diverged".into()));
    }
}
