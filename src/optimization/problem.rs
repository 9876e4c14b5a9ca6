use crate::core::{Bounds, DecisionVector, OptimizerConfig, ParameterSet, clamp_to_bounds};
use crate::objective::evaluate;
use crate::optimization::solvers::traits::Problem;

/// Profit maximization posed as minimization of the search objective.
///
/// Borrows the run's constants and bounds; holds no mutable state, so
/// evaluating the same point twice gives the same value.
pub struct ProfitProblem<'a> {
    parameters: &'a ParameterSet,
    bounds: &'a Bounds,
    penalty_coefficient: f64,
    initial: Vec<f64>,
    bound_pairs: Vec<(f64, f64)>,
}

impl<'a> ProfitProblem<'a> {
    pub fn new(
        parameters: &'a ParameterSet,
        bounds: &'a Bounds,
        initial: DecisionVector,
        config: &OptimizerConfig,
    ) -> Self {
        let bound_pairs = bounds.pairs().to_vec();
        let mut initial = initial.to_array().to_vec();
        if !config.method.uses_penalty() {
            clamp_to_bounds(&mut initial, &bound_pairs);
        }

        Self {
            parameters,
            bounds,
            penalty_coefficient: config.search_penalty(),
            initial,
            bound_pairs,
        }
    }

    pub fn penalty_coefficient(&self) -> f64 {
        self.penalty_coefficient
    }

    pub fn parameters(&self) -> &ParameterSet {
        self.parameters
    }
}

impl Problem for ProfitProblem<'_> {
    fn cost(&self, params: &[f64]) -> f64 {
        match DecisionVector::from_slice(params) {
            Some(v) => evaluate(&v, self.parameters, self.bounds, self.penalty_coefficient).objective,
            None => f64::NAN,
        }
    }

    fn num_params(&self) -> usize {
        self.initial.len()
    }

    fn initial_params(&self) -> &[f64] {
        &self.initial
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &self.bound_pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Method;
    use crate::objective::profit;

    #[test]
    fn cost_is_negative_profit_inside_bounds() {
        let parameters = ParameterSet::baseline();
        let bounds = Bounds::default();
        let start = DecisionVector::default();
        let problem = ProfitProblem::new(&parameters, &bounds, start, &OptimizerConfig::default());

        assert_eq!(problem.num_params(), 4);
        assert_eq!(problem.cost(&start.to_array()), -profit(&start, &parameters));
    }

    #[test]
    fn bounded_problem_skips_penalty_and_clamps_start() {
        let parameters = ParameterSet::baseline();
        let bounds = Bounds::default();
        let start = DecisionVector::new(-2.0, 11.0, 0.1, 0.1);
        let config = OptimizerConfig::default().with_method(Method::Bounded);
        let problem = ProfitProblem::new(&parameters, &bounds, start, &config);

        assert_eq!(problem.penalty_coefficient(), 0.0);
        assert_eq!(problem.initial_params(), &[0.0, 10.0, 0.1, 0.1]);
    }

    #[test]
    fn penalty_problem_keeps_start_as_given() {
        let parameters = ParameterSet::baseline();
        let bounds = Bounds::default();
        let start = DecisionVector::new(-2.0, 11.0, 0.1, 0.1);
        let problem = ProfitProblem::new(&parameters, &bounds, start, &OptimizerConfig::default());

        assert_eq!(problem.initial_params(), &[-2.0, 11.0, 0.1, 0.1]);
        assert!(problem.cost(problem.initial_params()).is_finite());
    }

    #[test]
    fn wrong_arity_is_not_a_number() {
        let parameters = ParameterSet::baseline();
        let bounds = Bounds::default();
        let problem = ProfitProblem::new(
            &parameters,
            &bounds,
            DecisionVector::default(),
            &OptimizerConfig::default(),
        );
        assert!(problem.cost(&[1.0, 2.0]).is_nan());
    }
}
