use super::errors::{OptError, OptResult};
use super::types::{Bounds, DecisionVector, Engine, Method, OptimizerConfig, ParameterSet, Variable};

/// Clamp each parameter into its `(min, max)` pair
#[inline]
pub fn clamp_to_bounds(params: &mut [f64], bounds: &[(f64, f64)]) {
    for (value, &(min, max)) in params.iter_mut().zip(bounds.iter()) {
        *value = value.clamp(min, max);
    }
}

/// Signed distance by which each value lies outside its bounds.
///
/// Negative below the lower bound, positive above the upper bound, zero
/// inside.
pub fn violation_amounts(params: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    params
        .iter()
        .zip(bounds.iter())
        .map(|(&v, &(lo, hi))| {
            if v < lo {
                v - lo
            } else if v > hi {
                v - hi
            } else {
                0.0
            }
        })
        .collect()
}

/// Validate bounds before a run
///
/// Every pair must be finite with `lower <= upper`.
pub fn validate_bounds(bounds: &Bounds) -> OptResult<()> {
    for variable in Variable::ALL {
        let (lower, upper) = bounds.get(variable);
        if !lower.is_finite() || !upper.is_finite() {
            return Err(OptError::NonFiniteBounds {
                variable: variable.symbol(),
                lower,
                upper,
            });
        }
        if lower > upper {
            return Err(OptError::InvalidBounds {
                variable: variable.symbol(),
                lower,
                upper,
            });
        }
    }
    Ok(())
}

/// All coefficients must be finite and the saturation constant positive
pub fn validate_parameters(parameters: &ParameterSet) -> OptResult<()> {
    for (name, value) in parameters.named_values() {
        if !value.is_finite() {
            return Err(OptError::InvalidParameter {
                name,
                value,
                reason: "must be finite",
            });
        }
    }
    if parameters.k_s <= 0.0 {
        return Err(OptError::InvalidParameter {
            name: "k_s",
            value: parameters.k_s,
            reason: "saturation constant must be strictly positive",
        });
    }
    Ok(())
}

pub fn validate_initial_guess(guess: &DecisionVector) -> OptResult<()> {
    for variable in Variable::ALL {
        let value = guess.get(variable);
        if !value.is_finite() {
            return Err(OptError::NonFiniteInitialGuess {
                variable: variable.symbol(),
                value,
            });
        }
    }
    Ok(())
}

pub fn validate_config(config: &OptimizerConfig) -> OptResult<()> {
    if config.max_iterations == 0 {
        return Err(OptError::InvalidMaxIterations {
            max_iterations: config.max_iterations,
        });
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(OptError::InvalidTolerance {
            tolerance: config.tolerance,
        });
    }
    if !config.penalty_coefficient.is_finite() || config.penalty_coefficient < 0.0 {
        return Err(OptError::InvalidPenaltyCoefficient {
            coefficient: config.penalty_coefficient,
        });
    }
    if config.engine == Engine::ArgminLbfgs && config.method == Method::Bounded {
        return Err(OptError::UnsupportedEngine {
            engine: config.engine,
            method: config.method,
        });
    }
    Ok(())
}

/// Validate every run input
///
/// Checks the configuration first, then bounds, then the model, then the
/// starting point. Returns the first failure.
pub fn validate_run(
    parameters: &ParameterSet,
    bounds: &Bounds,
    initial: &DecisionVector,
    config: &OptimizerConfig,
) -> OptResult<()> {
    validate_config(config)?;
    validate_bounds(bounds)?;
    validate_parameters(parameters)?;
    validate_initial_guess(initial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_are_signed() {
        let bounds = [(0.0, 10.0); 4];
        let v = violation_amounts(&[-2.0, 5.0, 13.0, 10.0], &bounds);
        assert_eq!(v, vec![-2.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn inverted_bounds_are_rejected_by_name() {
        let mut bounds = Bounds::default();
        bounds.biomass = (4.0, 2.0);
        match validate_bounds(&bounds) {
            Err(OptError::InvalidBounds { variable, lower, upper }) => {
                assert_eq!(variable, "X_0");
                assert_eq!((lower, upper), (4.0, 2.0));
            }
            other => panic!("expected InvalidBounds, got {other:?}"),
        }
    }

    #[test]
    fn degenerate_bounds_are_allowed() {
        let bounds = Bounds::uniform(3.0, 3.0);
        assert!(validate_bounds(&bounds).is_ok());
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let mut bounds = Bounds::default();
        bounds.ph_gain = (0.0, f64::INFINITY);
        assert!(matches!(
            validate_bounds(&bounds),
            Err(OptError::NonFiniteBounds { variable: "k_pH", .. })
        ));
    }

    #[test]
    fn config_checks() {
        let config = OptimizerConfig::default().with_max_iterations(0);
        assert!(matches!(
            validate_config(&config),
            Err(OptError::InvalidMaxIterations { .. })
        ));

        for tolerance in [0.0, -1e-6, f64::NAN] {
            let config = OptimizerConfig::default().with_tolerance(tolerance);
            assert!(matches!(
                validate_config(&config),
                Err(OptError::InvalidTolerance { .. })
            ));
        }

        let config = OptimizerConfig::default().with_penalty_coefficient(-1.0);
        assert!(matches!(
            validate_config(&config),
            Err(OptError::InvalidPenaltyCoefficient { .. })
        ));

        let config = OptimizerConfig::default()
            .with_method(Method::Bounded)
            .with_engine(Engine::ArgminLbfgs);
        assert!(matches!(
            validate_config(&config),
            Err(OptError::UnsupportedEngine { .. })
        ));

        assert!(validate_config(&OptimizerConfig::default()).is_ok());
    }

    #[test]
    fn parameter_checks() {
        let mut parameters = ParameterSet::baseline();
        parameters.k_s = 0.0;
        assert!(matches!(
            validate_parameters(&parameters),
            Err(OptError::InvalidParameter { name: "k_s", .. })
        ));

        let mut parameters = ParameterSet::baseline();
        parameters.e2 = f64::NAN;
        assert!(matches!(
            validate_parameters(&parameters),
            Err(OptError::InvalidParameter { name: "e2", .. })
        ));
    }

    #[test]
    fn initial_guess_must_be_finite() {
        let guess = DecisionVector::new(1.0, f64::NAN, 0.0, 0.0);
        assert!(matches!(
            validate_initial_guess(&guess),
            Err(OptError::NonFiniteInitialGuess { variable: "X_0", .. })
        ));
    }
}
