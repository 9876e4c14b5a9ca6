//! Run configuration loaded from JSON.
//!
//! Every section is optional; missing sections and fields fall back to the
//! baseline model, `[0, 10]` bounds, the `(1, 1, 0.1, 0.1)` starting guess
//! and the default optimizer settings.

use crate::core::{
    Bounds, DecisionVector, OptError, OptResult, OptimizerConfig, ParameterSet, validate_run,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Complete description of one optimizer run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSpec {
    pub parameters: ParameterSet,
    pub bounds: Bounds,
    pub initial_guess: DecisionVector,
    pub optimizer: OptimizerConfig,
}

impl RunSpec {
    pub fn from_json_str(contents: &str) -> OptResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Read and validate a JSON run file
    pub fn from_path(path: impl AsRef<Path>) -> OptResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| OptError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let spec = Self::from_json_str(&contents)?;
        spec.validate()?;
        debug!(path = %path.display(), "loaded run configuration");
        Ok(spec)
    }

    pub fn validate(&self) -> OptResult<()> {
        validate_run(
            &self.parameters,
            &self.bounds,
            &self.initial_guess,
            &self.optimizer,
        )
    }

    pub fn to_json_pretty(&self) -> OptResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Engine, Method};

    #[test]
    fn empty_document_is_the_baseline_run() {
        let spec = RunSpec::from_json_str("{}").unwrap();
        assert_eq!(spec, RunSpec::default());
        assert_eq!(spec.parameters, ParameterSet::baseline());
        assert_eq!(spec.initial_guess, DecisionVector::new(1.0, 1.0, 0.1, 0.1));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let spec = RunSpec::from_json_str(
            r#"{
                "parameters": { "price": 12.5, "gamma1": 0.02 },
                "bounds": { "substrate": [0.5, 8.0] },
                "optimizer": { "method": "bounded", "tolerance": 1e-8 }
            }"#,
        )
        .unwrap();

        assert_eq!(spec.parameters.price, 12.5);
        assert_eq!(spec.parameters.gamma1, 0.02);
        assert_eq!(spec.parameters.k_s, 1.0);
        assert_eq!(spec.bounds.substrate, (0.5, 8.0));
        assert_eq!(spec.bounds.biomass, (0.0, 10.0));
        assert_eq!(spec.optimizer.method, Method::Bounded);
        assert_eq!(spec.optimizer.engine, Engine::NativeBfgs);
        assert_eq!(spec.optimizer.tolerance, 1e-8);
        assert_eq!(spec.optimizer.max_iterations, 500);
    }

    #[test]
    fn unknown_method_is_a_parse_error() {
        let err = RunSpec::from_json_str(r#"{ "optimizer": { "method": "simplex" } }"#).unwrap_err();
        assert!(matches!(err, OptError::ConfigParse(_)));
    }

    #[test]
    fn round_trips_through_pretty_json() {
        let spec = RunSpec::default();
        let json = spec.to_json_pretty().unwrap();
        assert_eq!(RunSpec::from_json_str(&json).unwrap(), spec);
    }
}
