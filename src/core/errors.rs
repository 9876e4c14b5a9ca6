use super::types::{Engine, Method};
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Error)]
pub enum OptError {
    // ---- Bounds ----
    #[error("invalid bounds for {variable}: lower {lower} > upper {upper}")]
    InvalidBounds {
        variable: &'static str,
        lower: f64,
        upper: f64,
    },

    #[error("bounds for {variable} must be finite, got ({lower}, {upper})")]
    NonFiniteBounds {
        variable: &'static str,
        lower: f64,
        upper: f64,
    },

    // ---- Optimizer configuration ----
    #[error("invalid max_iterations {max_iterations}: must be greater than zero")]
    InvalidMaxIterations { max_iterations: u32 },

    #[error("invalid tolerance {tolerance}: must be finite and strictly positive")]
    InvalidTolerance { tolerance: f64 },

    #[error("invalid penalty coefficient {coefficient}: must be finite and non-negative")]
    InvalidPenaltyCoefficient { coefficient: f64 },

    #[error("engine '{engine}' does not support the '{method}' method")]
    UnsupportedEngine { engine: Engine, method: Method },

    #[error("unknown method '{0}': expected 'penalty+unconstrained' or 'bounded'")]
    UnknownMethod(String),

    #[error("unknown engine '{0}': expected 'native-bfgs' or 'argmin-lbfgs'")]
    UnknownEngine(String),

    #[error("unknown decision variable '{0}': expected C_p, X_0, k_E or k_pH")]
    UnknownVariable(String),

    // ---- Model inputs ----
    #[error("invalid model parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("initial guess for {variable} must be finite, got {value}")]
    NonFiniteInitialGuess { variable: &'static str, value: f64 },

    #[error("invalid sampling request: {0}")]
    InvalidSampling(String),

    // ---- Runtime ----
    #[error("argmin backend error: {0}")]
    Backend(String),

    // ---- Config files ----
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl OptError {
    /// Malformed run inputs, rejected before any evaluation.
    ///
    /// File access, JSON syntax, sampling requests and backend failures are
    /// reported separately.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidBounds { .. }
                | Self::NonFiniteBounds { .. }
                | Self::InvalidMaxIterations { .. }
                | Self::InvalidTolerance { .. }
                | Self::InvalidPenaltyCoefficient { .. }
                | Self::UnsupportedEngine { .. }
                | Self::UnknownMethod(_)
                | Self::UnknownEngine(_)
                | Self::UnknownVariable(_)
                | Self::InvalidParameter { .. }
                | Self::NonFiniteInitialGuess { .. }
        )
    }
}

impl From<argmin::core::Error> for OptError {
    fn from(err: argmin::core::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = OptError::InvalidBounds {
            variable: "X_0",
            lower: 5.0,
            upper: 1.0,
        };
        assert_eq!(err.to_string(), "invalid bounds for X_0: lower 5 > upper 1");

        let err = OptError::UnsupportedEngine {
            engine: Engine::ArgminLbfgs,
            method: Method::Bounded,
        };
        assert!(err.to_string().contains("argmin-lbfgs"));
        assert!(err.is_configuration());
    }

    #[test]
    fn io_parse_and_sampling_errors_are_not_configuration() {
        let read = OptError::ConfigRead {
            path: PathBuf::from("run.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(!read.is_configuration());

        let parse: OptError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(!parse.is_configuration());

        assert!(!OptError::InvalidSampling("1 point".into()).is_configuration());
        assert!(OptError::UnknownMethod("simplex".into()).is_configuration());
        assert!(OptError::InvalidTolerance { tolerance: 0.0 }.is_configuration());
    }

    #[test]
    fn backend_errors_are_not_configuration() {
        let err: OptError = argmin::core::Error::msg("line search failed").into();
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("line search failed"));
    }
}
