//! Profit-maximizing operating point search for a fermentation process.
//!
//! The objective evaluator ([`evaluate`]) is a pure function of a decision
//! vector and the model constants. The driver ([`optimize`]) runs a
//! quasi-Newton search on it, either with a soft bound penalty or with
//! projection onto the bounds, and packages a clamped, re-evaluated
//! [`OptimizationReport`].

pub mod config;
mod core;
pub mod objective;
pub mod optimization;
mod optimizer;
pub mod sensitivity;
pub mod sweep;

pub use config::RunSpec;
pub use self::core::*;
pub use objective::{LARGE_OBJECTIVE, evaluate, profit};
pub use optimizer::{Optimizer, optimize};
pub use sensitivity::{ProfilePoint, Surface, profile, surface};
pub use sweep::{best_report, multi_start, parameter_sweep, random_guesses};
