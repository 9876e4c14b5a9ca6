use super::solvers::traits::OptimizationCallback;
use crate::core::{DecisionVector, IterationRecord, OptResult};
use tracing::debug;

/// Tracks progress of one optimizer run.
///
/// Owned by the driver for the duration of a run; nothing here is shared
/// between runs. The iteration cap belongs to the solver, so this callback
/// never asks it to stop.
pub struct RunCallback {
    record_history: bool,
    iteration_count: u32,
    history: Vec<IterationRecord>,
    last_finite: Option<Vec<f64>>,
}

impl RunCallback {
    pub fn new(record_history: bool) -> Self {
        Self {
            record_history,
            iteration_count: 0,
            history: Vec::new(),
            last_finite: None,
        }
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn into_history(self) -> Vec<IterationRecord> {
        self.history
    }

    pub fn iterations(&self) -> u32 {
        self.iteration_count
    }

    /// Most recent iterate whose coordinates were all finite
    pub fn last_finite(&self) -> Option<&[f64]> {
        self.last_finite.as_deref()
    }
}

impl OptimizationCallback for RunCallback {
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) -> OptResult<()> {
        self.iteration_count = iteration;

        debug!(iteration, objective = cost, params = ?params, "iteration");

        if !params.iter().all(|v| v.is_finite()) {
            return Ok(());
        }
        self.last_finite = Some(params.to_vec());

        if self.record_history {
            if let Some(v) = DecisionVector::from_slice(params) {
                self.history.push(IterationRecord {
                    iteration,
                    params: v,
                    objective: cost,
                });
            }
        }

        Ok(())
    }
}
