//! Resampling of the objective for sensitivity curves and surfaces.
//!
//! These helpers call the evaluator directly and never run the optimizer,
//! so they can be pointed at an optimizer report or any other point.

use crate::core::{Bounds, DecisionVector, EvaluationResult, OptError, OptResult, ParameterSet, Variable};
use crate::objective::evaluate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One sample of a profile
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub value: f64,
    pub evaluation: EvaluationResult,
}

/// Profit on a regular 2-D grid; `profit[i][j]` sits at `(x_values[j], y_values[i])`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub x: Variable,
    pub y: Variable,
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
    pub profit: Vec<Vec<f64>>,
}

impl Surface {
    /// Grid point with the highest profit as `(x, y, profit)`
    pub fn peak(&self) -> Option<(f64, f64, f64)> {
        self.profit
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &p)| (i, j, p)))
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(i, j, p)| (self.x_values[j], self.y_values[i], p))
    }
}

/// `points` evenly spaced values covering `[lower, upper]`, both ends included
fn linspace(lower: f64, upper: f64, points: usize) -> Vec<f64> {
    let step = (upper - lower) / (points - 1) as f64;
    (0..points)
        .map(|k| if k + 1 == points { upper } else { lower + step * k as f64 })
        .collect()
}

fn check_points(points: usize) -> OptResult<()> {
    if points < 2 {
        return Err(OptError::InvalidSampling(format!(
            "need at least 2 points per axis, got {points}"
        )));
    }
    Ok(())
}

/// Sweep one variable across its bounds with the others held at `center`
pub fn profile(
    parameters: &ParameterSet,
    bounds: &Bounds,
    center: &DecisionVector,
    variable: Variable,
    points: usize,
    penalty_coefficient: f64,
) -> OptResult<Vec<ProfilePoint>> {
    check_points(points)?;
    crate::core::validate_bounds(bounds)?;

    let (lower, upper) = bounds.get(variable);
    Ok(linspace(lower, upper, points)
        .into_iter()
        .map(|value| ProfilePoint {
            value,
            evaluation: evaluate(
                &center.with(variable, value),
                parameters,
                bounds,
                penalty_coefficient,
            ),
        })
        .collect())
}

/// Profit over a `points x points` grid of two variables, rows in parallel
pub fn surface(
    parameters: &ParameterSet,
    bounds: &Bounds,
    center: &DecisionVector,
    x: Variable,
    y: Variable,
    points: usize,
) -> OptResult<Surface> {
    check_points(points)?;
    if x == y {
        return Err(OptError::InvalidSampling(format!(
            "surface axes must differ, both are {x}"
        )));
    }
    crate::core::validate_bounds(bounds)?;

    let (x_lo, x_hi) = bounds.get(x);
    let (y_lo, y_hi) = bounds.get(y);
    let x_values = linspace(x_lo, x_hi, points);
    let y_values = linspace(y_lo, y_hi, points);

    let profit = y_values
        .par_iter()
        .map(|&yv| {
            let row_center = center.with(y, yv);
            x_values
                .iter()
                .map(|&xv| evaluate(&row_center.with(x, xv), parameters, bounds, 0.0).profit())
                .collect()
        })
        .collect();

    Ok(Surface {
        x,
        y,
        x_values,
        y_values,
        profit,
    })
}
