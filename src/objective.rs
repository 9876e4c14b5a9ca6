//! Profit model and penalized objective.
//!
//! Everything here is a pure function of its arguments: no state, no I/O,
//! and no input can make it fail. Infeasible or numerically hostile inputs
//! show up as large but finite objective values.

use crate::core::{
    Bounds, CostBreakdown, DecisionVector, EvaluationResult, ParameterSet, RevenueFactors,
};

/// Magnitude substituted for non-finite intermediate results
pub const LARGE_OBJECTIVE: f64 = 1e100;

/// Weight of the quadratic guard applied when `C_p` or `X_0` is negative
pub const DOMAIN_PENALTY_WEIGHT: f64 = 1e6;

/// Clamp into `[-LARGE_OBJECTIVE, LARGE_OBJECTIVE]`, mapping NaN to `nan_value`
#[inline]
fn saturate(x: f64, nan_value: f64) -> f64 {
    if x.is_nan() {
        nan_value
    } else {
        x.clamp(-LARGE_OBJECTIVE, LARGE_OBJECTIVE)
    }
}

/// Monod term `C_p / (K_s + C_p)`
#[inline]
pub fn saturation_factor(c_p: f64, k_s: f64) -> f64 {
    c_p / (k_s + c_p)
}

/// `1 - exp(-alpha_R * X_0)`
#[inline]
pub fn biomass_factor(x_0: f64, alpha_r: f64) -> f64 {
    -(-alpha_r * x_0).exp_m1()
}

/// `1 - C_p^2 / (C_inhib^2 + C_p^2)`
#[inline]
pub fn inhibition_factor(c_p: f64, c_inhib: f64) -> f64 {
    let p2 = c_p * c_p;
    let denom = c_inhib * c_inhib + p2;
    if denom == 0.0 {
        1.0
    } else if p2.is_infinite() {
        0.0
    } else {
        1.0 - p2 / denom
    }
}

/// `1 + gamma_1 C_p X_0 + gamma_2 k_E k_pH`; negative values are legitimate
#[inline]
pub fn synergy_factor(c_p: f64, x_0: f64, k_e: f64, k_ph: f64, p: &ParameterSet) -> f64 {
    1.0 + p.gamma1 * c_p * x_0 + p.gamma2 * k_e * k_ph
}

pub fn material_cost(c_p: f64, x_0: f64, p: &ParameterSet) -> f64 {
    p.a1 * c_p + p.a2 * c_p * c_p + p.b1 * x_0 + p.b2 * x_0 * x_0 + p.c1 * c_p * x_0
}

pub fn operational_cost(c_p: f64, x_0: f64, k_e: f64, k_ph: f64, p: &ParameterSet) -> f64 {
    p.d1 * k_e * k_e
        + p.d2 * k_ph * k_ph
        + p.d3 * k_e * k_ph
        + p.e1 * c_p * k_e
        + p.e2 * x_0 * k_ph
}

/// Quadratic bound-violation penalty
///
/// `coefficient * sum(max(0, lo - v)^2 + max(0, v - hi)^2)`; exactly zero
/// when every value lies inside its bounds.
pub fn bound_penalty(values: &[f64], bounds: &[(f64, f64)], coefficient: f64) -> f64 {
    if coefficient == 0.0 {
        return 0.0;
    }
    let total: f64 = values
        .iter()
        .zip(bounds.iter())
        .map(|(&v, &(lo, hi))| {
            let below = (lo - v).max(0.0);
            let above = (v - hi).max(0.0);
            below * below + above * above
        })
        .sum();
    saturate(coefficient * total, LARGE_OBJECTIVE)
}

/// Evaluate revenue, cost, penalty and the objective to minimize.
///
/// The factor formulas assume `C_p >= 0` and `X_0 >= 0`. Negative values are
/// evaluated at their non-negative projection and pay a quadratic domain
/// penalty, so the objective stays continuous and slopes back toward the
/// valid region. Non-finite inputs produce `LARGE_OBJECTIVE`.
pub fn evaluate(
    v: &DecisionVector,
    parameters: &ParameterSet,
    bounds: &Bounds,
    penalty_coefficient: f64,
) -> EvaluationResult {
    if !v.is_finite() {
        return EvaluationResult {
            revenue: 0.0,
            cost: LARGE_OBJECTIVE,
            penalty: LARGE_OBJECTIVE,
            domain_penalty: 0.0,
            objective: LARGE_OBJECTIVE,
            factors: RevenueFactors::default(),
            costs: CostBreakdown::default(),
        };
    }

    let [c_p_raw, x_0_raw, k_e, k_ph] = v.to_array();
    let c_p = c_p_raw.max(0.0);
    let x_0 = x_0_raw.max(0.0);

    let domain_distance_sq = c_p_raw.min(0.0).powi(2) + x_0_raw.min(0.0).powi(2);
    let domain_penalty = saturate(DOMAIN_PENALTY_WEIGHT * domain_distance_sq, LARGE_OBJECTIVE);

    let factors = RevenueFactors {
        saturation: saturation_factor(c_p, parameters.k_s),
        biomass: biomass_factor(x_0, parameters.alpha_r),
        inhibition: inhibition_factor(c_p, parameters.c_inhib),
        synergy: synergy_factor(c_p, x_0, k_e, k_ph, parameters),
    };
    let revenue = saturate(
        parameters.price
            * factors.saturation
            * factors.biomass
            * factors.inhibition
            * factors.synergy,
        0.0,
    );

    let costs = CostBreakdown {
        material: saturate(material_cost(c_p, x_0, parameters), LARGE_OBJECTIVE),
        operational: saturate(operational_cost(c_p, x_0, k_e, k_ph, parameters), LARGE_OBJECTIVE),
    };
    let cost = saturate(costs.material + costs.operational, LARGE_OBJECTIVE);

    let penalty = bound_penalty(&v.to_array(), &bounds.pairs(), penalty_coefficient);
    let objective = saturate(
        -(revenue - cost) + penalty + domain_penalty,
        LARGE_OBJECTIVE,
    );

    EvaluationResult {
        revenue,
        cost,
        penalty,
        domain_penalty,
        objective,
        factors,
        costs,
    }
}

/// Profit `revenue - cost` with no penalty terms
pub fn profit(v: &DecisionVector, parameters: &ParameterSet) -> f64 {
    let unbounded = Bounds::uniform(f64::NEG_INFINITY, f64::INFINITY);
    evaluate(v, parameters, &unbounded, 0.0).profit()
}
