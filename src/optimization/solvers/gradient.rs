/// Relative finite-difference step
pub const FD_STEP: f64 = 1e-6;

/// Central finite-difference gradient of `cost` at `params`.
///
/// Each component uses a step of `FD_STEP * max(1, |x_i|)`. Returns the
/// number of cost evaluations performed (`2 * n`).
pub fn central_gradient<F>(cost: F, params: &[f64], grad: &mut [f64]) -> usize
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = params.to_vec();
    let mut evals = 0;

    for i in 0..params.len() {
        let h = FD_STEP * params[i].abs().max(1.0);

        probe[i] = params[i] + h;
        let c_plus = cost(&probe);
        probe[i] = params[i] - h;
        let c_minus = cost(&probe);
        probe[i] = params[i];
        evals += 2;

        grad[i] = (c_plus - c_minus) / (2.0 * h);
    }

    evals
}
