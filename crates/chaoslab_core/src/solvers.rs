use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::OdeSystem;

/// Tuning knobs for the adaptive integrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Relative error tolerance per step.
    pub rtol: f64,
    /// Absolute error tolerance per step.
    pub atol: f64,
    /// Budget on attempted steps (accepted and rejected) before giving up.
    pub max_steps: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            max_steps: 1_000_000,
        }
    }
}

/// Solution reported on the caller's evaluation grid.
///
/// `y` is component-major: `y[c][i]` is component `c` at time `t[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub t: Vec<f64>,
    pub y: Vec<Vec<f64>>,
}

// Dormand-Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order solution weights (b2 = 0).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the 5th- and 4th-order weights (e2 = 0).
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// Dense-output coefficients for the 4th-order interpolant.
const D1: f64 = -12715105075.0 / 11282082432.0;
const D3: f64 = 87487479700.0 / 32700410799.0;
const D4: f64 = -10690763975.0 / 1880347072.0;
const D5: f64 = 701980252875.0 / 199316789632.0;
const D6: f64 = -1453857185.0 / 822651844.0;
const D7: f64 = 69997945.0 / 29380423.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Integrates `system` from `t = 0` to `t_end` and reports the solution on
/// the strictly increasing grid `t_eval` (which must lie inside `[0, t_end]`).
///
/// Step size adapts to the embedded error estimate; the reported samples come
/// from the dense-output interpolant, independent of the internal steps. If
/// the state stops being finite (the documented equations-of-motion
/// degeneracy), integration halts and every remaining requested sample is
/// filled with NaN rather than reported as an error.
pub fn integrate(
    system: &dyn OdeSystem,
    y0: &[f64],
    t_end: f64,
    t_eval: &[f64],
    settings: SolverSettings,
) -> Result<Solution> {
    let dim = system.dimension();
    if dim == 0 {
        return Err(Error::InvalidArgument(
            "system has zero dimension".to_string(),
        ));
    }
    if y0.len() != dim {
        return Err(Error::InvalidArgument(format!(
            "initial state has {} components, system expects {}",
            y0.len(),
            dim
        )));
    }
    if !(t_end > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "end time must be positive, got {t_end}"
        )));
    }
    if t_eval.is_empty() {
        return Err(Error::InvalidArgument(
            "evaluation grid is empty".to_string(),
        ));
    }
    if t_eval[0] < 0.0 || t_eval[t_eval.len() - 1] > t_end {
        return Err(Error::InvalidArgument(format!(
            "evaluation grid must lie inside [0, {t_end}]"
        )));
    }
    if !t_eval.windows(2).all(|w| w[1] > w[0]) {
        return Err(Error::InvalidArgument(
            "evaluation grid must be strictly increasing".to_string(),
        ));
    }

    let mut t_out: Vec<f64> = Vec::with_capacity(t_eval.len());
    let mut rows: Vec<Vec<f64>> = vec![Vec::with_capacity(t_eval.len()); dim];

    let mut t = 0.0;
    let mut y = y0.to_vec();

    let mut k1 = vec![0.0; dim];
    let mut k2 = vec![0.0; dim];
    let mut k3 = vec![0.0; dim];
    let mut k4 = vec![0.0; dim];
    let mut k5 = vec![0.0; dim];
    let mut k6 = vec![0.0; dim];
    let mut k7 = vec![0.0; dim];
    let mut y_tmp = vec![0.0; dim];
    let mut y_new = vec![0.0; dim];
    let mut rcont1 = vec![0.0; dim];
    let mut rcont2 = vec![0.0; dim];
    let mut rcont3 = vec![0.0; dim];
    let mut rcont4 = vec![0.0; dim];
    let mut rcont5 = vec![0.0; dim];

    system.apply(t, &y, &mut k1);

    // Samples requested at t = 0 come straight from the initial state.
    let mut next = 0;
    while next < t_eval.len() && t_eval[next] <= t {
        t_out.push(t_eval[next]);
        for (c, row) in rows.iter_mut().enumerate() {
            row.push(y[c]);
        }
        next += 1;
    }

    let mut h = initial_step(system, &y, &k1, t_end, &settings);
    let h_floor = 1e-14 * t_end.max(1.0);
    let mut steps = 0;

    while next < t_eval.len() {
        if steps >= settings.max_steps {
            return Err(Error::StepBudgetExceeded {
                t,
                max_steps: settings.max_steps,
            });
        }
        steps += 1;

        if h < h_floor {
            // The controller cannot advance; the state has degenerated.
            emit_non_finite(&mut t_out, &mut rows, &t_eval[next..]);
            break;
        }

        let mut h_step = h;
        let mut last = false;
        if t + h_step >= t_end {
            h_step = t_end - t;
            last = true;
        }

        for i in 0..dim {
            y_tmp[i] = y[i] + h_step * (A21 * k1[i]);
        }
        system.apply(t + C2 * h_step, &y_tmp, &mut k2);

        for i in 0..dim {
            y_tmp[i] = y[i] + h_step * (A31 * k1[i] + A32 * k2[i]);
        }
        system.apply(t + C3 * h_step, &y_tmp, &mut k3);

        for i in 0..dim {
            y_tmp[i] = y[i] + h_step * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
        }
        system.apply(t + C4 * h_step, &y_tmp, &mut k4);

        for i in 0..dim {
            y_tmp[i] =
                y[i] + h_step * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
        }
        system.apply(t + C5 * h_step, &y_tmp, &mut k5);

        for i in 0..dim {
            y_tmp[i] = y[i]
                + h_step
                    * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
        }
        system.apply(t + h_step, &y_tmp, &mut k6);

        for i in 0..dim {
            y_new[i] = y[i]
                + h_step * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]);
        }
        system.apply(t + h_step, &y_new, &mut k7);

        let mut acc = 0.0;
        for i in 0..dim {
            let e = h_step
                * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i]
                    + E7 * k7[i]);
            let sk = settings.atol + settings.rtol * y[i].abs().max(y_new[i].abs());
            acc += (e / sk) * (e / sk);
        }
        let err = (acc / dim as f64).sqrt();

        if !(err <= 1.0) {
            // Rejected; a non-finite estimate shrinks at the full clamp.
            h = if err.is_finite() {
                h_step * (SAFETY * err.powf(-0.2)).max(MIN_FACTOR)
            } else {
                h_step * MIN_FACTOR
            };
            continue;
        }

        let t_new = if last { t_end } else { t + h_step };

        if next < t_eval.len() && t_eval[next] <= t_new {
            for i in 0..dim {
                let ydiff = y_new[i] - y[i];
                let bspl = h_step * k1[i] - ydiff;
                rcont1[i] = y[i];
                rcont2[i] = ydiff;
                rcont3[i] = bspl;
                rcont4[i] = ydiff - h_step * k7[i] - bspl;
                rcont5[i] = h_step
                    * (D1 * k1[i] + D3 * k3[i] + D4 * k4[i] + D5 * k5[i] + D6 * k6[i]
                        + D7 * k7[i]);
            }
            while next < t_eval.len() && t_eval[next] <= t_new {
                let theta = (t_eval[next] - t) / h_step;
                let theta1 = 1.0 - theta;
                t_out.push(t_eval[next]);
                for (i, row) in rows.iter_mut().enumerate() {
                    row.push(
                        rcont1[i]
                            + theta
                                * (rcont2[i]
                                    + theta1
                                        * (rcont3[i] + theta * (rcont4[i] + theta1 * rcont5[i]))),
                    );
                }
                next += 1;
            }
        }

        t = t_new;
        y.copy_from_slice(&y_new);
        k1.copy_from_slice(&k7);

        if !y.iter().all(|v| v.is_finite()) {
            emit_non_finite(&mut t_out, &mut rows, &t_eval[next..]);
            break;
        }

        let factor = if err == 0.0 {
            MAX_FACTOR
        } else {
            (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
        };
        h = h_step * factor;
    }

    Ok(Solution { t: t_out, y: rows })
}

/// First trial step from the scaled norms of the state and its derivative.
fn initial_step(
    system: &dyn OdeSystem,
    y0: &[f64],
    f0: &[f64],
    t_end: f64,
    settings: &SolverSettings,
) -> f64 {
    let dim = y0.len();
    let scale: Vec<f64> = y0
        .iter()
        .map(|v| settings.atol + settings.rtol * v.abs())
        .collect();

    let d0 = scaled_rms(y0, &scale);
    let d1 = scaled_rms(f0, &scale);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };

    let y1: Vec<f64> = (0..dim).map(|i| y0[i] + h0 * f0[i]).collect();
    let mut f1 = vec![0.0; dim];
    system.apply(h0, &y1, &mut f1);
    let df: Vec<f64> = (0..dim).map(|i| f1[i] - f0[i]).collect();
    let d2 = scaled_rms(&df, &scale) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(0.2)
    };

    (100.0 * h0).min(h1).min(t_end)
}

fn scaled_rms(values: &[f64], scale: &[f64]) -> f64 {
    let mut acc = 0.0;
    for i in 0..values.len() {
        let r = values[i] / scale[i];
        acc += r * r;
    }
    (acc / values.len() as f64).sqrt()
}

fn emit_non_finite(t_out: &mut Vec<f64>, rows: &mut [Vec<f64>], remaining: &[f64]) {
    for &tv in remaining {
        t_out.push(tv);
        for row in rows.iter_mut() {
            row.push(f64::NAN);
        }
    }
}
