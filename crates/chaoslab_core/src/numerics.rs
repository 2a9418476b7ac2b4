use serde::{Deserialize, Serialize};

/// Unit in which angular initial conditions are supplied.
///
/// Degrees are converted to radians before integration. The conversion
/// applies to angle entries only: angular velocities are taken to be rad/s
/// already and are never rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleUnit {
    Radians,
    Degrees,
}

/// `n` evenly spaced samples covering `[a, b]` inclusive.
///
/// The grid is fully determined by `(a, b, n)`; callers rely on two grids
/// built from the same arguments being bitwise identical.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let span = b - a;
            let last = (n - 1) as f64;
            (0..n).map(|i| a + span * (i as f64) / last).collect()
        }
    }
}

/// Numerical derivative of `values` with respect to the grid `t`.
///
/// Central differences in the interior, one-sided at both ends, matching the
/// stencil the derived-series pipeline was validated against. `values` and
/// `t` must be the same length; fewer than two samples yields zeros.
pub fn gradient(values: &[f64], t: &[f64]) -> Vec<f64> {
    let n = values.len();
    assert_eq!(n, t.len(), "gradient: series and grid lengths differ");
    if n < 2 {
        return vec![0.0; n];
    }

    let mut out = vec![0.0; n];
    out[0] = (values[1] - values[0]) / (t[1] - t[0]);
    for i in 1..n - 1 {
        out[i] = (values[i + 1] - values[i - 1]) / (t[i + 1] - t[i - 1]);
    }
    out[n - 1] = (values[n - 1] - values[n - 2]) / (t[n - 1] - t[n - 2]);
    out
}
