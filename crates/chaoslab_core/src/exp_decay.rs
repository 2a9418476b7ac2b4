use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::numerics::linspace;
use crate::solvers::{integrate, SolverSettings};
use crate::traits::OdeSystem;

/// Exponential decay du/dt = -a * u.
///
/// The simplest model in the crate; its closed-form solution also makes it
/// the accuracy yardstick for the integrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExponentialDecay {
    rate: f64,
    solver: SolverSettings,
}

impl OdeSystem for ExponentialDecay {
    fn dimension(&self) -> usize {
        1
    }

    fn apply(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = -self.rate * y[0];
    }
}

impl ExponentialDecay {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            solver: SolverSettings::default(),
        }
    }

    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Solves from `u0` over `(0, duration]` and returns `(t, u)` on a grid
    /// of `ceil(duration / step)` evenly spaced samples covering the
    /// interval. Stateless: nothing is cached on the model.
    pub fn solve(&self, u0: f64, duration: f64, step: f64) -> Result<(Vec<f64>, Vec<f64>)> {
        if !(duration > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "duration must be positive, got {duration}"
            )));
        }
        if !(step > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "step size must be positive, got {step}"
            )));
        }
        let n = (duration / step).ceil() as usize;
        if n < 2 {
            return Err(Error::InvalidArgument(format!(
                "step size {step} leaves fewer than two samples in [0, {duration}]"
            )));
        }
        let grid = linspace(0.0, duration, n);
        let sol = integrate(self, &[u0], duration, &grid, self.solver)?;
        let mut y = sol.y;
        Ok((sol.t, y.swap_remove(0)))
    }
}
