use serde::{Deserialize, Serialize};

use crate::double_pendulum::reporting_grid;
use crate::error::{Error, Result};
use crate::numerics::{gradient, AngleUnit};
use crate::solvers::{integrate, SolverSettings};
use crate::traits::OdeSystem;

/// Physical parameters of the planar pendulum. Positivity is the caller's
/// responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumParams {
    /// Rod length (m).
    pub length: f64,
    /// Bob mass (kg).
    pub mass: f64,
    /// Gravitational acceleration (m/s^2).
    pub gravity: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            length: 1.0,
            mass: 1.0,
            gravity: 9.81,
        }
    }
}

/// Undamped dynamics: omega' = -(g/L) sin(theta).
pub struct Undamped {
    params: PendulumParams,
}

impl Undamped {
    pub fn new(params: PendulumParams) -> Self {
        Self { params }
    }
}

impl OdeSystem for Undamped {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = y[1];
        dydt[1] = -(self.params.gravity / self.params.length) * y[0].sin();
    }
}

/// Linearly damped dynamics: omega' = -(g/L) sin(theta) - (b/M) omega.
pub struct Damped {
    params: PendulumParams,
    damping: f64,
}

impl Damped {
    pub fn new(params: PendulumParams, damping: f64) -> Self {
        Self { params, damping }
    }
}

impl OdeSystem for Damped {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        dydt[0] = y[1];
        dydt[1] = -(self.params.gravity / self.params.length) * y[0].sin()
            - (self.damping / self.params.mass) * y[1];
    }
}

#[derive(Debug, Clone)]
struct Solved {
    t: Vec<f64>,
    theta: Vec<f64>,
    omega: Vec<f64>,
    x: Vec<f64>,
    z: Vec<f64>,
    vx: Vec<f64>,
    vz: Vec<f64>,
    potential: Vec<f64>,
    kinetic: Vec<f64>,
}

/// Planar pendulum with state `(theta, omega)`, angle measured from the
/// downward vertical.
///
/// The equations of motion are chosen at construction ([`Pendulum::new`] for
/// the conservative pendulum, [`Pendulum::damped`] for linear drag) and sit
/// behind the [`OdeSystem`] seam, so the solve/derive pipeline is shared.
pub struct Pendulum {
    params: PendulumParams,
    dynamics: Box<dyn OdeSystem>,
    solver: SolverSettings,
    solution: Option<Solved>,
}

impl Pendulum {
    pub fn new(params: PendulumParams) -> Self {
        Self {
            params,
            dynamics: Box::new(Undamped::new(params)),
            solver: SolverSettings::default(),
            solution: None,
        }
    }

    /// Pendulum with a linear drag torque of coefficient `damping` (kg/s).
    pub fn damped(params: PendulumParams, damping: f64) -> Self {
        Self {
            params,
            dynamics: Box::new(Damped::new(params, damping)),
            solver: SolverSettings::default(),
            solution: None,
        }
    }

    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    pub fn params(&self) -> PendulumParams {
        self.params
    }

    /// Evaluates the selected equations of motion, returning `(omega, alpha)`.
    pub fn derivative(&self, t: f64, state: [f64; 2]) -> [f64; 2] {
        let mut out = [0.0; 2];
        self.dynamics.apply(t, &state, &mut out);
        out
    }

    /// Integrates from `state0` over `(0, duration]` on a grid of
    /// `floor(duration / step)` samples and stores the trajectory plus
    /// derived series, replacing any previous solution. Degree inputs
    /// convert the angle entry only.
    pub fn solve(
        &mut self,
        state0: [f64; 2],
        duration: f64,
        step: f64,
        unit: AngleUnit,
    ) -> Result<()> {
        let mut y0 = state0;
        if unit == AngleUnit::Degrees {
            y0[0] = y0[0].to_radians();
        }
        let t = reporting_grid(duration, step)?;

        let sol = integrate(&*self.dynamics, &y0, duration, &t, self.solver)?;
        let [theta, omega]: [Vec<f64>; 2] =
            sol.y.try_into().expect("integrator preserves dimension");

        let PendulumParams {
            length: l,
            mass: m,
            gravity: g,
        } = self.params;

        let n = t.len();
        let mut x = vec![0.0; n];
        let mut z = vec![0.0; n];
        let mut potential = vec![0.0; n];
        for i in 0..n {
            x[i] = l * theta[i].sin();
            z[i] = -l * theta[i].cos();
            potential[i] = m * g * (z[i] + l);
        }

        let vx = gradient(&x, &t);
        let vz = gradient(&z, &t);
        let kinetic = (0..n)
            .map(|i| 0.5 * m * (vx[i] * vx[i] + vz[i] * vz[i]))
            .collect();

        self.solution = Some(Solved {
            t,
            theta,
            omega,
            x,
            z,
            vx,
            vz,
            potential,
            kinetic,
        });
        Ok(())
    }

    fn solved(&self, what: &'static str) -> Result<&Solved> {
        self.solution.as_ref().ok_or(Error::Uninitialized(what))
    }

    pub fn t(&self) -> Result<&[f64]> {
        Ok(&self.solved("t")?.t)
    }

    pub fn theta(&self) -> Result<&[f64]> {
        Ok(&self.solved("theta")?.theta)
    }

    pub fn omega(&self) -> Result<&[f64]> {
        Ok(&self.solved("omega")?.omega)
    }

    pub fn x(&self) -> Result<&[f64]> {
        Ok(&self.solved("x")?.x)
    }

    pub fn z(&self) -> Result<&[f64]> {
        Ok(&self.solved("z")?.z)
    }

    pub fn vx(&self) -> Result<&[f64]> {
        Ok(&self.solved("vx")?.vx)
    }

    pub fn vz(&self) -> Result<&[f64]> {
        Ok(&self.solved("vz")?.vz)
    }

    pub fn potential_energy(&self) -> Result<&[f64]> {
        Ok(&self.solved("potential_energy")?.potential)
    }

    pub fn kinetic_energy(&self) -> Result<&[f64]> {
        Ok(&self.solved("kinetic_energy")?.kinetic)
    }
}
