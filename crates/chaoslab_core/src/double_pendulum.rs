use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::numerics::{gradient, linspace, AngleUnit};
use crate::solvers::{integrate, SolverSettings};
use crate::traits::OdeSystem;

/// Physical parameters of the rigid double pendulum.
///
/// All values are taken as given: zero or negative masses and lengths are the
/// caller's responsibility and generally drive the equations of motion into
/// their singular configurations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoublePendulumParams {
    /// Mass of the inner bob (kg).
    pub mass1: f64,
    /// Length of the inner rod (m).
    pub length1: f64,
    /// Mass of the outer bob (kg).
    pub mass2: f64,
    /// Length of the outer rod (m).
    pub length2: f64,
    /// Gravitational acceleration (m/s^2).
    pub gravity: f64,
}

impl Default for DoublePendulumParams {
    fn default() -> Self {
        Self {
            mass1: 1.0,
            length1: 1.0,
            mass2: 1.0,
            length2: 1.0,
            gravity: 9.81,
        }
    }
}

#[derive(Debug, Clone)]
struct Solved {
    t: Vec<f64>,
    theta1: Vec<f64>,
    omega1: Vec<f64>,
    theta2: Vec<f64>,
    omega2: Vec<f64>,
    x1: Vec<f64>,
    z1: Vec<f64>,
    x2: Vec<f64>,
    z2: Vec<f64>,
    vx1: Vec<f64>,
    vz1: Vec<f64>,
    vx2: Vec<f64>,
    vz2: Vec<f64>,
    potential: Vec<f64>,
    kinetic: Vec<f64>,
}

/// Rigid double pendulum: two point masses on massless rods, the inner rod
/// hinged at the origin, angles measured from the downward vertical.
///
/// The state vector is `(theta1, omega1, theta2, omega2)`. Angles are
/// unbounded; nothing wraps them into `[-pi, pi]`.
///
/// A model starts without a trajectory. `solve` integrates the equations of
/// motion on a fixed reporting grid and derives cartesian positions,
/// velocities and energies; every accessor fails with
/// [`Error::Uninitialized`] until then.
#[derive(Debug, Clone)]
pub struct DoublePendulum {
    params: DoublePendulumParams,
    solver: SolverSettings,
    solution: Option<Solved>,
}

impl Default for DoublePendulum {
    fn default() -> Self {
        Self::new(DoublePendulumParams::default())
    }
}

impl OdeSystem for DoublePendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn apply(&self, _t: f64, y: &[f64], dydt: &mut [f64]) {
        let DoublePendulumParams {
            mass1: m1,
            length1: l1,
            mass2: m2,
            length2: l2,
            gravity: g,
        } = self.params;
        let (theta1, omega1, theta2, omega2) = (y[0], y[1], y[2], y[3]);

        let delta = theta2 - theta1;
        let (sin_d, cos_d) = delta.sin_cos();

        // The shared denominator (m1 + m2 - m2*cos^2(delta)) * L vanishes for
        // degenerate mass configurations (e.g. a massless inner bob with the
        // arms aligned). The resulting blow-up is a property of the physics
        // and is surfaced as non-finite output, not guarded.
        let num1 = m2 * l1 * omega1 * omega1 * sin_d * cos_d
            + m2 * g * theta2.sin() * cos_d
            + m2 * l2 * omega2 * omega2 * sin_d
            - (m1 + m2) * g * theta1.sin();
        let den1 = (m1 + m2) * l1 - m2 * l1 * cos_d * cos_d;

        let num2 = -m2 * l2 * omega2 * omega2 * sin_d * cos_d
            + (m1 + m2) * g * theta1.sin() * cos_d
            - (m1 + m2) * l1 * omega1 * omega1 * sin_d
            - (m1 + m2) * g * theta2.sin();
        let den2 = (m1 + m2) * l2 - m2 * l2 * cos_d * cos_d;

        dydt[0] = omega1;
        dydt[1] = num1 / den1;
        dydt[2] = omega2;
        dydt[3] = num2 / den2;
    }
}

impl DoublePendulum {
    pub fn new(params: DoublePendulumParams) -> Self {
        Self {
            params,
            solver: SolverSettings::default(),
            solution: None,
        }
    }

    /// Replaces the integrator settings used by subsequent `solve` calls.
    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    pub fn params(&self) -> DoublePendulumParams {
        self.params
    }

    /// Evaluates the equations of motion at one state, returning
    /// `(omega1, alpha1, omega2, alpha2)`.
    pub fn derivative(&self, t: f64, state: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        self.apply(t, &state, &mut out);
        out
    }

    /// Integrates the pendulum from `state0` over `(0, duration]` and stores
    /// the trajectory together with all derived series, replacing whatever a
    /// previous call produced.
    ///
    /// The reporting grid has `floor(duration / step)` samples evenly spaced
    /// over `[0, duration]`; the integrator steps adaptively underneath and
    /// interpolates onto the grid. With [`AngleUnit::Degrees`], only the two
    /// angle entries of `state0` are converted; angular velocities are
    /// expected in rad/s either way.
    pub fn solve(
        &mut self,
        state0: [f64; 4],
        duration: f64,
        step: f64,
        unit: AngleUnit,
    ) -> Result<()> {
        let mut y0 = state0;
        if unit == AngleUnit::Degrees {
            y0[0] = y0[0].to_radians();
            y0[2] = y0[2].to_radians();
        }
        let t = reporting_grid(duration, step)?;

        let sol = integrate(&*self, &y0, duration, &t, self.solver)?;
        let [theta1, omega1, theta2, omega2]: [Vec<f64>; 4] =
            sol.y.try_into().expect("integrator preserves dimension");

        let DoublePendulumParams {
            mass1: m1,
            length1: l1,
            mass2: m2,
            length2: l2,
            gravity: g,
        } = self.params;

        let n = t.len();
        let mut x1 = vec![0.0; n];
        let mut z1 = vec![0.0; n];
        let mut x2 = vec![0.0; n];
        let mut z2 = vec![0.0; n];
        let mut potential = vec![0.0; n];
        for i in 0..n {
            x1[i] = l1 * theta1[i].sin();
            z1[i] = -l1 * theta1[i].cos();
            x2[i] = x1[i] + l2 * theta2[i].sin();
            z2[i] = z1[i] - l2 * theta2[i].cos();
            // Height reference: both rods hanging straight down.
            potential[i] = m1 * g * (z1[i] + l1) + m2 * g * (z2[i] + l1 + l2);
        }

        let vx1 = gradient(&x1, &t);
        let vz1 = gradient(&z1, &t);
        let vx2 = gradient(&x2, &t);
        let vz2 = gradient(&z2, &t);
        let kinetic = (0..n)
            .map(|i| {
                0.5 * m1 * (vx1[i] * vx1[i] + vz1[i] * vz1[i])
                    + 0.5 * m2 * (vx2[i] * vx2[i] + vz2[i] * vz2[i])
            })
            .collect();

        self.solution = Some(Solved {
            t,
            theta1,
            omega1,
            theta2,
            omega2,
            x1,
            z1,
            x2,
            z2,
            vx1,
            vz1,
            vx2,
            vz2,
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

    pub fn theta1(&self) -> Result<&[f64]> {
        Ok(&self.solved("theta1")?.theta1)
    }

    pub fn omega1(&self) -> Result<&[f64]> {
        Ok(&self.solved("omega1")?.omega1)
    }

    pub fn theta2(&self) -> Result<&[f64]> {
        Ok(&self.solved("theta2")?.theta2)
    }

    pub fn omega2(&self) -> Result<&[f64]> {
        Ok(&self.solved("omega2")?.omega2)
    }

    pub fn x1(&self) -> Result<&[f64]> {
        Ok(&self.solved("x1")?.x1)
    }

    pub fn z1(&self) -> Result<&[f64]> {
        Ok(&self.solved("z1")?.z1)
    }

    pub fn x2(&self) -> Result<&[f64]> {
        Ok(&self.solved("x2")?.x2)
    }

    pub fn z2(&self) -> Result<&[f64]> {
        Ok(&self.solved("z2")?.z2)
    }

    pub fn vx1(&self) -> Result<&[f64]> {
        Ok(&self.solved("vx1")?.vx1)
    }

    pub fn vz1(&self) -> Result<&[f64]> {
        Ok(&self.solved("vz1")?.vz1)
    }

    pub fn vx2(&self) -> Result<&[f64]> {
        Ok(&self.solved("vx2")?.vx2)
    }

    pub fn vz2(&self) -> Result<&[f64]> {
        Ok(&self.solved("vz2")?.vz2)
    }

    pub fn potential_energy(&self) -> Result<&[f64]> {
        Ok(&self.solved("potential_energy")?.potential)
    }

    pub fn kinetic_energy(&self) -> Result<&[f64]> {
        Ok(&self.solved("kinetic_energy")?.kinetic)
    }
}

/// Builds the fixed reporting grid shared by the pendulum models:
/// `floor(duration / step)` samples evenly spaced over `[0, duration]`.
pub(crate) fn reporting_grid(duration: f64, step: f64) -> Result<Vec<f64>> {
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
    let n = (duration / step).floor() as usize;
    if n < 2 {
        return Err(Error::InvalidArgument(format!(
            "step size {step} leaves fewer than two samples in [0, {duration}]"
        )));
    }
    Ok(linspace(0.0, duration, n))
}

#[cfg(test)]
mod tests {
    use super::{DoublePendulum, DoublePendulumParams};
    use crate::error::Error;
    use crate::numerics::AngleUnit;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn long_arms() -> DoublePendulum {
        DoublePendulum::new(DoublePendulumParams {
            length1: 2.7,
            length2: 2.7,
            ..DoublePendulumParams::default()
        })
    }

    #[test]
    fn derivative_matches_reference_state() {
        // Hand-evaluated from the equations of motion at
        // (theta1, omega1, theta2, omega2) = (pi/2, 0.1, pi/4, 0.2)
        // with m1 = m2 = 1, L1 = L2 = 2.7, g = 9.81.
        let d = long_arms().derivative(0.0, [FRAC_PI_2, 0.1, FRAC_PI_4, 0.2]);
        assert_eq!(d[0], 0.1);
        assert!((d[1] - (-3.655522847498308)).abs() < 1e-10);
        assert_eq!(d[2], 0.2);
        assert!((d[3] - 0.022761423749154).abs() < 1e-10);
    }

    #[test]
    fn derivative_is_nan_at_degenerate_mass_configuration() {
        // A massless inner bob with aligned arms zeroes the denominator.
        let model = DoublePendulum::new(DoublePendulumParams {
            mass1: 0.0,
            ..DoublePendulumParams::default()
        });
        let d = model.derivative(0.0, [0.0, 0.0, 0.0, 0.0]);
        assert!(d[1].is_nan());
    }

    #[test]
    fn rod_lengths_stay_fixed_along_the_trajectory() {
        let mut model = DoublePendulum::new(DoublePendulumParams {
            length1: 2.0,
            length2: 1.0,
            ..DoublePendulumParams::default()
        });
        model
            .solve([PI, 1.0, FRAC_PI_2, 2.0], 3.0, 0.001, AngleUnit::Radians)
            .expect("solve should succeed");
        let (x1, z1) = (model.x1().unwrap(), model.z1().unwrap());
        let (x2, z2) = (model.x2().unwrap(), model.z2().unwrap());
        for i in 0..x1.len() {
            let r1 = (x1[i] * x1[i] + z1[i] * z1[i]).sqrt();
            assert!((r1 - 2.0).abs() < 1e-14, "inner rod stretched at sample {i}");
            let (dx, dz) = (x2[i] - x1[i], z2[i] - z1[i]);
            let r2 = (dx * dx + dz * dz).sqrt();
            assert!((r2 - 1.0).abs() < 1e-13, "outer rod stretched at sample {i}");
        }
    }

    #[test]
    fn rest_state_remains_at_rest() {
        let mut model = DoublePendulum::default();
        model
            .solve([0.0, 0.0, 0.0, 0.0], 3.0, 0.001, AngleUnit::Radians)
            .expect("solve should succeed");
        let sum: f64 = model.theta1().unwrap().iter().sum::<f64>()
            + model.omega1().unwrap().iter().sum::<f64>()
            + model.theta2().unwrap().iter().sum::<f64>()
            + model.omega2().unwrap().iter().sum::<f64>();
        assert_eq!(sum, 0.0);
        assert!(model.kinetic_energy().unwrap().iter().all(|&k| k == 0.0));
        assert!(model.potential_energy().unwrap().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn time_grid_depends_only_on_duration_and_step() {
        let mut a = DoublePendulum::default();
        let mut b = DoublePendulum::new(DoublePendulumParams {
            mass1: 3.0,
            length1: 0.5,
            mass2: 0.2,
            length2: 4.0,
            gravity: 1.62,
        });
        a.solve([0.4, 0.0, 0.2, 0.0], 3.0, 0.001, AngleUnit::Radians)
            .unwrap();
        b.solve([2.0, 1.0, -1.0, 0.5], 3.0, 0.001, AngleUnit::Radians)
            .unwrap();
        assert_eq!(a.t().unwrap(), b.t().unwrap());
    }

    #[test]
    fn every_accessor_fails_before_solve() {
        let model = DoublePendulum::default();
        let is_uninitialized =
            |r: crate::Result<&[f64]>| matches!(r, Err(Error::Uninitialized(_)));
        assert!(is_uninitialized(model.t()));
        assert!(is_uninitialized(model.theta1()));
        assert!(is_uninitialized(model.omega1()));
        assert!(is_uninitialized(model.theta2()));
        assert!(is_uninitialized(model.omega2()));
        assert!(is_uninitialized(model.x1()));
        assert!(is_uninitialized(model.z1()));
        assert!(is_uninitialized(model.x2()));
        assert!(is_uninitialized(model.z2()));
        assert!(is_uninitialized(model.vx1()));
        assert!(is_uninitialized(model.vz1()));
        assert!(is_uninitialized(model.vx2()));
        assert!(is_uninitialized(model.vz2()));
        assert!(is_uninitialized(model.potential_energy()));
        assert!(is_uninitialized(model.kinetic_energy()));
    }

    #[test]
    fn resolving_replaces_the_previous_trajectory() {
        let mut model = DoublePendulum::default();
        model
            .solve([FRAC_PI_2, 0.0, FRAC_PI_4, 0.0], 2.0, 0.001, AngleUnit::Radians)
            .unwrap();
        assert!(model.theta1().unwrap().iter().any(|&v| v != 0.0));

        model
            .solve([0.0, 0.0, 0.0, 0.0], 3.0, 0.001, AngleUnit::Radians)
            .unwrap();
        let t = model.t().unwrap();
        assert_eq!(t.len(), (3.0_f64 / 0.001).floor() as usize);
        assert_eq!(*t.last().unwrap(), 3.0);
        assert!(model.theta1().unwrap().iter().all(|&v| v == 0.0));
        assert!(model.omega2().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn energy_drift_stays_inside_the_diagnostic_band() {
        let mut model = DoublePendulum::default();
        model
            .solve([FRAC_PI_2, 0.0, FRAC_PI_4, 0.0], 2.0, 0.001, AngleUnit::Radians)
            .unwrap();
        let p = model.potential_energy().unwrap();
        let k = model.kinetic_energy().unwrap();
        // One-sided differencing makes the first and last velocity samples
        // first-order only, so the band is checked on the interior.
        let reference = p[1] + k[1];
        for i in 1..p.len() - 1 {
            assert!(
                (p[i] + k[i] - reference).abs() < 1e-2,
                "energy drifted at sample {i}"
            );
        }
    }

    #[test]
    fn degrees_convert_angles_but_not_angular_velocities() {
        let mut model = DoublePendulum::default();
        model
            .solve([90.0, 1.0, -45.0, 2.0], 1.0, 0.001, AngleUnit::Degrees)
            .unwrap();
        assert!((model.theta1().unwrap()[0] - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(model.omega1().unwrap()[0], 1.0);
        assert!((model.theta2().unwrap()[0] + FRAC_PI_4).abs() < 1e-12);
        assert_eq!(model.omega2().unwrap()[0], 2.0);
    }

    #[test]
    fn solve_rejects_bad_durations_and_steps() {
        let mut model = DoublePendulum::default();
        let zeros = [0.0; 4];
        assert!(matches!(
            model.solve(zeros, 0.0, 0.001, AngleUnit::Radians),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            model.solve(zeros, -1.0, 0.001, AngleUnit::Radians),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            model.solve(zeros, 1.0, 0.0, AngleUnit::Radians),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            model.solve(zeros, 1.0, f64::NAN, AngleUnit::Radians),
            Err(Error::InvalidArgument(_))
        ));
        // A step wider than the whole interval leaves no grid to report on.
        assert!(matches!(
            model.solve(zeros, 1.0, 10.0, AngleUnit::Radians),
            Err(Error::InvalidArgument(_))
        ));
        // Failed calls must not leave a half-initialized model behind.
        assert!(matches!(model.t(), Err(Error::Uninitialized(_))));
    }
}
