//! The `chaoslab_core` crate is the numerical engine behind ChaosLab:
//! ODE-based pendulum simulations with derived energy diagnostics, and
//! chaos-game / iterated-function-system fractal generators.
//!
//! Key components:
//! - **Traits**: [`traits::OdeSystem`], the equations-of-motion seam that
//!   lets damped and undamped dynamics be swapped at construction.
//! - **Solvers**: adaptive Dormand-Prince 5(4) integration with dense
//!   output, reporting on the caller's time grid.
//! - **Models**: [`double_pendulum::DoublePendulum`] (coupled nonlinear arms
//!   with cartesian and energy post-processing), [`pendulum::Pendulum`],
//!   [`exp_decay::ExponentialDecay`].
//! - **Fractals**: [`chaos_game::ChaosGame`], [`ifs::IteratedFunctionSystem`]
//!   and the [`variations::Variation`] plane transforms, all driven by
//!   caller-seeded randomness for reproducible clouds.

pub mod chaos_game;
pub mod double_pendulum;
pub mod error;
pub mod exp_decay;
pub mod ifs;
pub mod numerics;
pub mod pendulum;
pub mod rng;
pub mod solvers;
pub mod traits;
pub mod variations;

pub use error::{Error, Result};
