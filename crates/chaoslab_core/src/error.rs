use thiserror::Error;

/// Errors reported by the simulation and fractal models.
///
/// Numerical degeneracy (the near-singular denominator of the double-pendulum
/// equations of motion, or a variation evaluated at its pole) is deliberately
/// absent: it surfaces as non-finite values in the output arrays, and callers
/// detect it by checking finiteness.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A caller-supplied argument is outside the documented domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A derived series was read before `solve` had produced one.
    #[error("`{0}` is unavailable: solve has not been called on this model")]
    Uninitialized(&'static str),

    /// The integrator consumed its step budget before reaching the end time.
    #[error("integrator exhausted its budget of {max_steps} steps at t = {t}")]
    StepBudgetExceeded { t: f64, max_steps: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
