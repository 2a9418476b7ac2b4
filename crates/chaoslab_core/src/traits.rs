/// Right-hand side of a first-order ODE system dy/dt = f(t, y).
///
/// Implementations must be pure functions of `(t, y)` and their fixed
/// parameters: the integrator evaluates them at sub-steps of its own
/// choosing, so hidden mutable state would corrupt the solution.
pub trait OdeSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// y: current state
    /// dydt: buffer to write the state derivative
    fn apply(&self, t: f64, y: &[f64], dydt: &mut [f64]);
}
