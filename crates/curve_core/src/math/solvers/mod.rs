//! Root-finding solvers for curve calibration.
//!
//! ## Available Solvers
//!
//! - [`NewtonSystemSolver`]: damped multivariate Newton for square systems
//!   with an analytic Jacobian, used to solve one curve group at a time
//! - [`NewtonIteration`]: the same algorithm exposed as a step-wise state
//!   machine
//!
//! ## Configuration
//!
//! [`NewtonSystemConfig`] sets:
//! - `absolute_tolerance`: residual tolerance (default: 1e-9)
//! - `relative_tolerance`: step tolerance (default: 1e-9)
//! - `max_iterations`: iteration cap (default: 100)
//! - `damping` / `max_step_halvings`: step halving control
//! - `min_pivot_ratio`: singular Jacobian threshold

mod config;
mod newton_system;

pub use config::NewtonSystemConfig;
pub use newton_system::{
    ConvergenceResult, FailureReason, NewtonFailure, NewtonIteration, NewtonSolution, NewtonState,
    NewtonSystemSolver, NonlinearSystem,
};
