//! Numerical building blocks.
//!
//! - `linalg`: dense LU solve and inversion with conditioning checks
//! - `solvers`: multivariate Newton root finding

pub mod linalg;
pub mod solvers;
