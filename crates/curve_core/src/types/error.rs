//! Error types for foundation operations.
//!
//! - [`CurrencyError`]: currency and currency pair parsing
//! - [`SolverError`]: dense linear algebra and multivariate root finding

use thiserror::Error;

/// Currency-related errors.
///
/// # Examples
/// ```
/// use curve_core::types::CurrencyError;
///
/// let err = CurrencyError::UnknownCurrency("XYZ".to_string());
/// assert_eq!(format!("{}", err), "Unknown currency: XYZ");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// Unknown currency code.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Failed to parse currency or currency pair string.
    #[error("Currency parse error: {0}")]
    ParseError(String),

    /// Base and counter currencies are the same.
    #[error("Base and counter currencies are the same: {0}")]
    SameCurrency(String),
}

/// Linear algebra and root-finding errors.
///
/// # Examples
/// ```
/// use curve_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },

    /// Matrix is singular or too ill-conditioned to factorise.
    #[error("Singular matrix: pivot ratio {pivot_ratio:e} below threshold")]
    SingularMatrix {
        /// Smallest over largest absolute LU pivot
        pivot_ratio: f64,
    },

    /// Operand shapes are incompatible.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl SolverError {
    /// Returns `true` for a singular or ill-conditioned matrix.
    pub fn is_singular(&self) -> bool {
        matches!(self, SolverError::SingularMatrix { .. })
    }
}
