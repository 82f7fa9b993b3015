//! Solver configuration types.

use crate::math::linalg::DEFAULT_MIN_PIVOT_RATIO;

/// Configuration for the multivariate Newton solver.
///
/// # Example
///
/// ```
/// use curve_core::math::solvers::NewtonSystemConfig;
///
/// let config = NewtonSystemConfig::default();
/// assert!(config.absolute_tolerance < 1e-8);
/// assert!(config.max_iterations >= 50);
///
/// let custom = NewtonSystemConfig::new(1e-12, 1e-12, 200);
/// assert_eq!(custom.max_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NewtonSystemConfig {
    /// Converged when `max|r_i|` falls below this value.
    pub absolute_tolerance: f64,

    /// Converged when the last step satisfies `‖δ‖ / ‖x‖` below this value.
    pub relative_tolerance: f64,

    /// Maximum number of Newton steps before giving up.
    pub max_iterations: usize,

    /// Halve the step while the residual norm does not decrease.
    pub damping: bool,

    /// Maximum number of step halvings per iteration when damping.
    pub max_step_halvings: usize,

    /// Smallest acceptable ratio of LU pivots before the Jacobian is
    /// treated as singular.
    pub min_pivot_ratio: f64,
}

impl Default for NewtonSystemConfig {
    /// Default values:
    /// - `absolute_tolerance`: 1e-9
    /// - `relative_tolerance`: 1e-9
    /// - `max_iterations`: 100
    /// - `damping`: true, with up to 8 halvings
    /// - `min_pivot_ratio`: 1e-14
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-9,
            relative_tolerance: 1e-9,
            max_iterations: 100,
            damping: true,
            max_step_halvings: 8,
            min_pivot_ratio: DEFAULT_MIN_PIVOT_RATIO,
        }
    }
}

impl NewtonSystemConfig {
    /// Create a configuration with the given tolerances and iteration cap.
    ///
    /// # Panics
    ///
    /// Panics if either tolerance is not positive or `max_iterations == 0`.
    pub fn new(absolute_tolerance: f64, relative_tolerance: f64, max_iterations: usize) -> Self {
        assert!(
            absolute_tolerance > 0.0,
            "absolute_tolerance must be positive"
        );
        assert!(
            relative_tolerance > 0.0,
            "relative_tolerance must be positive"
        );
        assert!(max_iterations > 0, "max_iterations must be > 0");
        Self {
            absolute_tolerance,
            relative_tolerance,
            max_iterations,
            ..Self::default()
        }
    }

    /// Tight tolerances (1e-14) and a larger iteration cap (500).
    pub fn high_precision() -> Self {
        Self {
            absolute_tolerance: 1e-14,
            relative_tolerance: 1e-14,
            max_iterations: 500,
            ..Self::default()
        }
    }

    /// Relaxed tolerances (1e-6) and fewer iterations (50).
    pub fn fast() -> Self {
        Self {
            absolute_tolerance: 1e-6,
            relative_tolerance: 1e-6,
            max_iterations: 50,
            ..Self::default()
        }
    }

    /// Disable or enable step damping.
    pub fn with_damping(mut self, damping: bool) -> Self {
        self.damping = damping;
        self
    }
}
