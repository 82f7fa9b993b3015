//! Calibrator configuration.
//!
//! [`CalibratorConfig`] controls the Newton iteration and the construction
//! of node trades. It is passed explicitly to
//! [`CurveCalibrator`](crate::calibration::CurveCalibrator); there is no
//! process-wide default instance. Configurations can be built in code or
//! read from TOML, where missing keys take their default values.

use curve_core::math::solvers::NewtonSystemConfig;
use serde::Deserialize;

use crate::error::CalibrationError;

/// Configuration for curve calibration.
///
/// # Examples
///
/// ```
/// use curve_calibration::CalibratorConfig;
///
/// let config = CalibratorConfig::default();
/// assert!(config.absolute_tolerance <= 1e-12);
///
/// let config = CalibratorConfig::builder()
///     .absolute_tolerance(1e-10)
///     .max_iterations(40)
///     .build();
/// assert_eq!(config.max_iterations, 40);
///
/// let config = CalibratorConfig::from_toml_str("max_iterations = 25\ndamping = false").unwrap();
/// assert_eq!(config.max_iterations, 25);
/// assert!(!config.damping);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalibratorConfig {
    /// Converged when every residual is below this value in absolute terms.
    /// Default: 1e-12
    pub absolute_tolerance: f64,

    /// Converged when the last Newton step is below this fraction of the
    /// parameter norm.
    /// Default: 1e-12
    pub relative_tolerance: f64,

    /// Maximum Newton iterations per curve group.
    /// Default: 100
    pub max_iterations: usize,

    /// Halve Newton steps that do not reduce the largest residual.
    /// Default: true
    pub damping: bool,

    /// Maximum halvings per step when damping.
    /// Default: 8
    pub max_step_halvings: usize,

    /// Pivot ratio below which the residual Jacobian is singular.
    /// Default: 1e-14
    pub min_pivot_ratio: f64,

    /// Notional of the trades built from calibration nodes.
    /// Default: 1.0
    pub node_notional: f64,

    /// Starting zero rate for nodes whose quote is not itself a rate
    /// (spreads, FX forward points).
    /// Default: 0.02
    pub initial_rate_guess: f64,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        let solver = NewtonSystemConfig::default();
        Self {
            absolute_tolerance: 1e-12,
            relative_tolerance: 1e-12,
            max_iterations: 100,
            damping: solver.damping,
            max_step_halvings: solver.max_step_halvings,
            min_pivot_ratio: solver.min_pivot_ratio,
            node_notional: 1.0,
            initial_rate_guess: 0.02,
        }
    }
}

impl CalibratorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder for fluent construction.
    pub fn builder() -> CalibratorConfigBuilder {
        CalibratorConfigBuilder::new()
    }

    /// Create a high-precision configuration.
    ///
    /// Uses tighter tolerances (1e-14) and more iterations (500).
    pub fn high_precision() -> Self {
        Self {
            absolute_tolerance: 1e-14,
            relative_tolerance: 1e-14,
            max_iterations: 500,
            ..Self::default()
        }
    }

    /// Create a fast configuration for interactive use.
    ///
    /// Uses relaxed tolerances (1e-8) and fewer iterations (50).
    pub fn fast() -> Self {
        Self {
            absolute_tolerance: 1e-8,
            relative_tolerance: 1e-8,
            max_iterations: 50,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML and validate it.
    ///
    /// # Errors
    ///
    /// `CalibrationError::InvalidConfig` if the text is not valid TOML for
    /// this structure or a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, CalibrationError> {
        let config: Self =
            toml::from_str(text).map_err(|e| CalibrationError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// `CalibrationError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !(self.absolute_tolerance > 0.0 && self.absolute_tolerance.is_finite()) {
            return Err(CalibrationError::invalid_config(format!(
                "absolute_tolerance must be positive, got {}",
                self.absolute_tolerance
            )));
        }
        if !(self.relative_tolerance >= 0.0 && self.relative_tolerance.is_finite()) {
            return Err(CalibrationError::invalid_config(format!(
                "relative_tolerance must be non-negative, got {}",
                self.relative_tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(CalibrationError::invalid_config("max_iterations must be at least 1"));
        }
        if !(self.min_pivot_ratio >= 0.0 && self.min_pivot_ratio < 1.0) {
            return Err(CalibrationError::invalid_config(format!(
                "min_pivot_ratio must lie in [0, 1), got {}",
                self.min_pivot_ratio
            )));
        }
        if !(self.node_notional > 0.0 && self.node_notional.is_finite()) {
            return Err(CalibrationError::invalid_config(format!(
                "node_notional must be positive, got {}",
                self.node_notional
            )));
        }
        if !self.initial_rate_guess.is_finite() {
            return Err(CalibrationError::invalid_config("initial_rate_guess must be finite"));
        }
        Ok(())
    }

    /// Newton solver settings derived from this configuration.
    pub fn solver_config(&self) -> NewtonSystemConfig {
        NewtonSystemConfig {
            absolute_tolerance: self.absolute_tolerance,
            relative_tolerance: self.relative_tolerance,
            max_iterations: self.max_iterations,
            damping: self.damping,
            max_step_halvings: self.max_step_halvings,
            min_pivot_ratio: self.min_pivot_ratio,
        }
    }
}

/// Builder for `CalibratorConfig`.
#[derive(Debug, Clone)]
pub struct CalibratorConfigBuilder {
    config: CalibratorConfig,
}

impl CalibratorConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: CalibratorConfig::default(),
        }
    }

    /// Set the absolute residual tolerance.
    pub fn absolute_tolerance(mut self, tolerance: f64) -> Self {
        self.config.absolute_tolerance = tolerance;
        self
    }

    /// Set the relative step tolerance.
    pub fn relative_tolerance(mut self, tolerance: f64) -> Self {
        self.config.relative_tolerance = tolerance;
        self
    }

    /// Set the maximum iterations.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Enable or disable step damping.
    pub fn damping(mut self, damping: bool) -> Self {
        self.config.damping = damping;
        self
    }

    /// Set the maximum step halvings.
    pub fn max_step_halvings(mut self, halvings: usize) -> Self {
        self.config.max_step_halvings = halvings;
        self
    }

    /// Set the singular pivot threshold.
    pub fn min_pivot_ratio(mut self, ratio: f64) -> Self {
        self.config.min_pivot_ratio = ratio;
        self
    }

    /// Set the node trade notional.
    pub fn node_notional(mut self, notional: f64) -> Self {
        self.config.node_notional = notional;
        self
    }

    /// Set the starting zero rate for non-rate quotes.
    pub fn initial_rate_guess(mut self, rate: f64) -> Self {
        self.config.initial_rate_guess = rate;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CalibratorConfig {
        self.config
    }
}

impl Default for CalibratorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
