//! Calibration error types.
//!
//! Every failure of a calibration run is a [`CalibrationError`]. Variants
//! carry the group, curve and node context needed to locate the problem,
//! and [`CalibrationError::kind`] classifies them into configuration,
//! numerical and data failures.

use curve_core::market_data::MarketDataError;
use curve_core::types::CurrencyPair;
use thiserror::Error;

/// Broad classification of a [`CalibrationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationErrorKind {
    /// The curve groups, measures or configuration are inconsistent.
    Configuration,
    /// The solver could not reach a solution.
    Numerical,
    /// A market data input is missing or unusable.
    Data,
}

/// Errors that can occur during curve calibration.
///
/// # Examples
///
/// ```
/// use curve_calibration::{CalibrationError, CalibrationErrorKind};
///
/// let err = CalibrationError::not_converged("USD-OIS", 100, 1.5e-3);
/// assert_eq!(err.kind(), CalibrationErrorKind::Numerical);
/// assert!(format!("{}", err).contains("USD-OIS"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// A node's trade needs a curve that is neither in the group nor known.
    #[error("Group '{group}': node '{node}' of curve '{curve}' cannot be priced: {reason}")]
    MissingCurve {
        /// Curve group name
        group: String,
        /// Curve owning the node
        curve: String,
        /// Node label
        node: String,
        /// What is missing
        reason: String,
    },

    /// A parameter vector does not have the bundle's length.
    #[error("Group '{group}': expected {expected} parameters, got {actual}")]
    ParameterCountMismatch {
        /// Curve group name
        group: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// A curve name is used twice, or collides with a known curve.
    #[error("Group '{group}': curve '{curve}' is defined more than once")]
    DuplicateCurveName {
        /// Curve group name
        group: String,
        /// Duplicated curve name
        curve: String,
    },

    /// A curve definition cannot produce a valid curve.
    #[error("Group '{group}': invalid definition of curve '{curve}': {reason}")]
    InvalidCurveDefinition {
        /// Curve group name
        group: String,
        /// Curve name
        curve: String,
        /// Description of the problem
        reason: String,
    },

    /// The measure cannot be applied to the node's trade.
    #[error("Group '{group}': measure {measure} does not apply to node '{node}' of curve '{curve}'")]
    UnsupportedMeasure {
        /// Curve group name
        group: String,
        /// Curve owning the node
        curve: String,
        /// Node label
        node: String,
        /// Measure name
        measure: String,
    },

    /// Market data and known curves are dated differently.
    #[error("Valuation date mismatch: market data {market_data}, known curves {known}")]
    ValuationDateMismatch {
        /// Market data valuation date
        market_data: String,
        /// Known provider valuation date
        known: String,
    },

    /// A configuration value is out of range or unparsable.
    #[error("Invalid calibration config: {0}")]
    InvalidConfig(String),

    /// The residual Jacobian could not be factorised.
    #[error("Group '{group}': singular Jacobian at iteration {iteration} (pivot ratio {pivot_ratio:e})")]
    SingularJacobian {
        /// Curve group name
        group: String,
        /// Iteration at which the factorisation failed
        iteration: usize,
        /// Smallest to largest pivot ratio
        pivot_ratio: f64,
    },

    /// The iteration cap was reached.
    #[error("Group '{group}': not converged after {iterations} iterations, max residual {max_residual:e}")]
    NotConverged {
        /// Curve group name
        group: String,
        /// Iterations performed
        iterations: usize,
        /// Largest absolute residual at the last evaluation
        max_residual: f64,
    },

    /// A residual evaluated to NaN or infinity.
    #[error("Group '{group}': non-finite residual for node '{node}' at iteration {iteration}")]
    NonFiniteResidual {
        /// Curve group name
        group: String,
        /// Node label
        node: String,
        /// Iteration of the evaluation
        iteration: usize,
    },

    /// The solver moved a curve's parameters outside their valid domain.
    #[error("Group '{group}': invalid parameters for curve '{curve}': {reason}")]
    InvalidParameters {
        /// Curve group name
        group: String,
        /// Curve name
        curve: String,
        /// Description of the problem
        reason: String,
    },

    /// No point along the Newton step could be evaluated.
    #[error("Group '{group}': no evaluable point along the Newton step at iteration {iteration}")]
    StepRejected {
        /// Curve group name
        group: String,
        /// Iteration of the rejected step
        iteration: usize,
    },

    /// A node's quote is absent from the market data.
    #[error("Group '{group}': no quote '{quote}' for node '{node}' of curve '{curve}'")]
    MissingQuote {
        /// Curve group name
        group: String,
        /// Curve owning the node
        curve: String,
        /// Node label
        node: String,
        /// Quote identifier
        quote: String,
    },

    /// An FX spot rate needed to resolve a node is absent.
    #[error("Group '{group}': no FX rate {pair} for node '{node}'")]
    MissingFxRate {
        /// Curve group name
        group: String,
        /// Node label
        node: String,
        /// Currency pair
        pair: CurrencyPair,
    },

    /// Wrapped market data error.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),
}

impl CalibrationError {
    /// Create a missing-curve error.
    pub fn missing_curve(
        group: impl Into<String>,
        curve: impl Into<String>,
        node: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalibrationError::MissingCurve {
            group: group.into(),
            curve: curve.into(),
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Create a parameter-count error.
    pub fn parameter_count_mismatch(group: impl Into<String>, expected: usize, actual: usize) -> Self {
        CalibrationError::ParameterCountMismatch {
            group: group.into(),
            expected,
            actual,
        }
    }

    /// Create a duplicate-curve error.
    pub fn duplicate_curve_name(group: impl Into<String>, curve: impl Into<String>) -> Self {
        CalibrationError::DuplicateCurveName {
            group: group.into(),
            curve: curve.into(),
        }
    }

    /// Create an invalid-definition error.
    pub fn invalid_curve_definition(
        group: impl Into<String>,
        curve: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalibrationError::InvalidCurveDefinition {
            group: group.into(),
            curve: curve.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        CalibrationError::InvalidConfig(message.into())
    }

    /// Create a not-converged error.
    pub fn not_converged(group: impl Into<String>, iterations: usize, max_residual: f64) -> Self {
        CalibrationError::NotConverged {
            group: group.into(),
            iterations,
            max_residual,
        }
    }

    /// Create an invalid-parameters error.
    pub fn invalid_parameters(
        group: impl Into<String>,
        curve: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalibrationError::InvalidParameters {
            group: group.into(),
            curve: curve.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-quote error.
    pub fn missing_quote(
        group: impl Into<String>,
        curve: impl Into<String>,
        node: impl Into<String>,
        quote: impl Into<String>,
    ) -> Self {
        CalibrationError::MissingQuote {
            group: group.into(),
            curve: curve.into(),
            node: node.into(),
            quote: quote.into(),
        }
    }

    /// Classification of the error.
    pub fn kind(&self) -> CalibrationErrorKind {
        match self {
            CalibrationError::MissingCurve { .. }
            | CalibrationError::ParameterCountMismatch { .. }
            | CalibrationError::DuplicateCurveName { .. }
            | CalibrationError::InvalidCurveDefinition { .. }
            | CalibrationError::UnsupportedMeasure { .. }
            | CalibrationError::ValuationDateMismatch { .. }
            | CalibrationError::InvalidConfig(_) => CalibrationErrorKind::Configuration,
            CalibrationError::SingularJacobian { .. }
            | CalibrationError::NotConverged { .. }
            | CalibrationError::NonFiniteResidual { .. }
            | CalibrationError::InvalidParameters { .. }
            | CalibrationError::StepRejected { .. } => CalibrationErrorKind::Numerical,
            CalibrationError::MissingQuote { .. }
            | CalibrationError::MissingFxRate { .. }
            | CalibrationError::MarketData(_) => CalibrationErrorKind::Data,
        }
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        self.kind() == CalibrationErrorKind::Configuration
    }

    /// Check if this is a numerical error.
    pub fn is_numerical(&self) -> bool {
        self.kind() == CalibrationErrorKind::Numerical
    }

    /// Check if this is a data error.
    pub fn is_data(&self) -> bool {
        self.kind() == CalibrationErrorKind::Data
    }

    /// Check if this is a missing-curve error.
    pub fn is_missing_curve(&self) -> bool {
        matches!(self, CalibrationError::MissingCurve { .. })
    }

    /// Check if this is a missing-quote error.
    pub fn is_missing_quote(&self) -> bool {
        matches!(self, CalibrationError::MissingQuote { .. })
    }

    /// Check if this is a not-converged error.
    pub fn is_not_converged(&self) -> bool {
        matches!(self, CalibrationError::NotConverged { .. })
    }

    /// Check if this is a singular-Jacobian error.
    pub fn is_singular_jacobian(&self) -> bool {
        matches!(self, CalibrationError::SingularJacobian { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve_core::types::Currency;

    #[test]
    fn test_kind_classification() {
        assert!(CalibrationError::missing_curve("G", "C", "1Y", "no USD discount curve").is_configuration());
        assert!(CalibrationError::parameter_count_mismatch("G", 3, 2).is_configuration());
        assert!(CalibrationError::duplicate_curve_name("G", "C").is_configuration());
        assert!(CalibrationError::invalid_config("bad").is_configuration());
        assert!(CalibrationError::not_converged("G", 10, 1.0).is_numerical());
        assert!(CalibrationError::invalid_parameters("G", "C", "non-positive value").is_numerical());
        assert!(CalibrationError::StepRejected {
            group: "G".into(),
            iteration: 3
        }
        .is_numerical());
        assert!(CalibrationError::missing_quote("G", "C", "1Y", "Q").is_data());

        let fx = CalibrationError::MissingFxRate {
            group: "G".into(),
            node: "1Y".into(),
            pair: CurrencyPair::new(Currency::EUR, Currency::USD).unwrap(),
        };
        assert_eq!(fx.kind(), CalibrationErrorKind::Data);
    }

    #[test]
    fn test_from_market_data_error() {
        let err: CalibrationError = MarketDataError::CurveNotFound {
            name: "USD-OIS".to_string(),
        }
        .into();
        assert!(err.is_data());
        assert!(format!("{}", err).contains("USD-OIS"));
    }

    #[test]
    fn test_display_carries_context() {
        let err = CalibrationError::missing_quote("USD", "USD-OIS", "5Y", "USD-OIS-5Y");
        let msg = format!("{}", err);
        assert!(msg.contains("USD-OIS-5Y"));
        assert!(msg.contains("5Y"));
        assert!(err.is_missing_quote());

        let err = CalibrationError::SingularJacobian {
            group: "USD".into(),
            iteration: 2,
            pivot_ratio: 1e-17,
        };
        assert!(err.is_singular_jacobian());
        assert!(format!("{}", err).contains("iteration 2"));
    }
}
