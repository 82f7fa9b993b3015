//! Market data error types.
//!
//! Structured errors for curve construction, curve queries and rates
//! provider lookups.

use thiserror::Error;

use crate::types::{Currency, CurrencyPair, RateIndex};

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use curve_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Invalid maturity (negative or non-finite time).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Curve definition is inconsistent.
    #[error("Invalid curve '{curve}': {reason}")]
    InvalidCurve {
        /// Curve name
        curve: String,
        /// What is wrong with it
        reason: String,
    },

    /// A value that must be positive is not (e.g. a log-linear discount factor).
    #[error("Non-positive value {value} on curve '{curve}' at t = {t}")]
    NonPositiveValue {
        /// Curve name
        curve: String,
        /// Node time
        t: f64,
        /// Offending value
        value: f64,
    },

    /// Parameter vector length does not match the curve's node count.
    #[error("Curve '{curve}' expects {expected} parameters, got {actual}")]
    ParameterCountMismatch {
        /// Curve name
        curve: String,
        /// Node count
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// No curve with this name in the provider.
    #[error("Curve not found: {name}")]
    CurveNotFound {
        /// Requested curve name
        name: String,
    },

    /// No discount curve mapped for the currency.
    #[error("No discount curve for currency {currency}")]
    MissingDiscountCurve {
        /// Requested currency
        currency: Currency,
    },

    /// No forward curve mapped for the index.
    #[error("No forward curve for index {index}")]
    MissingForwardCurve {
        /// Requested index
        index: RateIndex,
    },

    /// No FX spot rate for the pair or its inverse.
    #[error("No FX rate for {pair}")]
    MissingFxRate {
        /// Requested pair
        pair: CurrencyPair,
    },
}

impl MarketDataError {
    /// Returns `true` when a curve lookup failed.
    pub fn is_missing_curve(&self) -> bool {
        matches!(
            self,
            MarketDataError::CurveNotFound { .. }
                | MarketDataError::MissingDiscountCurve { .. }
                | MarketDataError::MissingForwardCurve { .. }
        )
    }
}
