//! # curve_calibration
//!
//! Multi-curve calibration of interest-rate term structures.
//!
//! This crate sits on top of `curve_core` in the workspace. Given market
//! quotes and a description of which curves price which instruments, it
//! solves for every curve's parameters so each calibration instrument
//! reprices to its market value, and stores on each curve the Jacobian of
//! its parameters with respect to the quotes.
//!
//! ## Modules
//!
//! - `instruments`: node templates, resolved trades and analytic pricing
//! - `calibration`: curve groups, measures, the Newton orchestrator,
//!   calibration Jacobians and market-quote sensitivities
//! - `config`: [`CalibratorConfig`]
//! - `error`: [`CalibrationError`]
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use curve_calibration::prelude::*;
//! use curve_core::market_data::curves::{CurveInterpolation, ValueType};
//! use curve_core::market_data::{MarketData, RatesProvider};
//! use curve_core::types::{Currency, RateIndex};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let sofr = RateIndex::overnight("USD-SOFR", Currency::USD);
//! let ois = CurveDefinition::new(
//!     "USD-OIS",
//!     ValueType::ZeroRate,
//!     CurveInterpolation::Linear,
//!     vec![
//!         CurveNode::new("1Y", "USD-DEP-1Y", NodeTemplate::deposit(Currency::USD, 1.0)),
//!         CurveNode::new("5Y", "USD-OIS-5Y", NodeTemplate::swap(sofr.clone(), 5.0, Frequency::Annual)),
//!     ],
//! );
//! let group = CurveGroupDefinition::new("USD").with_curve(ois, vec![Currency::USD], vec![sofr]);
//! let market = MarketData::new(date)
//!     .with_quote("USD-DEP-1Y", 0.045)
//!     .with_quote("USD-OIS-5Y", 0.041);
//!
//! let calibrator = CurveCalibrator::new(CalibratorConfig::default(), CalibrationMeasures::par_spread());
//! let result = calibrator.calibrate(&[group], &market, &RatesProvider::empty(date))?;
//! assert!(result.groups()[0].max_residual < 1e-10);
//! # Ok::<(), CalibrationError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default): calibrates batch requests with rayon

pub mod calibration;
pub mod config;
pub mod error;
pub mod instruments;

pub use config::{CalibratorConfig, CalibratorConfigBuilder};
pub use error::{CalibrationError, CalibrationErrorKind};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::calibration::*;
    pub use crate::instruments::{Frequency, NodeTemplate, TradeKind};
    pub use crate::{CalibrationError, CalibrationErrorKind, CalibratorConfig};
}
