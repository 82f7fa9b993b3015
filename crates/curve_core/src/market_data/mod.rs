//! Market data structures for curve calibration.
//!
//! # Components
//!
//! - [`curves`]: curve model, metadata and calibration Jacobian
//! - [`quotes`]: market quote snapshots ([`MarketData`], [`QuoteId`], [`FixingSeries`])
//! - [`provider`]: immutable [`RatesProvider`] snapshots
//! - [`sensitivity`]: point and curve-parameter sensitivities
//! - [`error`]: [`MarketDataError`]
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use curve_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, ValueType, YieldCurve};
//! use curve_core::market_data::RatesProvider;
//! use curve_core::types::Currency;
//!
//! let curve = InterpolatedCurve::new(
//!     "EUR-ESTR",
//!     vec![1.0, 2.0],
//!     vec![0.03, 0.031],
//!     ValueType::ZeroRate,
//!     CurveInterpolation::Linear,
//! )
//! .unwrap();
//! let provider = RatesProvider::builder(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
//!     .discount_curve(Currency::EUR, curve)
//!     .build();
//!
//! let df = provider.discount_curve(Currency::EUR).unwrap().discount_factor(2.0).unwrap();
//! assert!((df - (-0.062_f64).exp()).abs() < 1e-15);
//! ```

pub mod curves;
pub mod error;
pub mod provider;
pub mod quotes;
pub mod sensitivity;

pub use curves::{CurveInterpolation, CurveName, InterpolatedCurve, ValueType, YieldCurve};
pub use error::MarketDataError;
pub use provider::{RatesProvider, RatesProviderBuilder};
pub use quotes::{FixingSeries, MarketData, QuoteId};
pub use sensitivity::{CurveParameterSensitivities, PointSensitivities, PointSensitivity};
