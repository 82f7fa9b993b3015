//! # curve_core: Foundation for Multi-Curve Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! curve_core is the bottom layer of the curve workspace, providing:
//! - Identifier types: `Currency`, `CurrencyPair`, `RateIndex`, `Tenor` (`types`)
//! - Dense LU linear algebra and the multivariate Newton solver (`math`)
//! - The curve model with analytic parameter sensitivities (`market_data::curves`)
//! - Market quote snapshots and immutable rates providers (`market_data`)
//! - Point and curve-parameter sensitivities (`market_data::sensitivity`)
//!
//! ## Dependencies
//!
//! Layer 1 has no dependencies on other curve_* crates:
//! - num-traits: generic `YieldCurve` contract
//! - nalgebra: dense matrices and LU factorisation
//! - chrono: valuation and fixing dates
//! - thiserror: error enums
//! - serde: serialisation of identifiers and conventions (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use curve_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, ValueType, YieldCurve};
//! use curve_core::types::Currency;
//!
//! let curve = InterpolatedCurve::new(
//!     "USD-OIS",
//!     vec![1.0, 2.0, 5.0],
//!     vec![0.05, 0.048, 0.045],
//!     ValueType::ZeroRate,
//!     CurveInterpolation::Linear,
//! )
//! .unwrap();
//!
//! assert_eq!(curve.parameter_count(), 3);
//! assert_eq!(Currency::USD.code(), "USD");
//! let df = curve.discount_factor(2.0).unwrap();
//! # assert!((df - (-0.096_f64).exp()).abs() < 1e-15);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialisation for identifiers, currencies, conventions
//!   and solver configuration

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod types;
