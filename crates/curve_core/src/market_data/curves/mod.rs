//! Curve model for calibration.
//!
//! This module provides:
//! - [`YieldCurve`]: discount factor and rate contract
//! - [`InterpolatedCurve`]: node-based curve whose parameters are its node values
//! - [`CurveInterpolation`], [`ValueType`]: interpolation and value type tags
//! - [`CurveName`], [`CurveMetadata`], [`ParameterMetadata`]: identity and metadata
//! - [`JacobianCalibrationMatrix`], [`JacobianColumn`]: calibration Jacobian stored on a curve

mod interpolated;
mod metadata;
mod traits;

pub use interpolated::{CurveInterpolation, InterpolatedCurve};
pub use metadata::{
    CurveMetadata, CurveName, JacobianCalibrationMatrix, JacobianColumn, ParameterMetadata,
    ValueType,
};
pub use traits::YieldCurve;
