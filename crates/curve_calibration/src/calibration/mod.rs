//! Multi-curve calibration.
//!
//! Curves are grouped; each group is solved jointly by Newton's method and
//! groups are solved in caller order, later groups pricing against the
//! curves of earlier ones.
//!
//! ## Components
//!
//! - [`definition`]: curve nodes, curve definitions and curve groups
//! - [`measure`]: the quantity each node drives to zero
//! - [`bundle`]: layout of a group's parameters in one vector
//! - [`residual`]: the group's residual function and its derivatives
//! - [`calibrator`]: the group orchestrator
//! - [`jacobian`]: calibration Jacobians `∂x/∂q` stored on each curve
//! - [`sensitivity`]: market-quote sensitivities and bump-and-recalibrate checks

pub mod bundle;
pub mod calibrator;
pub mod definition;
pub mod jacobian;
pub mod measure;
pub mod residual;
pub mod sensitivity;

pub use bundle::{BundleEntry, ParameterBundle};
pub use calibrator::{CalibrationRequest, CalibrationResult, CurveCalibrator, GroupCalibration};
pub use definition::{CurveDefinition, CurveGroupDefinition, CurveGroupEntry, CurveNode};
pub use jacobian::GroupJacobian;
pub use measure::{CalibrationMeasure, CalibrationMeasures};
pub use residual::{CalibrationTarget, ResidualEvaluation, ResidualFunction};
pub use sensitivity::{
    FiniteDifferenceVerifier, MarketQuoteSensitivityCalculator, QuoteSensitivities, SensitivityVerification,
};
