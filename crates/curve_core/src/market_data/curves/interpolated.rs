//! Interpolated curve with an explicit parameter vector.
//!
//! The curve's parameters are its node values (zero rates or discount
//! factors). Every query also has a parameter-sensitivity counterpart so
//! calibration can build analytic Jacobians.

use std::sync::Arc;

use super::metadata::{CurveMetadata, CurveName, JacobianCalibrationMatrix, ParameterMetadata, ValueType};
use super::YieldCurve;
use crate::market_data::error::MarketDataError;

/// Interpolation method between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveInterpolation {
    /// Linear in the node values.
    #[default]
    Linear,

    /// Linear in the logarithm of the node values; requires positive values.
    ///
    /// On a discount factor curve this is piecewise constant forwards.
    LogLinear,
}

/// Node-based curve whose parameters are the node values.
///
/// Extrapolation is flat in the node value for zero-rate curves and at a
/// constant zero rate for discount factor curves, so `DF(0) = 1` holds for
/// both value types.
///
/// # Example
///
/// ```
/// use curve_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, ValueType, YieldCurve};
///
/// let curve = InterpolatedCurve::new(
///     "USD-OIS",
///     vec![0.5, 1.0, 2.0],
///     vec![0.02, 0.025, 0.03],
///     ValueType::ZeroRate,
///     CurveInterpolation::Linear,
/// )
/// .unwrap();
///
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - (-0.025_f64).exp()).abs() < 1e-15);
///
/// let sens = curve.discount_factor_parameter_sensitivity(1.0).unwrap();
/// assert_eq!(sens.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedCurve {
    name: CurveName,
    x_values: Arc<[f64]>,
    y_values: Vec<f64>,
    interpolation: CurveInterpolation,
    metadata: CurveMetadata,
}

impl InterpolatedCurve {
    /// Construct a curve from node times and values.
    ///
    /// # Errors
    ///
    /// - `InvalidCurve` if there are no nodes, lengths differ, or times are
    ///   not positive, finite and strictly increasing
    /// - `NonPositiveValue` if a discount factor or log-linear value is not positive
    pub fn new(
        name: impl Into<CurveName>,
        x_values: Vec<f64>,
        y_values: Vec<f64>,
        value_type: ValueType,
        interpolation: CurveInterpolation,
    ) -> Result<Self, MarketDataError> {
        let name = name.into();
        if x_values.is_empty() {
            return Err(invalid(&name, "curve has no nodes"));
        }
        if x_values.len() != y_values.len() {
            return Err(MarketDataError::ParameterCountMismatch {
                curve: name.to_string(),
                expected: x_values.len(),
                actual: y_values.len(),
            });
        }
        for (i, &x) in x_values.iter().enumerate() {
            if !x.is_finite() || x <= 0.0 {
                return Err(invalid(&name, &format!("node time {} is not positive", x)));
            }
            if i > 0 && x <= x_values[i - 1] {
                return Err(invalid(
                    &name,
                    &format!("node times not increasing at index {}", i),
                ));
            }
        }

        let count = x_values.len();
        let curve = Self {
            name,
            x_values: x_values.into(),
            y_values,
            interpolation,
            metadata: CurveMetadata::new(value_type, count),
        };
        curve.validate_values(&curve.y_values)?;
        Ok(curve)
    }

    /// Curve name.
    pub fn name(&self) -> &CurveName {
        &self.name
    }

    /// Value type of the parameters.
    pub fn value_type(&self) -> ValueType {
        self.metadata.value_type()
    }

    /// Interpolation method.
    pub fn interpolation(&self) -> CurveInterpolation {
        self.interpolation
    }

    /// Node times in years.
    pub fn node_times(&self) -> &[f64] {
        &self.x_values
    }

    /// Number of parameters.
    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.y_values.len()
    }

    /// Parameter vector (node values).
    pub fn parameters(&self) -> &[f64] {
        &self.y_values
    }

    /// Curve metadata.
    pub fn metadata(&self) -> &CurveMetadata {
        &self.metadata
    }

    /// Calibration Jacobian, if the curve was calibrated.
    pub fn jacobian(&self) -> Option<&JacobianCalibrationMatrix> {
        self.metadata.jacobian()
    }

    /// Returns a curve with the parameter vector replaced.
    ///
    /// Node times are shared with `self`. Any calibration Jacobian is
    /// dropped since it no longer describes the new parameters.
    ///
    /// # Errors
    ///
    /// `ParameterCountMismatch` on a length mismatch, `NonPositiveValue` as
    /// in [`InterpolatedCurve::new`].
    pub fn with_parameters(&self, parameters: Vec<f64>) -> Result<Self, MarketDataError> {
        if parameters.len() != self.parameter_count() {
            return Err(MarketDataError::ParameterCountMismatch {
                curve: self.name.to_string(),
                expected: self.parameter_count(),
                actual: parameters.len(),
            });
        }
        self.validate_values(&parameters)?;
        let mut metadata = self.metadata.clone();
        metadata.set_jacobian(None);
        Ok(Self {
            name: self.name.clone(),
            x_values: Arc::clone(&self.x_values),
            y_values: parameters,
            interpolation: self.interpolation,
            metadata,
        })
    }

    /// Returns a curve with per-parameter metadata replaced.
    ///
    /// # Errors
    ///
    /// `ParameterCountMismatch` if the metadata length differs from the node count.
    pub fn with_parameter_metadata(
        &self,
        parameters: Vec<ParameterMetadata>,
    ) -> Result<Self, MarketDataError> {
        if parameters.len() != self.parameter_count() {
            return Err(MarketDataError::ParameterCountMismatch {
                curve: self.name.to_string(),
                expected: self.parameter_count(),
                actual: parameters.len(),
            });
        }
        let mut curve = self.clone();
        curve.metadata.set_parameters(parameters);
        Ok(curve)
    }

    /// Returns a curve carrying the given calibration Jacobian.
    ///
    /// # Errors
    ///
    /// `ParameterCountMismatch` if the Jacobian's row count differs from
    /// the node count.
    pub fn with_jacobian(&self, jacobian: JacobianCalibrationMatrix) -> Result<Self, MarketDataError> {
        if jacobian.parameter_count() != self.parameter_count() {
            return Err(MarketDataError::ParameterCountMismatch {
                curve: self.name.to_string(),
                expected: self.parameter_count(),
                actual: jacobian.parameter_count(),
            });
        }
        let mut curve = self.clone();
        curve.metadata.set_jacobian(Some(Arc::new(jacobian)));
        Ok(curve)
    }

    /// Interpolated node value at `t`.
    pub fn y_value(&self, t: f64) -> Result<f64, MarketDataError> {
        check_time(t)?;
        Ok(self.evaluate(t, None))
    }

    /// Sensitivity of [`InterpolatedCurve::y_value`] to each parameter.
    pub fn y_value_parameter_sensitivity(&self, t: f64) -> Result<Vec<f64>, MarketDataError> {
        check_time(t)?;
        let mut sensitivity = vec![0.0; self.parameter_count()];
        self.evaluate(t, Some(&mut sensitivity));
        Ok(sensitivity)
    }

    /// Sensitivity of the discount factor at `t` to each parameter.
    pub fn discount_factor_parameter_sensitivity(
        &self,
        t: f64,
    ) -> Result<Vec<f64>, MarketDataError> {
        check_time(t)?;
        let mut sensitivity = vec![0.0; self.parameter_count()];
        if t == 0.0 {
            return Ok(sensitivity);
        }
        let y = self.evaluate(t, Some(&mut sensitivity));
        if self.value_type() == ValueType::ZeroRate {
            let scale = -t * (-y * t).exp();
            for s in sensitivity.iter_mut() {
                *s *= scale;
            }
        }
        Ok(sensitivity)
    }

    /// Evaluates the node-value function at `t >= 0`, optionally
    /// accumulating `∂y/∂y_j` into `sensitivity`.
    fn evaluate(&self, t: f64, sensitivity: Option<&mut [f64]>) -> f64 {
        let x = &self.x_values;
        let y = &self.y_values;
        let n = x.len();

        if t <= x[0] || t >= x[n - 1] {
            let edge = if t <= x[0] { 0 } else { n - 1 };
            return match self.value_type() {
                ValueType::ZeroRate => {
                    if let Some(s) = sensitivity {
                        s[edge] = 1.0;
                    }
                    y[edge]
                }
                ValueType::DiscountFactor => {
                    // Constant zero rate: y(t) = y_e^(t / x_e)
                    let power = t / x[edge];
                    let value = y[edge].powf(power);
                    if let Some(s) = sensitivity {
                        s[edge] = power * value / y[edge];
                    }
                    value
                }
            };
        }

        // x[i] <= t < x[i + 1]
        let i = x.partition_point(|&xi| xi <= t) - 1;
        let w = (t - x[i]) / (x[i + 1] - x[i]);
        match self.interpolation {
            CurveInterpolation::Linear => {
                if let Some(s) = sensitivity {
                    s[i] = 1.0 - w;
                    s[i + 1] = w;
                }
                (1.0 - w) * y[i] + w * y[i + 1]
            }
            CurveInterpolation::LogLinear => {
                let value = ((1.0 - w) * y[i].ln() + w * y[i + 1].ln()).exp();
                if let Some(s) = sensitivity {
                    s[i] = (1.0 - w) * value / y[i];
                    s[i + 1] = w * value / y[i + 1];
                }
                value
            }
        }
    }

    fn validate_values(&self, values: &[f64]) -> Result<(), MarketDataError> {
        let needs_positive = self.value_type() == ValueType::DiscountFactor
            || self.interpolation == CurveInterpolation::LogLinear;
        for (&t, &value) in self.x_values.iter().zip(values) {
            if !value.is_finite() {
                return Err(invalid(&self.name, &format!("non-finite value at t = {}", t)));
            }
            if needs_positive && value <= 0.0 {
                return Err(MarketDataError::NonPositiveValue {
                    curve: self.name.to_string(),
                    t,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl YieldCurve<f64> for InterpolatedCurve {
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        check_time(t)?;
        if t == 0.0 {
            return Ok(1.0);
        }
        let y = self.evaluate(t, None);
        Ok(match self.value_type() {
            ValueType::ZeroRate => (-y * t).exp(),
            ValueType::DiscountFactor => y,
        })
    }

    fn zero_rate(&self, t: f64) -> Result<f64, MarketDataError> {
        match self.value_type() {
            ValueType::ZeroRate => self.y_value(t),
            ValueType::DiscountFactor => {
                if t <= 0.0 || !t.is_finite() {
                    return Err(MarketDataError::InvalidMaturity { t });
                }
                Ok(-self.evaluate(t, None).ln() / t)
            }
        }
    }
}

fn check_time(t: f64) -> Result<(), MarketDataError> {
    if t < 0.0 || !t.is_finite() {
        return Err(MarketDataError::InvalidMaturity { t });
    }
    Ok(())
}

fn invalid(name: &CurveName, reason: &str) -> MarketDataError {
    MarketDataError::InvalidCurve {
        curve: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn zero_curve(interpolation: CurveInterpolation) -> InterpolatedCurve {
        InterpolatedCurve::new(
            "USD-OIS",
            vec![0.5, 1.0, 2.0, 5.0],
            vec![0.02, 0.025, 0.03, 0.04],
            ValueType::ZeroRate,
            interpolation,
        )
        .unwrap()
    }

    fn df_curve(interpolation: CurveInterpolation) -> InterpolatedCurve {
        InterpolatedCurve::new(
            "USD-DSC",
            vec![1.0, 2.0, 5.0],
            vec![0.97, 0.94, 0.85],
            ValueType::DiscountFactor,
            interpolation,
        )
        .unwrap()
    }

    /// Central difference of `f` with respect to parameter `j`.
    fn bumped<F: Fn(&InterpolatedCurve) -> f64>(curve: &InterpolatedCurve, j: usize, f: F) -> f64 {
        let h = 1e-7;
        let mut up = curve.parameters().to_vec();
        let mut down = curve.parameters().to_vec();
        up[j] += h;
        down[j] -= h;
        (f(&curve.with_parameters(up).unwrap()) - f(&curve.with_parameters(down).unwrap())) / (2.0 * h)
    }

    // ========================================
    // Construction Tests
    // ========================================

    #[test]
    fn test_new_rejects_empty() {
        let result = InterpolatedCurve::new(
            "C",
            vec![],
            vec![],
            ValueType::ZeroRate,
            CurveInterpolation::Linear,
        );
        assert!(matches!(result, Err(MarketDataError::InvalidCurve { .. })));
    }

    #[test]
    fn test_new_rejects_unsorted_times() {
        let result = InterpolatedCurve::new(
            "C",
            vec![1.0, 0.5],
            vec![0.01, 0.02],
            ValueType::ZeroRate,
            CurveInterpolation::Linear,
        );
        assert!(matches!(result, Err(MarketDataError::InvalidCurve { .. })));
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let result = InterpolatedCurve::new(
            "C",
            vec![1.0, 2.0],
            vec![0.01],
            ValueType::ZeroRate,
            CurveInterpolation::Linear,
        );
        assert!(matches!(
            result,
            Err(MarketDataError::ParameterCountMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_discount_factor_curve_requires_positive_values() {
        let result = InterpolatedCurve::new(
            "C",
            vec![1.0],
            vec![0.0],
            ValueType::DiscountFactor,
            CurveInterpolation::Linear,
        );
        assert!(matches!(
            result,
            Err(MarketDataError::NonPositiveValue { .. })
        ));
    }

    // ========================================
    // Evaluation Tests
    // ========================================

    #[test]
    fn test_linear_zero_rate_at_nodes_and_between() {
        let curve = zero_curve(CurveInterpolation::Linear);
        assert_relative_eq!(curve.zero_rate(1.0).unwrap(), 0.025);
        assert_relative_eq!(curve.zero_rate(1.5).unwrap(), 0.0275, epsilon = 1e-15);
        assert_relative_eq!(
            curve.discount_factor(2.0).unwrap(),
            (-0.06_f64).exp(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_flat_extrapolation_for_zero_rates() {
        let curve = zero_curve(CurveInterpolation::Linear);
        assert_relative_eq!(curve.zero_rate(0.1).unwrap(), 0.02);
        assert_relative_eq!(curve.zero_rate(10.0).unwrap(), 0.04);
        assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_constant_zero_rate_extrapolation_for_discount_factors() {
        let curve = df_curve(CurveInterpolation::LogLinear);
        let z1 = -(0.97_f64.ln());
        assert_relative_eq!(curve.zero_rate(0.5).unwrap(), z1, epsilon = 1e-14);
        let z5 = -(0.85_f64.ln()) / 5.0;
        assert_relative_eq!(curve.zero_rate(8.0).unwrap(), z5, epsilon = 1e-14);
    }

    #[test]
    fn test_log_linear_implies_constant_forward() {
        let curve = df_curve(CurveInterpolation::LogLinear);
        let f1 = curve.forward_rate(2.0, 3.0).unwrap();
        let f2 = curve.forward_rate(3.0, 4.5).unwrap();
        assert_relative_eq!(f1, f2, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_time_rejected() {
        let curve = zero_curve(CurveInterpolation::Linear);
        assert!(matches!(
            curve.discount_factor(-0.1),
            Err(MarketDataError::InvalidMaturity { .. })
        ));
    }

    // ========================================
    // Parameter Sensitivity Tests
    // ========================================

    #[test]
    fn test_discount_factor_sensitivity_matches_finite_difference() {
        for curve in [
            zero_curve(CurveInterpolation::Linear),
            zero_curve(CurveInterpolation::LogLinear),
            df_curve(CurveInterpolation::Linear),
            df_curve(CurveInterpolation::LogLinear),
        ] {
            for &t in &[0.25, 0.5, 0.75, 1.0, 1.7, 2.0, 3.3, 5.0, 7.5] {
                let analytic = curve.discount_factor_parameter_sensitivity(t).unwrap();
                for (j, a) in analytic.iter().enumerate() {
                    let numeric = bumped(&curve, j, |c| c.discount_factor(t).unwrap());
                    assert!(
                        (a - numeric).abs() < 1e-7,
                        "{} t={} param {}: analytic {} vs numeric {}",
                        curve.name(),
                        t,
                        j,
                        a,
                        numeric
                    );
                }
            }
        }
    }

    #[test]
    fn test_sensitivity_at_zero_is_zero() {
        let curve = zero_curve(CurveInterpolation::Linear);
        let sens = curve.discount_factor_parameter_sensitivity(0.0).unwrap();
        assert!(sens.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_y_value_sensitivity_sums_to_one_for_linear() {
        let curve = zero_curve(CurveInterpolation::Linear);
        let sens = curve.y_value_parameter_sensitivity(1.3).unwrap();
        assert_relative_eq!(sens.iter().sum::<f64>(), 1.0, epsilon = 1e-15);
        assert_eq!(sens[0], 0.0);
        assert_eq!(sens[3], 0.0);
    }

    // ========================================
    // Parameter Replacement Tests
    // ========================================

    #[test]
    fn test_with_parameters_shares_nodes_and_drops_jacobian() {
        use crate::market_data::curves::JacobianColumn;
        use crate::market_data::quotes::QuoteId;
        use nalgebra::DMatrix;

        let curve = df_curve(CurveInterpolation::LogLinear);
        let columns = (0..3)
            .map(|i| JacobianColumn {
                curve: curve.name().clone(),
                node: format!("n{}", i),
                quote_id: QuoteId::new(format!("q{}", i)),
            })
            .collect();
        let jacobian = JacobianCalibrationMatrix::new(columns, DMatrix::identity(3, 3)).unwrap();
        let calibrated = curve.with_jacobian(jacobian).unwrap();
        assert!(calibrated.jacobian().is_some());

        let replaced = calibrated.with_parameters(vec![0.98, 0.95, 0.88]).unwrap();
        assert_eq!(replaced.parameters(), &[0.98, 0.95, 0.88]);
        assert_eq!(replaced.node_times(), calibrated.node_times());
        assert!(replaced.jacobian().is_none());
        assert!(calibrated.with_parameters(vec![0.9]).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn test_discount_factor_monotone_for_positive_zero_rates(
            rates in proptest::collection::vec(0.0001f64..0.1, 4),
            t1 in 0.0f64..10.0,
            dt in 0.0f64..5.0,
        ) {
            // Increasing zero rates give decreasing discount factors
            let mut sorted = rates.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let curve = InterpolatedCurve::new(
                "P",
                vec![0.5, 1.0, 2.0, 5.0],
                sorted,
                ValueType::ZeroRate,
                CurveInterpolation::Linear,
            ).unwrap();
            let df1 = curve.discount_factor(t1).unwrap();
            let df2 = curve.discount_factor(t1 + dt).unwrap();
            prop_assert!(df2 <= df1 + 1e-15);
            prop_assert!(df1 > 0.0 && df1 <= 1.0);
        }
    }
}
