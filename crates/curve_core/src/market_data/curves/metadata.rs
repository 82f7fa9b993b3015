//! Curve identity and metadata.
//!
//! Metadata travels with a curve through calibration: the value type tag,
//! one [`ParameterMetadata`] per node, and once calibration finishes the
//! [`JacobianCalibrationMatrix`] that maps market quotes to the curve's
//! parameters.

use std::fmt;
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::market_data::error::MarketDataError;
use crate::market_data::quotes::QuoteId;

/// Unique curve name within a rates provider.
///
/// # Examples
///
/// ```
/// use curve_core::market_data::curves::CurveName;
///
/// let name = CurveName::new("USD-OIS");
/// assert_eq!(name.as_str(), "USD-OIS");
/// assert_eq!(name, CurveName::from("USD-OIS"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveName(String);

impl CurveName {
    /// Creates a curve name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurveName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CurveName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Quantity stored in a curve's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    /// Continuously compounded zero rates.
    #[default]
    ZeroRate,
    /// Discount factors.
    DiscountFactor,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::ZeroRate => write!(f, "ZeroRate"),
            ValueType::DiscountFactor => write!(f, "DiscountFactor"),
        }
    }
}

/// Describes one curve parameter (one calibration node).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    /// Node label, e.g. `"5Y"`.
    pub label: String,
    /// Market data identifier the node was calibrated to, if any.
    pub quote_id: Option<QuoteId>,
}

impl ParameterMetadata {
    /// Metadata for an unlabelled parameter.
    pub fn unlabelled(index: usize) -> Self {
        Self {
            label: format!("p{}", index),
            quote_id: None,
        }
    }
}

/// One column of a calibration Jacobian: the market quote of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JacobianColumn {
    /// Curve the node calibrates.
    pub curve: CurveName,
    /// Node label.
    pub node: String,
    /// Market data identifier of the node's quote.
    pub quote_id: QuoteId,
}

/// Sensitivity of a calibrated curve's parameters to market quotes.
///
/// Entry `(i, j)` is `∂x_i/∂q_j` where `x_i` is the curve's i-th parameter
/// and `q_j` the quote of column `j`. Columns cover the nodes of the curve's
/// own group and, transitively, every upstream node the group was
/// calibrated against.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianCalibrationMatrix {
    columns: Vec<JacobianColumn>,
    matrix: DMatrix<f64>,
}

impl JacobianCalibrationMatrix {
    /// Creates a Jacobian from its columns and matrix.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::InvalidCurve` if the column count differs
    /// from the matrix width.
    pub fn new(columns: Vec<JacobianColumn>, matrix: DMatrix<f64>) -> Result<Self, MarketDataError> {
        if columns.len() != matrix.ncols() {
            return Err(MarketDataError::InvalidCurve {
                curve: columns
                    .first()
                    .map(|c| c.curve.to_string())
                    .unwrap_or_default(),
                reason: format!(
                    "jacobian has {} columns but {} column descriptors",
                    matrix.ncols(),
                    columns.len()
                ),
            });
        }
        Ok(Self { columns, matrix })
    }

    /// Column descriptors in matrix order.
    pub fn columns(&self) -> &[JacobianColumn] {
        &self.columns
    }

    /// The `∂x/∂q` matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Number of curve parameters (rows).
    pub fn parameter_count(&self) -> usize {
        self.matrix.nrows()
    }

    /// Returns `sᵀ·M`: a parameter sensitivity re-expressed per column.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::ParameterCountMismatch` if `sensitivity`
    /// has the wrong length.
    pub fn quote_sensitivity(&self, sensitivity: &[f64]) -> Result<Vec<f64>, MarketDataError> {
        if sensitivity.len() != self.matrix.nrows() {
            return Err(MarketDataError::ParameterCountMismatch {
                curve: self
                    .columns
                    .first()
                    .map(|c| c.curve.to_string())
                    .unwrap_or_default(),
                expected: self.matrix.nrows(),
                actual: sensitivity.len(),
            });
        }
        let mut out = vec![0.0; self.matrix.ncols()];
        for (j, value) in out.iter_mut().enumerate() {
            *value = sensitivity
                .iter()
                .enumerate()
                .map(|(i, s)| s * self.matrix[(i, j)])
                .sum();
        }
        Ok(out)
    }
}

/// Metadata attached to a curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveMetadata {
    value_type: ValueType,
    parameters: Vec<ParameterMetadata>,
    jacobian: Option<Arc<JacobianCalibrationMatrix>>,
}

impl CurveMetadata {
    /// Metadata with unlabelled parameters and no Jacobian.
    pub fn new(value_type: ValueType, parameter_count: usize) -> Self {
        Self {
            value_type,
            parameters: (0..parameter_count)
                .map(ParameterMetadata::unlabelled)
                .collect(),
            jacobian: None,
        }
    }

    /// Value type tag.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Per-parameter metadata.
    pub fn parameters(&self) -> &[ParameterMetadata] {
        &self.parameters
    }

    /// Calibration Jacobian, present once the curve has been calibrated.
    pub fn jacobian(&self) -> Option<&JacobianCalibrationMatrix> {
        self.jacobian.as_deref()
    }

    pub(crate) fn set_parameters(&mut self, parameters: Vec<ParameterMetadata>) {
        self.parameters = parameters;
    }

    pub(crate) fn set_jacobian(&mut self, jacobian: Option<Arc<JacobianCalibrationMatrix>>) {
        self.jacobian = jacobian;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn column(node: &str) -> JacobianColumn {
        JacobianColumn {
            curve: CurveName::new("USD-OIS"),
            node: node.to_string(),
            quote_id: QuoteId::new(format!("OIS-{}", node)),
        }
    }

    #[test]
    fn test_jacobian_rejects_column_mismatch() {
        let result = JacobianCalibrationMatrix::new(vec![column("1Y")], DMatrix::zeros(2, 2));
        assert!(matches!(result, Err(MarketDataError::InvalidCurve { .. })));
    }

    #[test]
    fn test_jacobian_quote_sensitivity() {
        let jacobian = JacobianCalibrationMatrix::new(
            vec![column("1Y"), column("2Y")],
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, -0.5, 2.0]),
        )
        .unwrap();

        let quote = jacobian.quote_sensitivity(&[10.0, 4.0]).unwrap();
        assert_relative_eq!(quote[0], 8.0);
        assert_relative_eq!(quote[1], 8.0);
        assert_eq!(jacobian.parameter_count(), 2);
        assert!(jacobian.quote_sensitivity(&[1.0]).is_err());
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = CurveMetadata::new(ValueType::DiscountFactor, 3);
        assert_eq!(metadata.value_type(), ValueType::DiscountFactor);
        assert_eq!(metadata.parameters().len(), 3);
        assert_eq!(metadata.parameters()[2].label, "p2");
        assert!(metadata.jacobian().is_none());
    }
}
