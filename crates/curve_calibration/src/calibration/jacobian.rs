//! Calibration Jacobian store.
//!
//! After a group converges, the sensitivity of its parameters to market
//! quotes follows from the implicit function theorem applied to `r(x, q) = 0`:
//!
//! ```text
//! ∂x/∂q_own      = -J⁻¹ · diag(∂r/∂q)
//! ∂x/∂q_upstream = -J⁻¹ · Σ_p (∂r/∂x_p) · (∂x_p/∂q_upstream)
//! ```
//!
//! where `J = ∂r/∂x` and `p` runs over the known curves the nodes depend on.
//! The second term chains through the Jacobians stored on those curves, so a
//! group calibrated after others carries columns for every upstream quote.
//! Known curves without a Jacobian are fixed inputs and contribute nothing.

use std::collections::{BTreeMap, HashMap};

use curve_core::market_data::curves::{CurveName, JacobianCalibrationMatrix, JacobianColumn};
use curve_core::market_data::RatesProvider;
use curve_core::math::linalg::lu_inverse;
use curve_core::types::SolverError;
use nalgebra::DMatrix;
use tracing::debug;

use crate::calibration::bundle::ParameterBundle;
use crate::calibration::residual::ResidualFunction;
use crate::error::CalibrationError;

/// Derivatives of a converged group, the inputs to its calibration Jacobian.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupJacobian {
    /// Group name
    pub group: String,
    /// Newton iterations the group took
    pub iterations: usize,
    /// One column per node of the group, in residual order
    pub columns: Vec<JacobianColumn>,
    /// `∂r/∂x` over the group's bundle
    pub residual_jacobian: DMatrix<f64>,
    /// `∂r_i/∂q_i` per node
    pub quote_derivatives: Vec<f64>,
    /// `∂r/∂x_p` for each known curve `p`
    pub known_blocks: BTreeMap<CurveName, DMatrix<f64>>,
}

impl GroupJacobian {
    /// Evaluates the derivatives of `residual` at the converged parameters.
    ///
    /// # Errors
    ///
    /// Pricing failures from the residual function.
    pub fn at_solution(residual: &ResidualFunction, x: &[f64], iterations: usize) -> Result<Self, CalibrationError> {
        let evaluation = residual.evaluate(x)?;
        let quote_derivatives = residual.quote_derivatives(x)?;
        let columns = residual
            .targets()
            .iter()
            .map(|t| JacobianColumn {
                curve: t.curve.clone(),
                node: t.node.clone(),
                quote_id: t.quote_id.clone(),
            })
            .collect();
        Ok(Self {
            group: residual.group().to_string(),
            iterations,
            columns,
            residual_jacobian: evaluation.jacobian,
            quote_derivatives,
            known_blocks: evaluation.known_blocks,
        })
    }

    /// Splits `∂x/∂q` into one [`JacobianCalibrationMatrix`] per curve of
    /// the bundle.
    ///
    /// Columns are the upstream quotes (in order of first appearance across
    /// the known curves) followed by the group's own nodes.
    ///
    /// # Errors
    ///
    /// - `SingularJacobian` if `J` cannot be inverted
    /// - `ParameterCountMismatch` if a block does not fit its curve's Jacobian
    /// - `MarketData` if a known curve is absent from `known`
    pub fn calibration_matrices(
        &self,
        bundle: &ParameterBundle,
        known: &RatesProvider,
        min_pivot_ratio: f64,
    ) -> Result<Vec<(CurveName, JacobianCalibrationMatrix)>, CalibrationError> {
        let n = bundle.len();
        if self.residual_jacobian.shape() != (n, n) || self.quote_derivatives.len() != n || self.columns.len() != n {
            return Err(CalibrationError::parameter_count_mismatch(
                &self.group,
                n,
                self.residual_jacobian.nrows(),
            ));
        }

        let inverse = lu_inverse(&self.residual_jacobian, min_pivot_ratio).map_err(|e| match e {
            SolverError::SingularMatrix { pivot_ratio } => CalibrationError::SingularJacobian {
                group: self.group.clone(),
                iteration: self.iterations,
                pivot_ratio,
            },
            _ => CalibrationError::parameter_count_mismatch(&self.group, n, self.residual_jacobian.ncols()),
        })?;

        let (upstream_columns, chained) = self.upstream(known, n)?;
        let upstream = -(&inverse * chained);

        let width = upstream_columns.len() + n;
        let mut full = DMatrix::zeros(n, width);
        full.columns_mut(0, upstream_columns.len()).copy_from(&upstream);
        for j in 0..n {
            let d = self.quote_derivatives[j];
            for i in 0..n {
                full[(i, upstream_columns.len() + j)] = -inverse[(i, j)] * d;
            }
        }

        let mut columns = upstream_columns;
        columns.extend(self.columns.iter().cloned());

        bundle
            .entries()
            .iter()
            .map(|entry| {
                let rows = full.rows(entry.offset, entry.count).into_owned();
                let matrix = JacobianCalibrationMatrix::new(columns.clone(), rows)?;
                Ok((entry.name.clone(), matrix))
            })
            .collect()
    }

    /// Upstream columns and `Σ_p B_p · M_p` scattered into them.
    fn upstream(&self, known: &RatesProvider, n: usize) -> Result<(Vec<JacobianColumn>, DMatrix<f64>), CalibrationError> {
        let mut columns: Vec<JacobianColumn> = Vec::new();
        let mut index: HashMap<JacobianColumn, usize> = HashMap::new();
        let mut products = Vec::new();

        for (name, block) in &self.known_blocks {
            let curve = known.curve(name)?;
            let Some(m) = curve.jacobian() else {
                debug!(group = %self.group, curve = %name, "known curve has no calibration Jacobian, treated as fixed");
                continue;
            };
            if block.ncols() != m.parameter_count() {
                return Err(CalibrationError::parameter_count_mismatch(
                    &self.group,
                    m.parameter_count(),
                    block.ncols(),
                ));
            }
            for column in m.columns() {
                if !index.contains_key(column) {
                    index.insert(column.clone(), columns.len());
                    columns.push(column.clone());
                }
            }
            products.push((block * m.matrix(), m.columns()));
        }

        let mut chained = DMatrix::zeros(n, columns.len());
        for (product, product_columns) in products {
            for (k, column) in product_columns.iter().enumerate() {
                let target = index[column];
                let mut dst = chained.column_mut(target);
                dst += product.column(k);
            }
        }
        Ok((columns, chained))
    }
}
