//! Residual function of a curve group.
//!
//! [`ResidualFunction`] maps a flat parameter vector to one residual per
//! node. Each evaluation unflattens the vector into fresh curves and prices
//! every node against a new provider snapshot built from the base provider
//! (known curves, mappings, FX and fixings); nothing is mutated in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use curve_core::market_data::curves::{CurveName, InterpolatedCurve};
use curve_core::market_data::{QuoteId, RatesProvider};
use curve_core::math::solvers::NonlinearSystem;
use nalgebra::DMatrix;

use crate::calibration::bundle::ParameterBundle;
use crate::calibration::measure::CalibrationMeasure;
use crate::error::CalibrationError;
use crate::instruments::ResolvedTrade;

/// A node's resolved trade and the measure matched to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTarget {
    /// Curve the node belongs to
    pub curve: CurveName,
    /// Node label
    pub node: String,
    /// Quote identifier
    pub quote_id: QuoteId,
    /// Trade built from the node template and quote
    pub trade: ResolvedTrade,
    /// Residual measure
    pub measure: CalibrationMeasure,
}

/// Residuals and derivatives at one parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualEvaluation {
    /// One residual per node
    pub residuals: Vec<f64>,
    /// `∂r/∂x` over the bundle
    pub jacobian: DMatrix<f64>,
    /// `∂r/∂x_p` for every curve `p` outside the bundle the nodes depend on
    pub known_blocks: BTreeMap<CurveName, DMatrix<f64>>,
}

/// Residual function of one curve group.
#[derive(Debug, Clone)]
pub struct ResidualFunction {
    group: String,
    curves: Vec<InterpolatedCurve>,
    bundle: ParameterBundle,
    targets: Vec<CalibrationTarget>,
    base: RatesProvider,
}

impl ResidualFunction {
    /// Creates the residual function.
    ///
    /// `curves` are templates whose parameters are replaced on every
    /// evaluation; `base` must already hold the group's curve mappings.
    ///
    /// # Errors
    ///
    /// `ParameterCountMismatch` if the node count differs from the
    /// parameter count, `DuplicateCurveName` from the bundle.
    pub fn new(
        group: impl Into<String>,
        curves: Vec<InterpolatedCurve>,
        targets: Vec<CalibrationTarget>,
        base: RatesProvider,
    ) -> Result<Self, CalibrationError> {
        let group = group.into();
        let bundle = ParameterBundle::of(group.clone(), &curves)?;
        if bundle.len() != targets.len() {
            return Err(CalibrationError::parameter_count_mismatch(&group, bundle.len(), targets.len()));
        }
        Ok(Self {
            group,
            curves,
            bundle,
            targets,
            base,
        })
    }

    /// Group name.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Parameter layout.
    pub fn bundle(&self) -> &ParameterBundle {
        &self.bundle
    }

    /// Nodes in residual order.
    pub fn targets(&self) -> &[CalibrationTarget] {
        &self.targets
    }

    /// Parameters of the template curves.
    ///
    /// # Errors
    ///
    /// As for [`ParameterBundle::flatten`].
    pub fn initial_parameters(&self) -> Result<Vec<f64>, CalibrationError> {
        self.bundle.flatten(&self.curves)
    }

    /// Curves carrying the parameters `x`.
    ///
    /// # Errors
    ///
    /// As for [`ParameterBundle::unflatten`].
    pub fn curves_at(&self, x: &[f64]) -> Result<Vec<InterpolatedCurve>, CalibrationError> {
        self.bundle.unflatten(x, &self.curves)
    }

    /// Provider snapshot with the group's curves at `x`.
    ///
    /// # Errors
    ///
    /// As for [`ParameterBundle::unflatten`].
    pub fn provider_at(&self, x: &[f64]) -> Result<RatesProvider, CalibrationError> {
        let curves = self.curves_at(x)?;
        Ok(self.base.with_curves(curves.into_iter().map(Arc::new)))
    }

    /// Residuals, bundle Jacobian and known-curve blocks at `x`.
    ///
    /// # Errors
    ///
    /// Pricing failures, tagged with the failing node.
    pub fn evaluate(&self, x: &[f64]) -> Result<ResidualEvaluation, CalibrationError> {
        let provider = self.provider_at(x)?;
        let n = self.targets.len();
        let mut residuals = Vec::with_capacity(n);
        let mut jacobian = DMatrix::zeros(n, self.bundle.len());
        let mut known_blocks: BTreeMap<CurveName, DMatrix<f64>> = BTreeMap::new();

        for (i, target) in self.targets.iter().enumerate() {
            let (value, sensitivity) = target
                .measure
                .derivative(&target.trade, &provider)
                .map_err(|e| self.node_error(target, e))?;
            residuals.push(value);
            for (curve, row) in sensitivity.iter() {
                if let Some(range) = self.bundle.range_of(curve) {
                    for (j, v) in range.zip(row) {
                        jacobian[(i, j)] = *v;
                    }
                } else {
                    let block = known_blocks
                        .entry(curve.clone())
                        .or_insert_with(|| DMatrix::zeros(n, row.len()));
                    for (j, v) in row.iter().enumerate() {
                        block[(i, j)] = *v;
                    }
                }
            }
        }

        Ok(ResidualEvaluation {
            residuals,
            jacobian,
            known_blocks,
        })
    }

    /// `∂r_i/∂q_i` for every node at `x`.
    ///
    /// # Errors
    ///
    /// Pricing failures, tagged with the failing node.
    pub fn quote_derivatives(&self, x: &[f64]) -> Result<Vec<f64>, CalibrationError> {
        let provider = self.provider_at(x)?;
        self.targets
            .iter()
            .map(|target| {
                target
                    .measure
                    .quote_derivative(&target.trade, &provider)
                    .map_err(|e| self.node_error(target, e))
            })
            .collect()
    }

    /// Adds group and node context to a pricing failure.
    fn node_error(&self, target: &CalibrationTarget, error: CalibrationError) -> CalibrationError {
        match error {
            CalibrationError::MarketData(e) if e.is_missing_curve() => CalibrationError::missing_curve(
                &self.group,
                target.curve.as_str(),
                &target.node,
                e.to_string(),
            ),
            CalibrationError::UnsupportedMeasure { measure, .. } => CalibrationError::UnsupportedMeasure {
                group: self.group.clone(),
                curve: target.curve.to_string(),
                node: target.node.clone(),
                measure,
            },
            other => other,
        }
    }
}

impl NonlinearSystem for ResidualFunction {
    type Error = CalibrationError;

    fn dimension(&self) -> usize {
        self.bundle.len()
    }

    fn residuals(&self, x: &[f64]) -> Result<Vec<f64>, CalibrationError> {
        let provider = self.provider_at(x)?;
        self.targets
            .iter()
            .map(|target| {
                target
                    .measure
                    .value(&target.trade, &provider)
                    .map_err(|e| self.node_error(target, e))
            })
            .collect()
    }

    fn jacobian(&self, x: &[f64]) -> Result<DMatrix<f64>, CalibrationError> {
        Ok(self.evaluate(x)?.jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::NodeTemplate;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use curve_core::market_data::curves::{CurveInterpolation, ValueType};
    use curve_core::market_data::MarketData;
    use curve_core::types::{Currency, RateIndex, Tenor};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn libor() -> RateIndex {
        RateIndex::new("USD-LIBOR-3M", Currency::USD, Tenor::ThreeMonth)
    }

    fn target(curve: &str, node: &str, template: NodeTemplate, quote: f64) -> CalibrationTarget {
        CalibrationTarget {
            curve: CurveName::new(curve),
            node: node.to_string(),
            quote_id: QuoteId::new(node),
            trade: template.resolve(quote, &MarketData::new(date()), 1.0).unwrap(),
            measure: CalibrationMeasure::ParSpread,
        }
    }

    /// Forward curve calibrated against a known discount curve.
    fn forward_system() -> ResidualFunction {
        let discount = InterpolatedCurve::new(
            "USD-OIS",
            vec![1.0, 5.0],
            vec![0.04, 0.042],
            ValueType::ZeroRate,
            CurveInterpolation::Linear,
        )
        .unwrap();
        let base = RatesProvider::builder(date())
            .discount_curve(Currency::USD, discount)
            .forward_mapping(libor(), CurveName::new("USD-3M"))
            .build();
        let forward = InterpolatedCurve::new(
            "USD-3M",
            vec![1.0, 2.0],
            vec![0.045, 0.045],
            ValueType::ZeroRate,
            CurveInterpolation::Linear,
        )
        .unwrap();
        ResidualFunction::new(
            "USD-3M",
            vec![forward],
            vec![
                target("USD-3M", "FRA-1Y", NodeTemplate::fra(libor(), 0.75, 1.0), 0.046),
                target(
                    "USD-3M",
                    "IRS-2Y",
                    NodeTemplate::swap(libor(), 2.0, crate::instruments::Frequency::SemiAnnual),
                    0.047,
                ),
            ],
            base,
        )
        .unwrap()
    }

    #[test]
    fn test_dimension_and_initial_parameters() {
        let system = forward_system();
        assert_eq!(system.dimension(), 2);
        assert_eq!(system.initial_parameters().unwrap(), vec![0.045, 0.045]);
        assert_eq!(system.targets().len(), 2);
        assert_eq!(system.group(), "USD-3M");
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let system = forward_system();
        let x = vec![0.044, 0.047];
        let eval = system.evaluate(&x).unwrap();
        assert_eq!(eval.residuals, system.residuals(&x).unwrap());

        let h = 1e-7;
        for j in 0..2 {
            let mut up = x.clone();
            up[j] += h;
            let mut down = x.clone();
            down[j] -= h;
            let r_up = system.residuals(&up).unwrap();
            let r_dn = system.residuals(&down).unwrap();
            for i in 0..2 {
                let fd = (r_up[i] - r_dn[i]) / (2.0 * h);
                assert_relative_eq!(eval.jacobian[(i, j)], fd, epsilon = 1e-7, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn test_known_curve_blocks() {
        let system = forward_system();
        let eval = system.evaluate(&[0.045, 0.046]).unwrap();
        let block = eval.known_blocks.get(&CurveName::new("USD-OIS")).unwrap();
        assert_eq!(block.shape(), (2, 2));
        // The swap is discounted on the known curve
        assert!(block.row(1).iter().any(|v| v.abs() > 0.0));
        assert!(!eval.known_blocks.contains_key(&CurveName::new("USD-3M")));
    }

    #[test]
    fn test_quote_derivatives() {
        let system = forward_system();
        assert_eq!(system.quote_derivatives(&[0.045, 0.046]).unwrap(), vec![-1.0, -1.0]);
    }

    #[test]
    fn test_count_mismatch() {
        let system = forward_system();
        let err = ResidualFunction::new("G", system.curves.clone(), vec![], system.base.clone()).unwrap_err();
        assert!(matches!(err, CalibrationError::ParameterCountMismatch { .. }));
        assert!(system.residuals(&[0.01]).unwrap_err().is_configuration());
    }

    #[test]
    fn test_missing_curve_gets_node_context() {
        let system = forward_system();
        let orphan = ResidualFunction::new(
            "G",
            system.curves.clone(),
            vec![
                target("USD-3M", "EUR-DEP", NodeTemplate::deposit(Currency::EUR, 1.0), 0.03),
                target("USD-3M", "FRA-1Y", NodeTemplate::fra(libor(), 0.75, 1.0), 0.046),
            ],
            system.base.clone(),
        )
        .unwrap();
        let err = orphan.residuals(&[0.04, 0.04]).unwrap_err();
        match err {
            CalibrationError::MissingCurve { node, .. } => assert_eq!(node, "EUR-DEP"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
