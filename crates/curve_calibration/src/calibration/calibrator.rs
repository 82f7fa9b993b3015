//! Group orchestrator.
//!
//! [`CurveCalibrator`] calibrates curve groups in caller order. Each group is
//! solved jointly by Newton's method against a provider holding the known
//! curves and every earlier group, then its curves are stored with their
//! calibration Jacobians and merged into the provider for the next group.
//!
//! Any failure aborts the run. There is no partial result.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use curve_calibration::calibration::{CurveCalibrator, CurveDefinition, CurveGroupDefinition, CurveNode};
//! use curve_calibration::instruments::NodeTemplate;
//! use curve_core::market_data::curves::{CurveInterpolation, ValueType, YieldCurve};
//! use curve_core::market_data::{MarketData, RatesProvider};
//! use curve_core::types::Currency;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let nodes = vec![
//!     CurveNode::new("1Y", "USD-DEP-1Y", NodeTemplate::deposit(Currency::USD, 1.0)),
//!     CurveNode::new("2Y", "USD-DEP-2Y", NodeTemplate::deposit(Currency::USD, 2.0)),
//! ];
//! let group = CurveGroupDefinition::new("USD").with_discount_curve(
//!     CurveDefinition::new("USD-OIS", ValueType::ZeroRate, CurveInterpolation::Linear, nodes),
//!     Currency::USD,
//! );
//! let market = MarketData::new(date)
//!     .with_quote("USD-DEP-1Y", 0.05)
//!     .with_quote("USD-DEP-2Y", 0.052);
//!
//! let result = CurveCalibrator::default()
//!     .calibrate(&[group], &market, &RatesProvider::empty(date))
//!     .unwrap();
//! let df = result.provider().discount_factor(Currency::USD, 1.0).unwrap();
//! assert!((df - 1.0 / 1.05).abs() < 1e-10);
//! ```

use std::sync::Arc;

use curve_core::market_data::curves::CurveName;
use curve_core::market_data::{MarketData, MarketDataError, RatesProvider};
use curve_core::math::solvers::{ConvergenceResult, FailureReason, NewtonFailure, NewtonIteration, NewtonState};
use tracing::{debug, info, info_span, trace, warn};

use crate::calibration::definition::{CurveGroupDefinition, CurveNode};
use crate::calibration::jacobian::GroupJacobian;
use crate::calibration::measure::CalibrationMeasures;
use crate::calibration::residual::{CalibrationTarget, ResidualFunction};
use crate::config::CalibratorConfig;
use crate::error::CalibrationError;

/// Diagnostics of one calibrated group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCalibration {
    /// Group name
    pub group: String,
    /// Calibrated curves in bundle order
    pub curves: Vec<CurveName>,
    /// Node labels in residual order
    pub nodes: Vec<String>,
    /// Newton iterations taken
    pub iterations: usize,
    /// Largest absolute residual at the solution
    pub max_residual: f64,
    /// Residuals at the solution
    pub residuals: Vec<f64>,
    /// Derivatives at the solution, including the residual Jacobian
    pub jacobian: GroupJacobian,
}

/// Outcome of a calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    provider: RatesProvider,
    groups: Vec<GroupCalibration>,
}

impl CalibrationResult {
    /// Provider holding the known curves and every calibrated curve.
    pub fn provider(&self) -> &RatesProvider {
        &self.provider
    }

    /// Consumes the result, returning the provider.
    pub fn into_provider(self) -> RatesProvider {
        self.provider
    }

    /// Per-group diagnostics in calibration order.
    pub fn groups(&self) -> &[GroupCalibration] {
        &self.groups
    }

    /// Diagnostics of the named group.
    pub fn group(&self, name: &str) -> Option<&GroupCalibration> {
        self.groups.iter().find(|g| g.group == name)
    }

    /// Total Newton iterations across groups.
    pub fn total_iterations(&self) -> usize {
        self.groups.iter().map(|g| g.iterations).sum()
    }
}

/// An independent calibration run for [`CurveCalibrator::calibrate_batch`].
#[derive(Debug, Clone)]
pub struct CalibrationRequest {
    /// Groups in calibration order
    pub groups: Vec<CurveGroupDefinition>,
    /// Quotes, FX rates and fixings
    pub market_data: MarketData,
    /// Curves that are not calibrated
    pub known: RatesProvider,
}

/// Calibrates curve groups.
#[derive(Debug, Clone, Default)]
pub struct CurveCalibrator {
    config: CalibratorConfig,
    measures: CalibrationMeasures,
}

impl CurveCalibrator {
    /// Creates a calibrator.
    pub fn new(config: CalibratorConfig, measures: CalibrationMeasures) -> Self {
        Self { config, measures }
    }

    /// Create with default configuration and par-spread measures.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Get the configuration.
    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }

    /// Get the measure table.
    pub fn measures(&self) -> &CalibrationMeasures {
        &self.measures
    }

    /// Calibrates `groups` in order on top of `known`.
    ///
    /// # Errors
    ///
    /// The first failure of any group; see [`CalibrationError`].
    pub fn calibrate(
        &self,
        groups: &[CurveGroupDefinition],
        market_data: &MarketData,
        known: &RatesProvider,
    ) -> Result<CalibrationResult, CalibrationError> {
        self.config.validate()?;
        check_valuation_date(market_data, known)?;

        let mut provider = known.with_market_data(market_data);
        let mut calibrated = Vec::with_capacity(groups.len());
        for group in groups {
            let (next, diagnostics) = self.calibrate_group(group, market_data, &provider)?;
            provider = next;
            calibrated.push(diagnostics);
        }

        info!(
            groups = calibrated.len(),
            iterations = calibrated.iter().map(|g| g.iterations).sum::<usize>(),
            "calibration complete"
        );
        Ok(CalibrationResult {
            provider,
            groups: calibrated,
        })
    }

    /// Calibrates one group on top of `provider`.
    ///
    /// Returns the provider extended with the group's curves and mappings.
    ///
    /// # Errors
    ///
    /// - Configuration errors before any iteration: invalid definitions,
    ///   unsupported measures, curves no provider can supply
    /// - Data errors for missing quotes or FX rates
    /// - Numerical errors from the solver
    pub fn calibrate_group(
        &self,
        group: &CurveGroupDefinition,
        market_data: &MarketData,
        provider: &RatesProvider,
    ) -> Result<(RatesProvider, GroupCalibration), CalibrationError> {
        let span = info_span!("calibrate_group", group = group.name(), nodes = group.node_count());
        let _enter = span.enter();

        let residual = self
            .prepare(group, market_data, provider)
            .inspect_err(|e| warn!(error = %e, "group rejected"))?;
        let x0 = residual.initial_parameters()?;
        info!(curves = residual.bundle().entries().len(), "starting calibration");

        let solution = match self.solve(&residual, x0)? {
            ConvergenceResult::Converged(solution) => solution,
            ConvergenceResult::Failed(failure) => {
                let error = failure_error(&residual, failure);
                warn!(error = %error, "calibration failed");
                return Err(error);
            }
        };

        let jacobian = GroupJacobian::at_solution(&residual, &solution.parameters, solution.iterations)?;
        let base = residual.provider_at(&solution.parameters)?;
        let matrices = jacobian.calibration_matrices(residual.bundle(), &base, self.config.min_pivot_ratio)?;

        let curves = residual
            .curves_at(&solution.parameters)?
            .into_iter()
            .zip(matrices)
            .map(|(curve, (_, matrix))| curve.with_jacobian(matrix).map(Arc::new))
            .collect::<Result<Vec<_>, MarketDataError>>()?;
        let next = base.with_curves(curves);

        let diagnostics = GroupCalibration {
            group: group.name().to_string(),
            curves: residual.bundle().entries().iter().map(|e| e.name.clone()).collect(),
            nodes: residual.targets().iter().map(|t| t.node.clone()).collect(),
            iterations: solution.iterations,
            max_residual: solution.max_residual(),
            residuals: solution.residuals,
            jacobian,
        };
        info!(
            iterations = diagnostics.iterations,
            max_residual = diagnostics.max_residual,
            "group calibrated"
        );
        Ok((next, diagnostics))
    }

    /// Calibrates independent requests, in parallel when the `parallel`
    /// feature is enabled.
    #[cfg(feature = "parallel")]
    pub fn calibrate_batch(&self, requests: &[CalibrationRequest]) -> Vec<Result<CalibrationResult, CalibrationError>> {
        use rayon::prelude::*;

        requests
            .par_iter()
            .map(|r| self.calibrate(&r.groups, &r.market_data, &r.known))
            .collect()
    }

    /// Sequential fallback when the `parallel` feature is disabled.
    #[cfg(not(feature = "parallel"))]
    pub fn calibrate_batch(&self, requests: &[CalibrationRequest]) -> Vec<Result<CalibrationResult, CalibrationError>> {
        requests
            .iter()
            .map(|r| self.calibrate(&r.groups, &r.market_data, &r.known))
            .collect()
    }

    /// Validates the group, resolves its nodes and checks that every
    /// trade can be priced at the starting curves.
    fn prepare(
        &self,
        group: &CurveGroupDefinition,
        market_data: &MarketData,
        provider: &RatesProvider,
    ) -> Result<ResidualFunction, CalibrationError> {
        self.config.validate()?;
        check_valuation_date(market_data, provider)?;
        group.validate()?;
        for name in group.curve_names() {
            if provider.contains_curve(name) {
                return Err(CalibrationError::duplicate_curve_name(group.name(), name.as_str()));
            }
        }

        let mut targets = Vec::with_capacity(group.node_count());
        let mut curves = Vec::with_capacity(group.entries().len());
        for entry in group.entries() {
            let definition = &entry.definition;
            let mut rates = Vec::with_capacity(definition.parameter_count());
            for node in definition.nodes() {
                let (target, rate) = self.resolve_node(group.name(), definition.name(), node, market_data)?;
                targets.push(target);
                rates.push(rate);
            }
            curves.push(definition.initial_curve(group.name(), &rates)?);
        }

        let base = provider
            .with_market_data(market_data)
            .with_mappings(&group.discount_mappings(), &group.forward_mappings());
        let residual = ResidualFunction::new(group.name(), curves, targets, base)?;

        // Surfaces missing curves as configuration errors before iterating
        residual.evaluate(&residual.initial_parameters()?)?;
        Ok(residual)
    }

    /// Builds a node's target and its starting zero rate.
    fn resolve_node(
        &self,
        group: &str,
        curve: &CurveName,
        node: &CurveNode,
        market_data: &MarketData,
    ) -> Result<(CalibrationTarget, f64), CalibrationError> {
        let template = node.template();
        let kind = template.kind();
        let measure = node.measure().unwrap_or_else(|| self.measures.measure_for(kind));
        if !measure.supports(kind) {
            return Err(CalibrationError::UnsupportedMeasure {
                group: group.to_string(),
                curve: curve.to_string(),
                node: node.label().to_string(),
                measure: measure.name().to_string(),
            });
        }

        let quote = market_data
            .quote(node.quote_id())
            .ok_or_else(|| CalibrationError::missing_quote(group, curve.as_str(), node.label(), node.quote_id().as_str()))?;
        let trade = template
            .resolve(quote, market_data, self.config.node_notional)
            .map_err(|e| match e {
                MarketDataError::MissingFxRate { pair } => CalibrationError::MissingFxRate {
                    group: group.to_string(),
                    node: node.label().to_string(),
                    pair,
                },
                other => other.into(),
            })?;
        let rate = template
            .initial_rate(quote)
            .unwrap_or(self.config.initial_rate_guess);

        Ok((
            CalibrationTarget {
                curve: curve.clone(),
                node: node.label().to_string(),
                quote_id: node.quote_id().clone(),
                trade,
                measure,
            },
            rate,
        ))
    }

    /// Drives the Newton state machine to a terminal state.
    fn solve(&self, residual: &ResidualFunction, x0: Vec<f64>) -> Result<ConvergenceResult, CalibrationError> {
        let mut iteration = NewtonIteration::new(residual, x0, self.config.solver_config());
        loop {
            match iteration.step()? {
                NewtonState::Initialized => {}
                NewtonState::Iterating { iteration: k } => {
                    if k > 0 {
                        debug!(
                            iteration = k,
                            max_residual = iteration.last_max_residual(),
                            relative_step = iteration.last_relative_step().unwrap_or(f64::NAN),
                            "newton step"
                        );
                        trace!(parameters = ?iteration.parameters(), "newton parameters");
                    }
                }
                NewtonState::Converged | NewtonState::Failed => break,
            }
        }
        iteration
            .into_outcome()
            .ok_or_else(|| CalibrationError::not_converged(residual.group(), 0, f64::NAN))
    }
}

fn check_valuation_date(market_data: &MarketData, provider: &RatesProvider) -> Result<(), CalibrationError> {
    if market_data.valuation_date() != provider.valuation_date() {
        return Err(CalibrationError::ValuationDateMismatch {
            market_data: market_data.valuation_date().to_string(),
            known: provider.valuation_date().to_string(),
        });
    }
    Ok(())
}

fn failure_error(residual: &ResidualFunction, failure: NewtonFailure) -> CalibrationError {
    let group = residual.group();
    match failure.reason {
        FailureReason::MaxIterationsExceeded => {
            CalibrationError::not_converged(group, failure.iterations, failure.max_residual)
        }
        FailureReason::SingularJacobian { pivot_ratio } => CalibrationError::SingularJacobian {
            group: group.to_string(),
            iteration: failure.iterations,
            pivot_ratio,
        },
        FailureReason::NonFiniteResidual { index } => CalibrationError::NonFiniteResidual {
            group: group.to_string(),
            node: residual
                .targets()
                .get(index)
                .map(|t| t.node.clone())
                .unwrap_or_default(),
            iteration: failure.iterations,
        },
        FailureReason::InvalidStep => CalibrationError::StepRejected {
            group: group.to_string(),
            iteration: failure.iterations,
        },
        FailureReason::DimensionMismatch { expected, actual } => {
            CalibrationError::parameter_count_mismatch(group, expected, actual)
        }
    }
}
