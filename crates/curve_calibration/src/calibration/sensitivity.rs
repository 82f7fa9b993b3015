//! Market-quote sensitivities.
//!
//! [`MarketQuoteSensitivityCalculator`] re-expresses curve-parameter
//! sensitivities as sensitivities to the market quotes the curves were
//! calibrated to, using the Jacobian stored on each calibrated curve:
//!
//! ```text
//! ∂V/∂q_j = Σ_curves Σ_i (∂V/∂x_i) · (∂x_i/∂q_j)
//! ```
//!
//! [`FiniteDifferenceVerifier`] computes the same quantity by bumping each
//! quote, recalibrating and repricing, for validation.

use std::collections::{BTreeMap, BTreeSet};

use curve_core::market_data::{CurveParameterSensitivities, MarketData, PointSensitivities, QuoteId, RatesProvider};
use tracing::debug;

use crate::calibration::calibrator::CurveCalibrator;
use crate::calibration::definition::CurveGroupDefinition;
use crate::error::CalibrationError;

/// Sensitivities keyed by market quote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSensitivities(BTreeMap<QuoteId, f64>);

impl QuoteSensitivities {
    /// Creates an empty map.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds `value` to the entry for `quote`.
    pub fn add(&mut self, quote: QuoteId, value: f64) {
        *self.0.entry(quote).or_insert(0.0) += value;
    }

    /// Sensitivity to `quote`, if any.
    pub fn get(&self, quote: &QuoteId) -> Option<f64> {
        self.0.get(quote).copied()
    }

    /// Entries ordered by quote identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&QuoteId, f64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    /// Number of quotes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum over all quotes.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl FromIterator<(QuoteId, f64)> for QuoteSensitivities {
    fn from_iter<I: IntoIterator<Item = (QuoteId, f64)>>(iter: I) -> Self {
        let mut out = Self::empty();
        for (quote, value) in iter {
            out.add(quote, value);
        }
        out
    }
}

/// Maps curve-parameter sensitivities to market-quote sensitivities.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use curve_calibration::calibration::{
///     CurveCalibrator, CurveDefinition, CurveGroupDefinition, CurveNode, MarketQuoteSensitivityCalculator,
/// };
/// use curve_calibration::instruments::NodeTemplate;
/// use curve_core::market_data::curves::{CurveInterpolation, CurveName, ValueType};
/// use curve_core::market_data::{CurveParameterSensitivities, MarketData, QuoteId, RatesProvider};
/// use curve_core::types::Currency;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let nodes = vec![CurveNode::new("1Y", "Z-1Y", NodeTemplate::zero_rate(Currency::USD, 1.0))];
/// let group = CurveGroupDefinition::new("USD").with_discount_curve(
///     CurveDefinition::new("USD-OIS", ValueType::ZeroRate, CurveInterpolation::Linear, nodes),
///     Currency::USD,
/// );
/// let market = MarketData::new(date).with_quote("Z-1Y", 0.04);
/// let provider = CurveCalibrator::default()
///     .calibrate(&[group], &market, &RatesProvider::empty(date))
///     .unwrap()
///     .into_provider();
///
/// // A zero-rate parameter moves one for one with a zero-rate quote
/// let mut sens = CurveParameterSensitivities::empty();
/// sens.add(CurveName::new("USD-OIS"), &[2.0]).unwrap();
/// let quotes = MarketQuoteSensitivityCalculator::new().sensitivity(&sens, &provider).unwrap();
/// assert!((quotes.get(&QuoteId::new("Z-1Y")).unwrap() - 2.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketQuoteSensitivityCalculator;

impl MarketQuoteSensitivityCalculator {
    /// Creates a calculator.
    pub fn new() -> Self {
        Self
    }

    /// Quote sensitivities of `sensitivity`.
    ///
    /// Curves in `provider` without a calibration Jacobian are skipped.
    ///
    /// # Errors
    ///
    /// `MarketData` if a curve is missing from `provider` or a row has the
    /// wrong length.
    pub fn sensitivity(
        &self,
        sensitivity: &CurveParameterSensitivities,
        provider: &RatesProvider,
    ) -> Result<QuoteSensitivities, CalibrationError> {
        let mut out = QuoteSensitivities::empty();
        for (name, row) in sensitivity.iter() {
            let curve = provider.curve(name)?;
            let Some(jacobian) = curve.jacobian() else {
                debug!(curve = %name, "no calibration Jacobian, skipping");
                continue;
            };
            let per_quote = jacobian.quote_sensitivity(row)?;
            for (column, value) in jacobian.columns().iter().zip(per_quote) {
                out.add(column.quote_id.clone(), value);
            }
        }
        Ok(out)
    }

    /// Quote sensitivities of point sensitivities, mapped through
    /// `provider` first.
    ///
    /// # Errors
    ///
    /// As for [`MarketQuoteSensitivityCalculator::sensitivity`].
    pub fn point_sensitivity(
        &self,
        points: &PointSensitivities,
        provider: &RatesProvider,
    ) -> Result<QuoteSensitivities, CalibrationError> {
        let parameters = provider.parameter_sensitivity(points)?;
        self.sensitivity(&parameters, provider)
    }
}

/// Bump-and-recalibrate quote sensitivities.
#[derive(Debug, Clone)]
pub struct FiniteDifferenceVerifier {
    calibrator: CurveCalibrator,
    bump: f64,
}

impl FiniteDifferenceVerifier {
    /// Default bump size.
    pub const DEFAULT_BUMP: f64 = 1e-6;

    /// Creates a verifier recalibrating with `calibrator`.
    pub fn new(calibrator: CurveCalibrator, bump: f64) -> Self {
        Self { calibrator, bump }
    }

    /// Bump size.
    pub fn bump(&self) -> f64 {
        self.bump
    }

    /// Central differences `(V(q+ε) - V(q-ε)) / 2ε` for every distinct
    /// quote of `groups`, each with a full recalibration.
    ///
    /// A quote shared by several nodes is bumped once, moving all of them.
    ///
    /// # Errors
    ///
    /// `MissingQuote` for an absent quote, `InvalidConfig` for a
    /// non-positive bump, and any calibration or pricing failure.
    pub fn quote_sensitivities<F>(
        &self,
        groups: &[CurveGroupDefinition],
        market_data: &MarketData,
        known: &RatesProvider,
        pricer: F,
    ) -> Result<QuoteSensitivities, CalibrationError>
    where
        F: Fn(&RatesProvider) -> Result<f64, CalibrationError>,
    {
        if !(self.bump > 0.0 && self.bump.is_finite()) {
            return Err(CalibrationError::invalid_config(format!(
                "bump must be positive, got {}",
                self.bump
            )));
        }

        let mut seen = BTreeSet::new();
        let mut out = QuoteSensitivities::empty();
        for group in groups {
            for entry in group.entries() {
                for node in entry.definition.nodes() {
                    if !seen.insert(node.quote_id()) {
                        continue;
                    }
                    let missing = || {
                        CalibrationError::missing_quote(
                            group.name(),
                            entry.definition.name().as_str(),
                            node.label(),
                            node.quote_id().as_str(),
                        )
                    };
                    let up = market_data.bumped(node.quote_id(), self.bump).ok_or_else(missing)?;
                    let down = market_data.bumped(node.quote_id(), -self.bump).ok_or_else(missing)?;

                    let v_up = pricer(self.calibrator.calibrate(groups, &up, known)?.provider())?;
                    let v_down = pricer(self.calibrator.calibrate(groups, &down, known)?.provider())?;
                    out.add(node.quote_id().clone(), (v_up - v_down) / (2.0 * self.bump));
                }
            }
        }
        Ok(out)
    }
}

/// Comparison of analytic and finite-difference sensitivities.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityVerification {
    /// Analytic sensitivities
    pub analytic: QuoteSensitivities,
    /// Finite-difference sensitivities
    pub numeric: QuoteSensitivities,
    /// Maximum absolute difference
    pub max_absolute_difference: f64,
    /// Maximum relative difference
    pub max_relative_difference: f64,
    /// Whether every absolute difference is within tolerance
    pub within_tolerance: bool,
}

impl SensitivityVerification {
    /// Compares over the union of quotes; a missing entry counts as zero.
    pub fn compare(analytic: QuoteSensitivities, numeric: QuoteSensitivities, tolerance: f64) -> Self {
        let mut max_abs_diff: f64 = 0.0;
        let mut max_rel_diff: f64 = 0.0;

        let quotes: BTreeSet<&QuoteId> =
            analytic.0.keys().chain(numeric.0.keys()).collect();
        for quote in quotes {
            let a = analytic.get(quote).unwrap_or(0.0);
            let n = numeric.get(quote).unwrap_or(0.0);
            let abs_diff = (a - n).abs();
            let rel_diff = if n.abs() > 1e-10 { abs_diff / n.abs() } else { abs_diff };
            max_abs_diff = max_abs_diff.max(abs_diff);
            max_rel_diff = max_rel_diff.max(rel_diff);
        }

        Self {
            within_tolerance: max_abs_diff <= tolerance,
            analytic,
            numeric,
            max_absolute_difference: max_abs_diff,
            max_relative_difference: max_rel_diff,
        }
    }
}
