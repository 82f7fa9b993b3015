//! Calibration measures.
//!
//! A measure turns a resolved trade and a rates provider into the residual
//! the solver drives to zero, together with its derivatives with respect to
//! the curve parameters and to the trade's own quote.

use std::collections::HashMap;
use std::fmt;

use curve_core::market_data::curves::YieldCurve;
use curve_core::market_data::{CurveParameterSensitivities, PointSensitivities, RatesProvider};

use crate::error::CalibrationError;
use crate::instruments::{PricedValue, ResolvedTrade, TradeKind};

/// Quantity matched to zero for a calibration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalibrationMeasure {
    /// Model-implied quote minus market quote, `-PV / (∂PV/∂quote)`.
    #[default]
    ParSpread,
    /// Present value of the node trade.
    PresentValue,
    /// Model zero rate minus quoted zero rate; zero-rate quotes only.
    ZeroRate,
}

impl CalibrationMeasure {
    /// Measure name for display.
    pub fn name(&self) -> &'static str {
        match self {
            CalibrationMeasure::ParSpread => "ParSpread",
            CalibrationMeasure::PresentValue => "PresentValue",
            CalibrationMeasure::ZeroRate => "ZeroRate",
        }
    }

    /// Returns `true` if the measure applies to trades of `kind`.
    pub fn supports(&self, kind: TradeKind) -> bool {
        match self {
            CalibrationMeasure::ZeroRate => kind == TradeKind::ZeroRate,
            CalibrationMeasure::ParSpread | CalibrationMeasure::PresentValue => {
                kind != TradeKind::ZeroRate
            }
        }
    }

    /// Residual value.
    ///
    /// # Errors
    ///
    /// `UnsupportedMeasure` for an unsupported trade kind, otherwise any
    /// pricing failure.
    pub fn value(&self, trade: &ResolvedTrade, provider: &RatesProvider) -> Result<f64, CalibrationError> {
        Ok(self.point_sensitivity(trade, provider)?.value)
    }

    /// Residual value and its derivative with respect to every curve
    /// parameter the trade depends on.
    ///
    /// # Errors
    ///
    /// As for [`CalibrationMeasure::value`].
    pub fn derivative(
        &self,
        trade: &ResolvedTrade,
        provider: &RatesProvider,
    ) -> Result<(f64, CurveParameterSensitivities), CalibrationError> {
        let priced = self.point_sensitivity(trade, provider)?;
        let sensitivity = provider.parameter_sensitivity(&priced.sensitivities)?;
        Ok((priced.value, sensitivity))
    }

    /// Derivative of the residual with respect to the node's quote.
    ///
    /// # Errors
    ///
    /// As for [`CalibrationMeasure::value`].
    pub fn quote_derivative(&self, trade: &ResolvedTrade, provider: &RatesProvider) -> Result<f64, CalibrationError> {
        self.check(trade)?;
        match self {
            CalibrationMeasure::ParSpread | CalibrationMeasure::ZeroRate => Ok(-1.0),
            CalibrationMeasure::PresentValue => Ok(trade.quote_pv_sensitivity(provider)?.value),
        }
    }

    /// Residual value with its sensitivities to curve discount factors.
    ///
    /// # Errors
    ///
    /// As for [`CalibrationMeasure::value`].
    pub fn point_sensitivity(
        &self,
        trade: &ResolvedTrade,
        provider: &RatesProvider,
    ) -> Result<PricedValue, CalibrationError> {
        self.check(trade)?;
        match (self, trade) {
            (CalibrationMeasure::PresentValue, _) => Ok(trade.present_value(provider)?),
            (CalibrationMeasure::ParSpread, _) => {
                let pv = trade.present_value(provider)?;
                let annuity = trade.quote_pv_sensitivity(provider)?;
                let a = annuity.value;
                let sensitivities = pv
                    .sensitivities
                    .multiplied_by(-1.0 / a)
                    .combined_with(annuity.sensitivities.multiplied_by(pv.value / (a * a)));
                Ok(PricedValue {
                    value: -pv.value / a,
                    sensitivities,
                })
            }
            (CalibrationMeasure::ZeroRate, ResolvedTrade::ZeroRate(z)) => {
                let name = provider.discount_curve_name(z.currency)?;
                let df = provider.curve(name)?.discount_factor(z.maturity)?;
                Ok(PricedValue {
                    value: -df.ln() / z.maturity - z.rate,
                    sensitivities: PointSensitivities::of(name.clone(), z.maturity, -1.0 / (z.maturity * df)),
                })
            }
            (CalibrationMeasure::ZeroRate, _) => Err(self.unsupported(trade)),
        }
    }

    fn check(&self, trade: &ResolvedTrade) -> Result<(), CalibrationError> {
        if self.supports(trade.kind()) {
            Ok(())
        } else {
            Err(self.unsupported(trade))
        }
    }

    fn unsupported(&self, trade: &ResolvedTrade) -> CalibrationError {
        CalibrationError::UnsupportedMeasure {
            group: String::new(),
            curve: String::new(),
            node: trade.kind().to_string(),
            measure: self.name().to_string(),
        }
    }
}

impl fmt::Display for CalibrationMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lookup table from trade kind to calibration measure.
///
/// # Examples
///
/// ```
/// use curve_calibration::calibration::{CalibrationMeasure, CalibrationMeasures};
/// use curve_calibration::instruments::TradeKind;
///
/// let measures = CalibrationMeasures::par_spread()
///     .with(TradeKind::FxSwap, CalibrationMeasure::PresentValue);
/// assert_eq!(measures.measure_for(TradeKind::FxSwap), CalibrationMeasure::PresentValue);
/// assert_eq!(measures.measure_for(TradeKind::FixedFloatSwap), CalibrationMeasure::ParSpread);
/// assert_eq!(measures.measure_for(TradeKind::ZeroRate), CalibrationMeasure::ZeroRate);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationMeasures {
    default: CalibrationMeasure,
    overrides: HashMap<TradeKind, CalibrationMeasure>,
}

impl CalibrationMeasures {
    /// Par spread for every trade, zero rate for zero-rate quotes.
    pub fn par_spread() -> Self {
        Self::with_default(CalibrationMeasure::ParSpread)
    }

    /// Present value for every trade, zero rate for zero-rate quotes.
    pub fn present_value() -> Self {
        Self::with_default(CalibrationMeasure::PresentValue)
    }

    fn with_default(default: CalibrationMeasure) -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(TradeKind::ZeroRate, CalibrationMeasure::ZeroRate);
        Self { default, overrides }
    }

    /// Returns the table with `kind` mapped to `measure`.
    pub fn with(mut self, kind: TradeKind, measure: CalibrationMeasure) -> Self {
        self.overrides.insert(kind, measure);
        self
    }

    /// Measure used for trades of `kind`.
    pub fn measure_for(&self, kind: TradeKind) -> CalibrationMeasure {
        self.overrides.get(&kind).copied().unwrap_or(self.default)
    }
}

impl Default for CalibrationMeasures {
    fn default() -> Self {
        Self::par_spread()
    }
}
