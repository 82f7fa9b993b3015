//! Immutable rates provider.
//!
//! A [`RatesProvider`] is a snapshot: curves by name, the currency and index
//! mappings that select discount and forward curves, FX spot rates and
//! fixings, all as of one valuation date. Curves are held behind `Arc`, so
//! [`RatesProvider::with_curves`] produces a new snapshot that shares every
//! unchanged curve with its parent. Calibration builds one such snapshot per
//! residual evaluation and never mutates an existing one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use super::curves::{CurveName, InterpolatedCurve, YieldCurve};
use super::error::MarketDataError;
use super::quotes::{FixingSeries, MarketData};
use super::sensitivity::{CurveParameterSensitivities, PointSensitivities};
use crate::types::{Currency, CurrencyPair, RateIndex};

/// Snapshot of curves and market state for pricing.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use curve_core::market_data::RatesProvider;
/// use curve_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, ValueType};
/// use curve_core::types::Currency;
///
/// let curve = InterpolatedCurve::new(
///     "USD-OIS",
///     vec![1.0, 5.0],
///     vec![0.03, 0.035],
///     ValueType::ZeroRate,
///     CurveInterpolation::Linear,
/// )
/// .unwrap();
///
/// let provider = RatesProvider::builder(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
///     .discount_curve(Currency::USD, curve)
///     .build();
///
/// let df = provider.discount_factor(Currency::USD, 1.0).unwrap();
/// assert!((df - (-0.03_f64).exp()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct RatesProvider {
    valuation_date: NaiveDate,
    curves: HashMap<CurveName, Arc<InterpolatedCurve>>,
    discount_curves: HashMap<Currency, CurveName>,
    forward_curves: HashMap<RateIndex, CurveName>,
    fx_rates: Arc<HashMap<CurrencyPair, f64>>,
    fixings: Arc<HashMap<RateIndex, FixingSeries>>,
}

impl RatesProvider {
    /// An empty provider.
    pub fn empty(valuation_date: NaiveDate) -> Self {
        Self {
            valuation_date,
            curves: HashMap::new(),
            discount_curves: HashMap::new(),
            forward_curves: HashMap::new(),
            fx_rates: Arc::new(HashMap::new()),
            fixings: Arc::new(HashMap::new()),
        }
    }

    /// Starts a builder.
    pub fn builder(valuation_date: NaiveDate) -> RatesProviderBuilder {
        RatesProviderBuilder {
            provider: Self::empty(valuation_date),
        }
    }

    /// Valuation date.
    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    /// Curve by name.
    ///
    /// # Errors
    ///
    /// `MarketDataError::CurveNotFound` if absent.
    pub fn curve(&self, name: &CurveName) -> Result<&Arc<InterpolatedCurve>, MarketDataError> {
        self.curves
            .get(name)
            .ok_or_else(|| MarketDataError::CurveNotFound {
                name: name.to_string(),
            })
    }

    /// Returns `true` if a curve with `name` exists.
    pub fn contains_curve(&self, name: &CurveName) -> bool {
        self.curves.contains_key(name)
    }

    /// Names of all curves, sorted.
    pub fn curve_names(&self) -> Vec<&CurveName> {
        let mut names: Vec<_> = self.curves.keys().collect();
        names.sort();
        names
    }

    /// Name of the discount curve for `currency`.
    ///
    /// # Errors
    ///
    /// `MarketDataError::MissingDiscountCurve` if no mapping exists.
    pub fn discount_curve_name(&self, currency: Currency) -> Result<&CurveName, MarketDataError> {
        self.discount_curves
            .get(&currency)
            .ok_or(MarketDataError::MissingDiscountCurve { currency })
    }

    /// Name of the forward curve for `index`.
    ///
    /// # Errors
    ///
    /// `MarketDataError::MissingForwardCurve` if no mapping exists.
    pub fn forward_curve_name(&self, index: &RateIndex) -> Result<&CurveName, MarketDataError> {
        self.forward_curves
            .get(index)
            .ok_or_else(|| MarketDataError::MissingForwardCurve {
                index: index.clone(),
            })
    }

    /// Discount curve for `currency`.
    ///
    /// # Errors
    ///
    /// Fails if the mapping or the mapped curve is missing.
    pub fn discount_curve(&self, currency: Currency) -> Result<&Arc<InterpolatedCurve>, MarketDataError> {
        let name = self.discount_curve_name(currency)?;
        self.curve(name)
    }

    /// Forward curve for `index`.
    ///
    /// # Errors
    ///
    /// Fails if the mapping or the mapped curve is missing.
    pub fn forward_curve(&self, index: &RateIndex) -> Result<&Arc<InterpolatedCurve>, MarketDataError> {
        let name = self.forward_curve_name(index)?;
        self.curve(name)
    }

    /// Discount factor for `currency` at `t`.
    ///
    /// # Errors
    ///
    /// Fails on a missing curve or invalid time.
    pub fn discount_factor(&self, currency: Currency, t: f64) -> Result<f64, MarketDataError> {
        self.discount_curve(currency)?.discount_factor(t)
    }

    /// Simply compounded forward rate of `index` over `[start, end]`.
    ///
    /// # Errors
    ///
    /// Fails on a missing curve or `end <= start`.
    pub fn forward_rate(&self, index: &RateIndex, start: f64, end: f64) -> Result<f64, MarketDataError> {
        if end <= start {
            return Err(MarketDataError::InvalidMaturity { t: end - start });
        }
        let curve = self.forward_curve(index)?;
        let df_start = curve.discount_factor(start)?;
        let df_end = curve.discount_factor(end)?;
        Ok((df_start / df_end - 1.0) / (end - start))
    }

    /// FX spot rate: units of `counter` per unit of `base`.
    ///
    /// Identical currencies give 1. The inverse pair is used when only it
    /// is quoted.
    ///
    /// # Errors
    ///
    /// `MarketDataError::MissingFxRate` if neither direction is available.
    pub fn fx_rate(&self, base: Currency, counter: Currency) -> Result<f64, MarketDataError> {
        // Only fails for identical currencies
        let Ok(pair) = CurrencyPair::new(base, counter) else {
            return Ok(1.0);
        };
        if let Some(rate) = self.fx_rates.get(&pair) {
            return Ok(*rate);
        }
        self.fx_rates
            .get(&pair.inverse())
            .map(|rate| 1.0 / rate)
            .ok_or(MarketDataError::MissingFxRate { pair })
    }

    /// Fixing of `index` on `date`, if published.
    pub fn fixing(&self, index: &RateIndex, date: NaiveDate) -> Option<f64> {
        self.fixings.get(index).and_then(|series| series.get(date))
    }

    /// Maps point sensitivities into sensitivities to each curve's parameters.
    ///
    /// # Errors
    ///
    /// Fails if a referenced curve is missing or a time is invalid.
    pub fn parameter_sensitivity(
        &self,
        points: &PointSensitivities,
    ) -> Result<CurveParameterSensitivities, MarketDataError> {
        let mut result = CurveParameterSensitivities::empty();
        for point in points.iter() {
            if point.value == 0.0 {
                continue;
            }
            let curve = self.curve(&point.curve)?;
            let mut sensitivity = curve.discount_factor_parameter_sensitivity(point.time)?;
            for s in sensitivity.iter_mut() {
                *s *= point.value;
            }
            result.add(point.curve.clone(), &sensitivity)?;
        }
        Ok(result)
    }

    /// New snapshot with `curves` added or replacing same-named curves.
    ///
    /// Unchanged curves are shared with `self`.
    pub fn with_curves<I>(&self, curves: I) -> Self
    where
        I: IntoIterator<Item = Arc<InterpolatedCurve>>,
    {
        let mut next = self.clone();
        for curve in curves {
            next.curves.insert(curve.name().clone(), curve);
        }
        next
    }

    /// New snapshot with additional discount and forward mappings.
    ///
    /// Later mappings replace earlier ones for the same key.
    pub fn with_mappings(
        &self,
        discount: &[(Currency, CurveName)],
        forward: &[(RateIndex, CurveName)],
    ) -> Self {
        let mut next = self.clone();
        for (currency, name) in discount {
            next.discount_curves.insert(*currency, name.clone());
        }
        for (index, name) in forward {
            next.forward_curves.insert(index.clone(), name.clone());
        }
        next
    }

    /// New snapshot whose FX rates and fixings are merged with those of
    /// `market_data`, the latter taking precedence.
    pub fn with_market_data(&self, market_data: &MarketData) -> Self {
        let mut next = self.clone();
        if !market_data.fx_rates().is_empty() {
            let mut fx = (*self.fx_rates).clone();
            fx.extend(market_data.fx_rates().iter().map(|(k, v)| (*k, *v)));
            next.fx_rates = Arc::new(fx);
        }
        if !market_data.fixings().is_empty() {
            let mut fixings = (*self.fixings).clone();
            fixings.extend(
                market_data
                    .fixings()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            next.fixings = Arc::new(fixings);
        }
        next
    }
}

/// Builder for [`RatesProvider`].
#[derive(Debug, Clone)]
pub struct RatesProviderBuilder {
    provider: RatesProvider,
}

impl RatesProviderBuilder {
    /// Adds a curve without any mapping.
    pub fn curve(mut self, curve: InterpolatedCurve) -> Self {
        self.provider
            .curves
            .insert(curve.name().clone(), Arc::new(curve));
        self
    }

    /// Adds a curve and maps `currency` to it for discounting.
    pub fn discount_curve(mut self, currency: Currency, curve: InterpolatedCurve) -> Self {
        self.provider
            .discount_curves
            .insert(currency, curve.name().clone());
        self.curve(curve)
    }

    /// Adds a curve and maps `index` to it for forward projection.
    pub fn forward_curve(mut self, index: RateIndex, curve: InterpolatedCurve) -> Self {
        self.provider
            .forward_curves
            .insert(index, curve.name().clone());
        self.curve(curve)
    }

    /// Maps `currency` to an already added (or later added) curve.
    pub fn discount_mapping(mut self, currency: Currency, name: CurveName) -> Self {
        self.provider.discount_curves.insert(currency, name);
        self
    }

    /// Maps `index` to an already added (or later added) curve.
    pub fn forward_mapping(mut self, index: RateIndex, name: CurveName) -> Self {
        self.provider.forward_curves.insert(index, name);
        self
    }

    /// Adds an FX spot rate.
    pub fn fx_rate(mut self, pair: CurrencyPair, rate: f64) -> Self {
        Arc::make_mut(&mut self.provider.fx_rates).insert(pair, rate);
        self
    }

    /// Adds a fixing series.
    pub fn fixings(mut self, index: RateIndex, series: FixingSeries) -> Self {
        Arc::make_mut(&mut self.provider.fixings).insert(index, series);
        self
    }

    /// Finishes the snapshot.
    pub fn build(self) -> RatesProvider {
        self.provider
    }
}
