//! Analytic pricing of resolved trades.
//!
//! Every pricer returns a [`PricedValue`]: the value together with its
//! [`PointSensitivities`] to the discount factors of the curves it read.
//! Mapping those through the provider gives the curve-parameter rows the
//! calibration Jacobian is built from.
//!
//! Forward rates are simply compounded ratios of the forward curve's
//! discount factors over each accrual period. A floating period starting
//! at `t = 0` uses the index fixing on the valuation date when one is
//! published.

use curve_core::market_data::curves::{CurveName, YieldCurve};
use curve_core::market_data::{MarketDataError, PointSensitivities, RatesProvider};
use curve_core::types::{Currency, RateIndex};

use super::schedule::AccrualPeriod;
use super::trade::{
    LegRate, ResolvedFra, ResolvedFxSwap, ResolvedIborFuture, ResolvedSwap, ResolvedTermDeposit,
    ResolvedTrade, ResolvedZeroRate, SwapLeg,
};

/// A value and its sensitivities to curve discount factors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricedValue {
    /// The value
    pub value: f64,
    /// Derivatives with respect to `DF_curve(t)`
    pub sensitivities: PointSensitivities,
}

impl PricedValue {
    /// A value with no curve dependence.
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            sensitivities: PointSensitivities::empty(),
        }
    }

    /// Scales value and sensitivities.
    pub fn multiplied_by(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            sensitivities: self.sensitivities.multiplied_by(factor),
        }
    }

    /// Sum of two priced values.
    pub fn plus(self, other: PricedValue) -> Self {
        Self {
            value: self.value + other.value,
            sensitivities: self.sensitivities.combined_with(other.sensitivities),
        }
    }
}

impl ResolvedTrade {
    /// Present value, in the trade's valuation currency.
    ///
    /// # Errors
    ///
    /// Fails if a required curve, mapping or FX rate is missing.
    pub fn present_value(&self, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
        match self {
            ResolvedTrade::TermDeposit(d) => deposit_pv(d, provider),
            ResolvedTrade::Fra(f) => fra_pv(f, provider),
            ResolvedTrade::IborFuture(f) => future_pv(f, provider),
            ResolvedTrade::Swap(s) => swap_pv(s, provider),
            ResolvedTrade::FxSwap(fx) => fx_swap_pv(fx, provider),
            ResolvedTrade::ZeroRate(z) => zero_rate_pv(z, provider),
        }
    }

    /// Derivative of the present value with respect to the trade's quote.
    ///
    /// # Errors
    ///
    /// As for [`ResolvedTrade::present_value`].
    pub fn quote_pv_sensitivity(&self, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
        match self {
            ResolvedTrade::TermDeposit(d) => {
                let (name, df) = discount(provider, d.currency, d.period.end)?;
                let scale = d.notional * d.period.accrual;
                Ok(PricedValue {
                    value: scale * df,
                    sensitivities: PointSensitivities::of(name, d.period.end, scale),
                })
            }
            ResolvedTrade::Fra(f) => {
                let (name, df) = discount(provider, f.index.currency(), f.period.end)?;
                let scale = -f.notional * f.period.accrual;
                Ok(PricedValue {
                    value: scale * df,
                    sensitivities: PointSensitivities::of(name, f.period.end, scale),
                })
            }
            ResolvedTrade::IborFuture(f) => Ok(PricedValue::constant(-f.notional * f.period.accrual)),
            ResolvedTrade::Swap(s) => match s.legs.get(s.quoted_leg) {
                Some(leg) => {
                    let valuation = s.legs.first().map_or(leg.currency, |first| first.currency);
                    let fx = provider.fx_rate(leg.currency, valuation)?;
                    Ok(leg_annuity(leg, provider)?.multiplied_by(fx))
                }
                None => Ok(PricedValue::default()),
            },
            ResolvedTrade::FxSwap(fx) => {
                let (name, df) = discount(provider, fx.counter, fx.far)?;
                Ok(PricedValue {
                    value: fx.notional * df,
                    sensitivities: PointSensitivities::of(name, fx.far, fx.notional),
                })
            }
            ResolvedTrade::ZeroRate(z) => Ok(PricedValue::constant(
                z.maturity * (-z.rate * z.maturity).exp(),
            )),
        }
    }
}

/// Discount curve name and discount factor for `currency` at `t`.
fn discount(
    provider: &RatesProvider,
    currency: Currency,
    t: f64,
) -> Result<(CurveName, f64), MarketDataError> {
    let name = provider.discount_curve_name(currency)?;
    let df = provider.curve(name)?.discount_factor(t)?;
    Ok((name.clone(), df))
}

/// Projected rate of `index` over `period`.
fn forward_rate(
    provider: &RatesProvider,
    index: &RateIndex,
    period: &AccrualPeriod,
) -> Result<PricedValue, MarketDataError> {
    if period.start <= 0.0 {
        if let Some(fixing) = provider.fixing(index, provider.valuation_date()) {
            return Ok(PricedValue::constant(fixing));
        }
    }
    if period.accrual <= 0.0 {
        return Err(MarketDataError::InvalidMaturity { t: period.accrual });
    }
    let name = provider.forward_curve_name(index)?;
    let curve = provider.curve(name)?;
    let df_start = curve.discount_factor(period.start)?;
    let df_end = curve.discount_factor(period.end)?;
    let tau = period.accrual;

    let mut sensitivities = PointSensitivities::empty();
    sensitivities.push(name.clone(), period.start, 1.0 / (tau * df_end));
    sensitivities.push(name.clone(), period.end, -df_start / (tau * df_end * df_end));
    Ok(PricedValue {
        value: (df_start / df_end - 1.0) / tau,
        sensitivities,
    })
}

fn deposit_pv(d: &ResolvedTermDeposit, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let (name, df_start) = discount(provider, d.currency, d.period.start)?;
    let (_, df_end) = discount(provider, d.currency, d.period.end)?;
    let repayment = d.notional * (1.0 + d.rate * d.period.accrual);

    let mut sensitivities = PointSensitivities::empty();
    sensitivities.push(name.clone(), d.period.start, -d.notional);
    sensitivities.push(name, d.period.end, repayment);
    Ok(PricedValue {
        value: -d.notional * df_start + repayment * df_end,
        sensitivities,
    })
}

fn fra_pv(f: &ResolvedFra, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let forward = forward_rate(provider, &f.index, &f.period)?;
    let (name, df) = discount(provider, f.index.currency(), f.period.end)?;
    let scale = f.notional * f.period.accrual;
    let margin = forward.value - f.fixed_rate;

    let value = scale * margin * df;
    let sensitivities = forward
        .sensitivities
        .multiplied_by(scale * df)
        .combined_with(PointSensitivities::of(name, f.period.end, scale * margin));
    Ok(PricedValue { value, sensitivities })
}

fn future_pv(f: &ResolvedIborFuture, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let forward = forward_rate(provider, &f.index, &f.period)?;
    let scale = f.notional * f.period.accrual;
    Ok(PricedValue {
        value: scale * (1.0 - forward.value - f.price),
        sensitivities: forward.sensitivities.multiplied_by(-scale),
    })
}

fn swap_pv(swap: &ResolvedSwap, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let mut total = PricedValue::default();
    let Some(valuation) = swap.legs.first().map(|leg| leg.currency) else {
        return Ok(total);
    };
    for leg in &swap.legs {
        let fx = provider.fx_rate(leg.currency, valuation)?;
        total = total.plus(leg_pv(leg, provider)?.multiplied_by(fx));
    }
    Ok(total)
}

fn leg_pv(leg: &SwapLeg, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let mut total = PricedValue::default();
    for period in &leg.periods {
        let (name, df) = discount(provider, leg.currency, period.end)?;
        let scale = leg.notional * period.accrual;
        let rate = match &leg.rate {
            LegRate::Fixed(rate) => PricedValue::constant(*rate),
            LegRate::Floating { index, spread } => {
                let forward = forward_rate(provider, index, period)?;
                PricedValue {
                    value: forward.value + spread,
                    sensitivities: forward.sensitivities,
                }
            }
        };
        total.value += scale * rate.value * df;
        total
            .sensitivities
            .push(name, period.end, scale * rate.value);
        total.sensitivities = total
            .sensitivities
            .combined_with(rate.sensitivities.multiplied_by(scale * df));
    }

    if leg.notional_exchange {
        if let (Some(first), Some(last)) = (leg.periods.first(), leg.periods.last()) {
            let (name, df_start) = discount(provider, leg.currency, first.start)?;
            let (_, df_end) = discount(provider, leg.currency, last.end)?;
            total.value += leg.notional * (df_end - df_start);
            total.sensitivities.push(name.clone(), first.start, -leg.notional);
            total.sensitivities.push(name, last.end, leg.notional);
        }
    }
    Ok(total)
}

/// PV of one unit of rate (or spread) on `leg`, in the leg's currency.
fn leg_annuity(leg: &SwapLeg, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let mut total = PricedValue::default();
    for period in &leg.periods {
        let (name, df) = discount(provider, leg.currency, period.end)?;
        let scale = leg.notional * period.accrual;
        total.value += scale * df;
        total.sensitivities.push(name, period.end, scale);
    }
    Ok(total)
}

fn fx_swap_pv(fx: &ResolvedFxSwap, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let spot = provider.fx_rate(fx.base, fx.counter)?;
    let (base_name, base_near) = discount(provider, fx.base, fx.near)?;
    let (_, base_far) = discount(provider, fx.base, fx.far)?;
    let (counter_name, counter_near) = discount(provider, fx.counter, fx.near)?;
    let (_, counter_far) = discount(provider, fx.counter, fx.far)?;

    let n = fx.notional;
    let value = spot * n * (base_near - base_far) + n * (fx.far_rate * counter_far - fx.near_rate * counter_near);

    let mut sensitivities = PointSensitivities::empty();
    sensitivities.push(base_name.clone(), fx.near, spot * n);
    sensitivities.push(base_name, fx.far, -spot * n);
    sensitivities.push(counter_name.clone(), fx.near, -n * fx.near_rate);
    sensitivities.push(counter_name, fx.far, n * fx.far_rate);
    Ok(PricedValue { value, sensitivities })
}

/// Value of a zero-coupon bond on the discount curve bought at the quoted
/// zero rate.
fn zero_rate_pv(z: &ResolvedZeroRate, provider: &RatesProvider) -> Result<PricedValue, MarketDataError> {
    let (name, df) = discount(provider, z.currency, z.maturity)?;
    Ok(PricedValue {
        value: df - (-z.rate * z.maturity).exp(),
        sensitivities: PointSensitivities::of(name, z.maturity, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::schedule::{schedule, Frequency};
    use crate::instruments::trade::TradeKind;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use curve_core::market_data::curves::{CurveInterpolation, InterpolatedCurve, ValueType};
    use curve_core::market_data::FixingSeries;
    use curve_core::types::{CurrencyPair, Tenor};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn curve(name: &str, rates: &[f64]) -> InterpolatedCurve {
        InterpolatedCurve::new(
            name,
            vec![0.5, 1.0, 2.0, 5.0, 10.0],
            rates.to_vec(),
            ValueType::ZeroRate,
            CurveInterpolation::Linear,
        )
        .unwrap()
    }

    fn euribor() -> RateIndex {
        RateIndex::new("EUR-EURIBOR-6M", Currency::EUR, Tenor::SixMonth)
    }

    fn provider() -> RatesProvider {
        RatesProvider::builder(date())
            .discount_curve(Currency::EUR, curve("EUR-ESTR", &[0.030, 0.031, 0.032, 0.034, 0.036]))
            .forward_curve(euribor(), curve("EUR-6M", &[0.033, 0.034, 0.035, 0.037, 0.039]))
            .discount_curve(Currency::USD, curve("USD-SOFR", &[0.050, 0.049, 0.046, 0.043, 0.042]))
            .fx_rate(CurrencyPair::new(Currency::EUR, Currency::USD).unwrap(), 1.10)
            .build()
    }

    /// Central difference of `f` with respect to every curve parameter,
    /// compared with the priced sensitivities mapped through the provider.
    fn assert_parameter_sensitivities<F>(trade: &ResolvedTrade, base: &RatesProvider, f: F)
    where
        F: Fn(&ResolvedTrade, &RatesProvider) -> PricedValue,
    {
        let analytic = base
            .parameter_sensitivity(&f(trade, base).sensitivities)
            .unwrap();
        for name in base.curve_names() {
            let curve = base.curve(name).unwrap();
            for j in 0..curve.parameter_count() {
                let h = 1e-6;
                let mut up = curve.parameters().to_vec();
                up[j] += h;
                let mut down = curve.parameters().to_vec();
                down[j] -= h;
                let p_up = base.with_curves([std::sync::Arc::new(curve.with_parameters(up).unwrap())]);
                let p_dn = base.with_curves([std::sync::Arc::new(curve.with_parameters(down).unwrap())]);
                let fd = (f(trade, &p_up).value - f(trade, &p_dn).value) / (2.0 * h);
                let an = analytic.get(name).map(|row| row[j]).unwrap_or(0.0);
                assert_relative_eq!(an, fd, epsilon = 1e-6, max_relative = 1e-6);
            }
        }
    }

    fn pv(trade: &ResolvedTrade, p: &RatesProvider) -> PricedValue {
        trade.present_value(p).unwrap()
    }

    #[test]
    fn test_deposit_at_par_has_zero_pv() {
        let p = provider();
        let df = p.discount_factor(Currency::EUR, 1.0).unwrap();
        let par = (1.0 / df - 1.0) / 1.0;
        let trade = ResolvedTrade::TermDeposit(ResolvedTermDeposit {
            currency: Currency::EUR,
            period: AccrualPeriod::new(0.0, 1.0),
            notional: 1.0,
            rate: par,
        });
        assert_relative_eq!(pv(&trade, &p).value, 0.0, epsilon = 1e-15);
        assert_parameter_sensitivities(&trade, &p, pv);

        let annuity = trade.quote_pv_sensitivity(&p).unwrap();
        assert_relative_eq!(annuity.value, df);
    }

    #[test]
    fn test_fra_and_future_sensitivities() {
        let p = provider();
        let period = AccrualPeriod::new(0.5, 1.0);
        let fra = ResolvedTrade::Fra(ResolvedFra {
            index: euribor(),
            period,
            notional: 1.0,
            fixed_rate: 0.03,
        });
        let forward = p.forward_rate(&euribor(), 0.5, 1.0).unwrap();
        let df = p.discount_factor(Currency::EUR, 1.0).unwrap();
        assert_relative_eq!(pv(&fra, &p).value, 0.5 * (forward - 0.03) * df, epsilon = 1e-15);
        assert_parameter_sensitivities(&fra, &p, pv);

        let future = ResolvedTrade::IborFuture(ResolvedIborFuture {
            index: euribor(),
            period,
            notional: 1.0,
            price: 0.97,
        });
        assert_relative_eq!(pv(&future, &p).value, 0.5 * (0.03 - forward), epsilon = 1e-15);
        assert_parameter_sensitivities(&future, &p, pv);
    }

    #[test]
    fn test_swap_sensitivities_and_annuity() {
        let p = provider();
        let swap = ResolvedTrade::Swap(ResolvedSwap {
            kind: TradeKind::FixedFloatSwap,
            legs: vec![
                SwapLeg {
                    currency: Currency::EUR,
                    notional: 1.0,
                    periods: schedule(0.0, 5.0, Frequency::Annual),
                    rate: LegRate::Fixed(0.035),
                    notional_exchange: false,
                },
                SwapLeg {
                    currency: Currency::EUR,
                    notional: -1.0,
                    periods: schedule(0.0, 5.0, Frequency::SemiAnnual),
                    rate: LegRate::Floating {
                        index: euribor(),
                        spread: 0.0,
                    },
                    notional_exchange: false,
                },
            ],
            quoted_leg: 0,
        });
        assert_parameter_sensitivities(&swap, &p, pv);
        assert_parameter_sensitivities(&swap, &p, |t, p| t.quote_pv_sensitivity(p).unwrap());

        // Annuity is the PV change for a unit change of the fixed rate
        let annuity = swap.quote_pv_sensitivity(&p).unwrap().value;
        let expected: f64 = (1..=5)
            .map(|i| p.discount_factor(Currency::EUR, i as f64).unwrap())
            .sum();
        assert_relative_eq!(annuity, expected, epsilon = 1e-14);
    }

    #[test]
    fn test_cross_currency_swap_in_first_leg_currency() {
        let p = provider();
        let leg = |currency, notional, index: RateIndex| SwapLeg {
            currency,
            notional,
            periods: schedule(0.0, 2.0, Frequency::SemiAnnual),
            rate: LegRate::Floating { index, spread: 0.0 },
            notional_exchange: true,
        };
        let usd_index = RateIndex::overnight("USD-SOFR", Currency::USD);
        let p = p.with_mappings(&[], &[(usd_index.clone(), CurveName::new("USD-SOFR"))]);
        let swap = ResolvedTrade::Swap(ResolvedSwap {
            kind: TradeKind::XccySwap,
            legs: vec![
                leg(Currency::EUR, 1.0, euribor()),
                leg(Currency::USD, -1.10, usd_index.clone()),
            ],
            quoted_leg: 0,
        });
        assert_parameter_sensitivities(&swap, &p, pv);
        assert_parameter_sensitivities(&swap, &p, |t, p| t.quote_pv_sensitivity(p).unwrap());

        // A floating leg with notional exchange, projected and discounted
        // on the same curve, is worth zero
        let single = ResolvedTrade::Swap(ResolvedSwap {
            kind: TradeKind::XccySwap,
            legs: vec![leg(Currency::USD, 1.0, usd_index)],
            quoted_leg: 0,
        });
        assert_relative_eq!(pv(&single, &p).value, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_fx_swap_at_forward_points_has_zero_pv() {
        let p = provider();
        let spot = 1.10;
        let df_eur = p.discount_factor(Currency::EUR, 1.0).unwrap();
        let df_usd = p.discount_factor(Currency::USD, 1.0).unwrap();
        let forward = spot * df_eur / df_usd;
        let trade = ResolvedTrade::FxSwap(ResolvedFxSwap {
            base: Currency::EUR,
            counter: Currency::USD,
            near: 0.0,
            far: 1.0,
            notional: 1.0,
            near_rate: spot,
            far_rate: forward,
        });
        assert_relative_eq!(pv(&trade, &p).value, 0.0, epsilon = 1e-14);
        assert_parameter_sensitivities(&trade, &p, pv);
    }

    #[test]
    fn test_fixing_replaces_first_forward() {
        let p = provider();
        let fixed = p.with_market_data(
            &curve_core::market_data::MarketData::new(date())
                .with_fixings(euribor(), FixingSeries::new().with_fixing(date(), 0.05)),
        );
        let fra = ResolvedTrade::Fra(ResolvedFra {
            index: euribor(),
            period: AccrualPeriod::new(0.0, 0.5),
            notional: 1.0,
            fixed_rate: 0.05,
        });
        let value = pv(&fra, &fixed);
        assert_relative_eq!(value.value, 0.0, epsilon = 1e-15);
        assert!(fixed
            .parameter_sensitivity(&value.sensitivities)
            .unwrap()
            .get(&CurveName::new("EUR-6M"))
            .is_none());
    }

    #[test]
    fn test_zero_rate_pv() {
        let p = provider();
        let z = p.discount_curve(Currency::EUR).unwrap().zero_rate(2.0).unwrap();
        let trade = ResolvedTrade::ZeroRate(ResolvedZeroRate {
            currency: Currency::EUR,
            maturity: 2.0,
            rate: z,
        });
        assert_relative_eq!(pv(&trade, &p).value, 0.0, epsilon = 1e-15);
        assert_parameter_sensitivities(&trade, &p, pv);
    }

    #[test]
    fn test_missing_curve_is_reported() {
        let p = RatesProvider::empty(date());
        let trade = ResolvedTrade::ZeroRate(ResolvedZeroRate {
            currency: Currency::GBP,
            maturity: 1.0,
            rate: 0.04,
        });
        assert!(trade.present_value(&p).unwrap_err().is_missing_curve());
    }
}
