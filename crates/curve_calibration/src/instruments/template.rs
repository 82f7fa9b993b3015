//! Calibration node templates.
//!
//! A [`NodeTemplate`] describes the shape of a calibration instrument
//! without its market level. [`NodeTemplate::resolve`] combines it with a
//! quote and the node notional into a [`ResolvedTrade`]. All times are year
//! fractions from the valuation date.

use curve_core::market_data::{MarketData, MarketDataError};
use curve_core::types::{Currency, CurrencyPair, RateIndex};

use super::schedule::{schedule, AccrualPeriod, Frequency};
use super::trade::{
    LegRate, ResolvedFra, ResolvedFxSwap, ResolvedIborFuture, ResolvedSwap, ResolvedTermDeposit,
    ResolvedTrade, ResolvedZeroRate, SwapLeg, TradeKind,
};

/// Shape of a calibration instrument.
///
/// # Examples
///
/// ```
/// use curve_calibration::instruments::{Frequency, NodeTemplate, TradeKind};
/// use curve_core::types::{Currency, RateIndex};
///
/// let sofr = RateIndex::overnight("USD-SOFR", Currency::USD);
/// let swap = NodeTemplate::swap(sofr, 5.0, Frequency::Annual);
/// assert_eq!(swap.kind(), TradeKind::FixedFloatSwap);
/// assert_eq!(swap.node_time(), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTemplate {
    /// Term deposit quoted as a simple rate.
    TermDeposit {
        /// Deposit currency
        currency: Currency,
        /// Start time
        start: f64,
        /// End time
        end: f64,
    },
    /// FRA quoted as its fixed rate.
    Fra {
        /// Projected index
        index: RateIndex,
        /// Start time
        start: f64,
        /// End time
        end: f64,
    },
    /// Interest rate future quoted as a price, `1 - rate`.
    IborFuture {
        /// Underlying index
        index: RateIndex,
        /// Start of the underlying rate period
        start: f64,
        /// End of the underlying rate period
        end: f64,
    },
    /// Fixed against floating swap quoted as its fixed rate.
    FixedFloatSwap {
        /// Floating index
        index: RateIndex,
        /// Start time
        start: f64,
        /// Length in years
        tenor: f64,
        /// Fixed leg frequency
        fixed_frequency: Frequency,
        /// Floating leg frequency
        float_frequency: Frequency,
    },
    /// Floating against floating swap quoted as a spread on the first index.
    BasisSwap {
        /// Index receiving the spread
        spread_index: RateIndex,
        /// Index paid flat
        flat_index: RateIndex,
        /// Start time
        start: f64,
        /// Length in years
        tenor: f64,
        /// Payment frequency of both legs
        frequency: Frequency,
    },
    /// FX swap quoted as forward points over spot.
    FxSwap {
        /// Base currency
        base: Currency,
        /// Counter currency
        counter: Currency,
        /// Near exchange time
        near: f64,
        /// Far exchange time
        far: f64,
    },
    /// Cross-currency floating swap with notional exchanges, quoted as a
    /// spread on the first (foreign) leg.
    XccySwap {
        /// Foreign index receiving the spread
        spread_index: RateIndex,
        /// Domestic index paid flat
        flat_index: RateIndex,
        /// Start time
        start: f64,
        /// Length in years
        tenor: f64,
        /// Payment frequency of both legs
        frequency: Frequency,
    },
    /// Continuously compounded zero rate on a currency's discount curve.
    ZeroRate {
        /// Currency of the discount curve
        currency: Currency,
        /// Maturity in years
        maturity: f64,
    },
}

impl NodeTemplate {
    /// Spot-starting deposit ending at `end`.
    pub fn deposit(currency: Currency, end: f64) -> Self {
        NodeTemplate::TermDeposit {
            currency,
            start: 0.0,
            end,
        }
    }

    /// FRA over `[start, end]`.
    pub fn fra(index: RateIndex, start: f64, end: f64) -> Self {
        NodeTemplate::Fra { index, start, end }
    }

    /// Future on `index` over one index tenor from `start`.
    pub fn future(index: RateIndex, start: f64) -> Self {
        let end = start + index.tenor().period_years();
        NodeTemplate::IborFuture { index, start, end }
    }

    /// Spot-starting swap; the floating leg pays at the index tenor.
    pub fn swap(index: RateIndex, tenor: f64, fixed_frequency: Frequency) -> Self {
        let float_frequency = Frequency::of_tenor(index.tenor());
        NodeTemplate::FixedFloatSwap {
            index,
            start: 0.0,
            tenor,
            fixed_frequency,
            float_frequency,
        }
    }

    /// Spot-starting basis swap paying at the flat index tenor.
    pub fn basis_swap(spread_index: RateIndex, flat_index: RateIndex, tenor: f64) -> Self {
        let frequency = Frequency::of_tenor(flat_index.tenor());
        NodeTemplate::BasisSwap {
            spread_index,
            flat_index,
            start: 0.0,
            tenor,
            frequency,
        }
    }

    /// FX swap with near leg at spot and far leg at `far`.
    pub fn fx_swap(base: Currency, counter: Currency, far: f64) -> Self {
        NodeTemplate::FxSwap {
            base,
            counter,
            near: 0.0,
            far,
        }
    }

    /// Spot-starting cross-currency swap paying quarterly.
    pub fn xccy_swap(spread_index: RateIndex, flat_index: RateIndex, tenor: f64) -> Self {
        NodeTemplate::XccySwap {
            spread_index,
            flat_index,
            start: 0.0,
            tenor,
            frequency: Frequency::Quarterly,
        }
    }

    /// Zero-rate quote at `maturity`.
    pub fn zero_rate(currency: Currency, maturity: f64) -> Self {
        NodeTemplate::ZeroRate { currency, maturity }
    }

    /// Kind of the trades this template resolves to.
    pub fn kind(&self) -> TradeKind {
        match self {
            NodeTemplate::TermDeposit { .. } => TradeKind::TermDeposit,
            NodeTemplate::Fra { .. } => TradeKind::Fra,
            NodeTemplate::IborFuture { .. } => TradeKind::IborFuture,
            NodeTemplate::FixedFloatSwap { .. } => TradeKind::FixedFloatSwap,
            NodeTemplate::BasisSwap { .. } => TradeKind::BasisSwap,
            NodeTemplate::FxSwap { .. } => TradeKind::FxSwap,
            NodeTemplate::XccySwap { .. } => TradeKind::XccySwap,
            NodeTemplate::ZeroRate { .. } => TradeKind::ZeroRate,
        }
    }

    /// Curve node time: the instrument's maturity.
    pub fn node_time(&self) -> f64 {
        match self {
            NodeTemplate::TermDeposit { end, .. }
            | NodeTemplate::Fra { end, .. }
            | NodeTemplate::IborFuture { end, .. } => *end,
            NodeTemplate::FixedFloatSwap { start, tenor, .. }
            | NodeTemplate::BasisSwap { start, tenor, .. }
            | NodeTemplate::XccySwap { start, tenor, .. } => start + tenor,
            NodeTemplate::FxSwap { far, .. } => *far,
            NodeTemplate::ZeroRate { maturity, .. } => *maturity,
        }
    }

    /// Starting zero rate implied by `quote`, when the quote is a rate.
    pub fn initial_rate(&self, quote: f64) -> Option<f64> {
        match self {
            NodeTemplate::TermDeposit { .. }
            | NodeTemplate::Fra { .. }
            | NodeTemplate::FixedFloatSwap { .. }
            | NodeTemplate::ZeroRate { .. } => Some(quote),
            NodeTemplate::IborFuture { .. } => Some(1.0 - quote),
            NodeTemplate::BasisSwap { .. }
            | NodeTemplate::FxSwap { .. }
            | NodeTemplate::XccySwap { .. } => None,
        }
    }

    /// Checks the template's times and currencies.
    ///
    /// # Errors
    ///
    /// A description of the first inconsistency.
    pub fn validate(&self) -> Result<(), String> {
        let (start, end) = match self {
            NodeTemplate::TermDeposit { start, end, .. }
            | NodeTemplate::Fra { start, end, .. }
            | NodeTemplate::IborFuture { start, end, .. } => (*start, *end),
            NodeTemplate::FixedFloatSwap { start, tenor, .. }
            | NodeTemplate::BasisSwap { start, tenor, .. }
            | NodeTemplate::XccySwap { start, tenor, .. } => (*start, start + tenor),
            NodeTemplate::FxSwap { near, far, .. } => (*near, *far),
            NodeTemplate::ZeroRate { maturity, .. } => (0.0, *maturity),
        };
        if !(start.is_finite() && end.is_finite()) || start < 0.0 || end <= start {
            return Err(format!("invalid period [{start}, {end}]"));
        }
        match self {
            NodeTemplate::BasisSwap {
                spread_index,
                flat_index,
                ..
            } if spread_index.currency() != flat_index.currency() => Err(format!(
                "basis swap indices {spread_index} and {flat_index} have different currencies"
            )),
            NodeTemplate::XccySwap {
                spread_index,
                flat_index,
                ..
            } if spread_index.currency() == flat_index.currency() => Err(format!(
                "cross-currency swap indices {spread_index} and {flat_index} share a currency"
            )),
            NodeTemplate::FxSwap { base, counter, .. } if base == counter => {
                Err(format!("FX swap in a single currency {base}"))
            }
            _ => Ok(()),
        }
    }

    /// Builds the trade for `quote` with the given notional.
    ///
    /// # Errors
    ///
    /// `MarketDataError::MissingFxRate` when an FX or cross-currency swap
    /// needs a spot rate the market data lacks.
    pub fn resolve(
        &self,
        quote: f64,
        market_data: &MarketData,
        notional: f64,
    ) -> Result<ResolvedTrade, MarketDataError> {
        let trade = match self {
            NodeTemplate::TermDeposit {
                currency,
                start,
                end,
            } => ResolvedTrade::TermDeposit(ResolvedTermDeposit {
                currency: *currency,
                period: AccrualPeriod::new(*start, *end),
                notional,
                rate: quote,
            }),
            NodeTemplate::Fra { index, start, end } => ResolvedTrade::Fra(ResolvedFra {
                index: index.clone(),
                period: AccrualPeriod::new(*start, *end),
                notional,
                fixed_rate: quote,
            }),
            NodeTemplate::IborFuture { index, start, end } => {
                ResolvedTrade::IborFuture(ResolvedIborFuture {
                    index: index.clone(),
                    period: AccrualPeriod::new(*start, *end),
                    notional,
                    price: quote,
                })
            }
            NodeTemplate::FixedFloatSwap {
                index,
                start,
                tenor,
                fixed_frequency,
                float_frequency,
            } => {
                let end = start + tenor;
                ResolvedTrade::Swap(ResolvedSwap {
                    kind: TradeKind::FixedFloatSwap,
                    legs: vec![
                        SwapLeg {
                            currency: index.currency(),
                            notional,
                            periods: schedule(*start, end, *fixed_frequency),
                            rate: LegRate::Fixed(quote),
                            notional_exchange: false,
                        },
                        floating_leg(index, -notional, *start, end, *float_frequency, false),
                    ],
                    quoted_leg: 0,
                })
            }
            NodeTemplate::BasisSwap {
                spread_index,
                flat_index,
                start,
                tenor,
                frequency,
            } => {
                let end = start + tenor;
                let mut spread_leg = floating_leg(spread_index, notional, *start, end, *frequency, false);
                spread_leg.rate = LegRate::Floating {
                    index: spread_index.clone(),
                    spread: quote,
                };
                ResolvedTrade::Swap(ResolvedSwap {
                    kind: TradeKind::BasisSwap,
                    legs: vec![
                        spread_leg,
                        floating_leg(flat_index, -notional, *start, end, *frequency, false),
                    ],
                    quoted_leg: 0,
                })
            }
            NodeTemplate::FxSwap {
                base,
                counter,
                near,
                far,
            } => {
                let spot = market_fx(market_data, *base, *counter)?;
                ResolvedTrade::FxSwap(ResolvedFxSwap {
                    base: *base,
                    counter: *counter,
                    near: *near,
                    far: *far,
                    notional,
                    near_rate: spot,
                    far_rate: spot + quote,
                })
            }
            NodeTemplate::XccySwap {
                spread_index,
                flat_index,
                start,
                tenor,
                frequency,
            } => {
                let end = start + tenor;
                let spot = market_fx(market_data, spread_index.currency(), flat_index.currency())?;
                let mut spread_leg = floating_leg(spread_index, notional, *start, end, *frequency, true);
                spread_leg.rate = LegRate::Floating {
                    index: spread_index.clone(),
                    spread: quote,
                };
                ResolvedTrade::Swap(ResolvedSwap {
                    kind: TradeKind::XccySwap,
                    legs: vec![
                        spread_leg,
                        floating_leg(flat_index, -notional * spot, *start, end, *frequency, true),
                    ],
                    quoted_leg: 0,
                })
            }
            NodeTemplate::ZeroRate { currency, maturity } => ResolvedTrade::ZeroRate(ResolvedZeroRate {
                currency: *currency,
                maturity: *maturity,
                rate: quote,
            }),
        };
        Ok(trade)
    }
}

fn floating_leg(
    index: &RateIndex,
    notional: f64,
    start: f64,
    end: f64,
    frequency: Frequency,
    notional_exchange: bool,
) -> SwapLeg {
    SwapLeg {
        currency: index.currency(),
        notional,
        periods: schedule(start, end, frequency),
        rate: LegRate::Floating {
            index: index.clone(),
            spread: 0.0,
        },
        notional_exchange,
    }
}

/// Spot rate from the market data, inverting the pair if needed.
fn market_fx(market_data: &MarketData, base: Currency, counter: Currency) -> Result<f64, MarketDataError> {
    let Ok(pair) = CurrencyPair::new(base, counter) else {
        return Ok(1.0);
    };
    if let Some(rate) = market_data.fx_rates().get(&pair) {
        return Ok(*rate);
    }
    market_data
        .fx_rates()
        .get(&pair.inverse())
        .map(|rate| 1.0 / rate)
        .ok_or(MarketDataError::MissingFxRate { pair })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use curve_core::types::Tenor;

    fn market() -> MarketData {
        MarketData::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
            .with_fx_rate(CurrencyPair::new(Currency::USD, Currency::JPY).unwrap(), 150.0)
    }

    fn sofr() -> RateIndex {
        RateIndex::overnight("USD-SOFR", Currency::USD)
    }

    #[test]
    fn test_node_times() {
        assert_eq!(NodeTemplate::deposit(Currency::USD, 0.5).node_time(), 0.5);
        let libor = RateIndex::new("USD-LIBOR-3M", Currency::USD, Tenor::ThreeMonth);
        assert_relative_eq!(NodeTemplate::future(libor.clone(), 0.25).node_time(), 0.5);
        assert_eq!(NodeTemplate::basis_swap(libor, sofr(), 10.0).node_time(), 10.0);
        assert_eq!(NodeTemplate::fx_swap(Currency::JPY, Currency::USD, 2.0).node_time(), 2.0);
    }

    #[test]
    fn test_initial_rate() {
        let libor = RateIndex::new("USD-LIBOR-3M", Currency::USD, Tenor::ThreeMonth);
        assert_eq!(NodeTemplate::deposit(Currency::USD, 1.0).initial_rate(0.05), Some(0.05));
        assert_relative_eq!(NodeTemplate::future(libor.clone(), 0.5).initial_rate(0.95).unwrap(), 0.05);
        assert_eq!(NodeTemplate::basis_swap(libor, sofr(), 5.0).initial_rate(0.001), None);
    }

    #[test]
    fn test_validate() {
        assert!(NodeTemplate::deposit(Currency::USD, 1.0).validate().is_ok());
        assert!(NodeTemplate::deposit(Currency::USD, 0.0).validate().is_err());
        assert!(NodeTemplate::fra(sofr(), 1.0, 0.5).validate().is_err());
        assert!(NodeTemplate::fx_swap(Currency::USD, Currency::USD, 1.0).validate().is_err());
        let euribor = RateIndex::new("EUR-EURIBOR-3M", Currency::EUR, Tenor::ThreeMonth);
        assert!(NodeTemplate::basis_swap(euribor.clone(), sofr(), 2.0).validate().is_err());
        assert!(NodeTemplate::xccy_swap(euribor, sofr(), 2.0).validate().is_ok());
    }

    #[test]
    fn test_resolve_swap() {
        let trade = NodeTemplate::swap(sofr(), 3.0, Frequency::Annual)
            .resolve(0.045, &market(), 2.0)
            .unwrap();
        let ResolvedTrade::Swap(swap) = trade else {
            panic!("expected a swap");
        };
        assert_eq!(swap.legs.len(), 2);
        assert_eq!(swap.legs[0].rate, LegRate::Fixed(0.045));
        assert_eq!(swap.legs[0].notional, 2.0);
        assert_eq!(swap.legs[1].notional, -2.0);
        assert_eq!(swap.legs[1].periods.len(), 3);
    }

    #[test]
    fn test_resolve_fx_products_use_market_spot() {
        let fx = NodeTemplate::fx_swap(Currency::JPY, Currency::USD, 1.0)
            .resolve(-0.0001, &market(), 1.0)
            .unwrap();
        let ResolvedTrade::FxSwap(fx) = fx else {
            panic!("expected an FX swap");
        };
        assert_relative_eq!(fx.near_rate, 1.0 / 150.0);
        assert_relative_eq!(fx.far_rate, 1.0 / 150.0 - 0.0001);

        let tonar = RateIndex::overnight("JPY-TONAR", Currency::JPY);
        let xccy = NodeTemplate::xccy_swap(tonar, sofr(), 2.0)
            .resolve(-0.002, &market(), 1.0)
            .unwrap();
        let ResolvedTrade::Swap(xccy) = xccy else {
            panic!("expected a swap");
        };
        assert_relative_eq!(xccy.legs[1].notional, -1.0 / 150.0);
        assert!(xccy.legs.iter().all(|leg| leg.notional_exchange));
    }

    #[test]
    fn test_resolve_missing_fx() {
        let err = NodeTemplate::fx_swap(Currency::EUR, Currency::USD, 1.0)
            .resolve(0.001, &market(), 1.0)
            .unwrap_err();
        assert!(matches!(err, MarketDataError::MissingFxRate { .. }));
    }
}
