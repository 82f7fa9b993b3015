//! Resolved calibration trades.
//!
//! A [`ResolvedTrade`] is a node template with its market quote, notional
//! and schedules fixed. Pricing lives in [`pricing`](super::pricing).

use std::fmt;

use curve_core::types::{Currency, RateIndex};

use super::schedule::AccrualPeriod;

/// Kind of a calibration trade, used to look up its measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TradeKind {
    /// Term deposit
    TermDeposit,
    /// Forward rate agreement
    Fra,
    /// Interest rate future
    IborFuture,
    /// Fixed against floating swap
    FixedFloatSwap,
    /// Floating against floating swap in one currency
    BasisSwap,
    /// FX swap
    FxSwap,
    /// Cross-currency floating swap with notional exchanges
    XccySwap,
    /// Direct zero-rate quote
    ZeroRate,
}

impl TradeKind {
    /// Every trade kind.
    pub const ALL: [TradeKind; 8] = [
        TradeKind::TermDeposit,
        TradeKind::Fra,
        TradeKind::IborFuture,
        TradeKind::FixedFloatSwap,
        TradeKind::BasisSwap,
        TradeKind::FxSwap,
        TradeKind::XccySwap,
        TradeKind::ZeroRate,
    ];

    /// Kind name for display.
    pub fn name(&self) -> &'static str {
        match self {
            TradeKind::TermDeposit => "TermDeposit",
            TradeKind::Fra => "Fra",
            TradeKind::IborFuture => "IborFuture",
            TradeKind::FixedFloatSwap => "FixedFloatSwap",
            TradeKind::BasisSwap => "BasisSwap",
            TradeKind::FxSwap => "FxSwap",
            TradeKind::XccySwap => "XccySwap",
            TradeKind::ZeroRate => "ZeroRate",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Deposit of `notional` from `start`, repaid with simple interest at `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTermDeposit {
    /// Deposit currency
    pub currency: Currency,
    /// Accrual period
    pub period: AccrualPeriod,
    /// Notional
    pub notional: f64,
    /// Simple deposit rate
    pub rate: f64,
}

/// Forward rate agreement settled at the end of its period.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFra {
    /// Projected index
    pub index: RateIndex,
    /// Accrual period
    pub period: AccrualPeriod,
    /// Notional (positive receives the floating rate)
    pub notional: f64,
    /// Agreed fixed rate
    pub fixed_rate: f64,
}

/// Margined interest rate future without convexity adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIborFuture {
    /// Underlying index
    pub index: RateIndex,
    /// Underlying rate period
    pub period: AccrualPeriod,
    /// Notional
    pub notional: f64,
    /// Traded price, `1 - rate`
    pub price: f64,
}

/// Rate paid by a swap leg.
#[derive(Debug, Clone, PartialEq)]
pub enum LegRate {
    /// Fixed coupon rate
    Fixed(f64),
    /// Index fixing plus a spread
    Floating {
        /// Projected index
        index: RateIndex,
        /// Additive spread
        spread: f64,
    },
}

/// One leg of a swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapLeg {
    /// Payment currency
    pub currency: Currency,
    /// Signed notional (positive receives)
    pub notional: f64,
    /// Accrual periods, paid at each period end
    pub periods: Vec<AccrualPeriod>,
    /// Coupon rate
    pub rate: LegRate,
    /// Exchange notional at the first start and last end
    pub notional_exchange: bool,
}

/// Swap with any number of legs, valued in the first leg's currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSwap {
    /// Which swap template produced the trade
    pub kind: TradeKind,
    /// Legs; the quote is the fixed rate or spread of `legs[quoted_leg]`
    pub legs: Vec<SwapLeg>,
    /// Index of the leg carrying the quote
    pub quoted_leg: usize,
}

/// FX swap: receive `notional` of base at `near`, pay it back at `far`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFxSwap {
    /// Base currency
    pub base: Currency,
    /// Counter currency, the valuation currency
    pub counter: Currency,
    /// Near exchange time
    pub near: f64,
    /// Far exchange time
    pub far: f64,
    /// Base currency notional
    pub notional: f64,
    /// Near exchange rate (spot)
    pub near_rate: f64,
    /// Far exchange rate (spot plus forward points)
    pub far_rate: f64,
}

/// Quoted continuously compounded zero rate on a currency's discount curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedZeroRate {
    /// Currency of the discount curve
    pub currency: Currency,
    /// Maturity in years
    pub maturity: f64,
    /// Quoted zero rate
    pub rate: f64,
}

/// A calibration trade with all terms fixed.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTrade {
    /// Term deposit
    TermDeposit(ResolvedTermDeposit),
    /// Forward rate agreement
    Fra(ResolvedFra),
    /// Interest rate future
    IborFuture(ResolvedIborFuture),
    /// Fixed/float, basis or cross-currency swap
    Swap(ResolvedSwap),
    /// FX swap
    FxSwap(ResolvedFxSwap),
    /// Zero-rate quote
    ZeroRate(ResolvedZeroRate),
}

impl ResolvedTrade {
    /// Kind of the trade.
    pub fn kind(&self) -> TradeKind {
        match self {
            ResolvedTrade::TermDeposit(_) => TradeKind::TermDeposit,
            ResolvedTrade::Fra(_) => TradeKind::Fra,
            ResolvedTrade::IborFuture(_) => TradeKind::IborFuture,
            ResolvedTrade::Swap(swap) => swap.kind,
            ResolvedTrade::FxSwap(_) => TradeKind::FxSwap,
            ResolvedTrade::ZeroRate(_) => TradeKind::ZeroRate,
        }
    }

    /// Last payment time.
    pub fn maturity(&self) -> f64 {
        match self {
            ResolvedTrade::TermDeposit(d) => d.period.end,
            ResolvedTrade::Fra(f) => f.period.end,
            ResolvedTrade::IborFuture(f) => f.period.end,
            ResolvedTrade::Swap(s) => s
                .legs
                .iter()
                .filter_map(|leg| leg.periods.last().map(|p| p.end))
                .fold(0.0, f64::max),
            ResolvedTrade::FxSwap(fx) => fx.far,
            ResolvedTrade::ZeroRate(z) => z.maturity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::schedule::{schedule, Frequency};

    #[test]
    fn test_kind_and_maturity() {
        let index = RateIndex::overnight("USD-SOFR", Currency::USD);
        let swap = ResolvedTrade::Swap(ResolvedSwap {
            kind: TradeKind::FixedFloatSwap,
            legs: vec![
                SwapLeg {
                    currency: Currency::USD,
                    notional: 1.0,
                    periods: schedule(0.0, 5.0, Frequency::Annual),
                    rate: LegRate::Fixed(0.04),
                    notional_exchange: false,
                },
                SwapLeg {
                    currency: Currency::USD,
                    notional: -1.0,
                    periods: schedule(0.0, 5.0, Frequency::Quarterly),
                    rate: LegRate::Floating { index, spread: 0.0 },
                    notional_exchange: false,
                },
            ],
            quoted_leg: 0,
        });
        assert_eq!(swap.kind(), TradeKind::FixedFloatSwap);
        assert!((swap.maturity() - 5.0).abs() < 1e-15);

        let zero = ResolvedTrade::ZeroRate(ResolvedZeroRate {
            currency: Currency::EUR,
            maturity: 2.0,
            rate: 0.03,
        });
        assert_eq!(zero.kind(), TradeKind::ZeroRate);
        assert_eq!(zero.maturity(), 2.0);
    }

    #[test]
    fn test_kind_names_unique() {
        let mut names: Vec<&str> = TradeKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TradeKind::ALL.len());
        assert_eq!(TradeKind::XccySwap.to_string(), "XccySwap");
    }
}
