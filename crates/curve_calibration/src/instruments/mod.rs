//! Calibration instruments.
//!
//! - [`template`]: [`NodeTemplate`], the quote-free shape of a node
//! - [`trade`]: [`ResolvedTrade`] and its components
//! - [`pricing`]: present value and quote sensitivity with point sensitivities
//! - [`schedule`]: [`Frequency`] and accrual periods

pub mod pricing;
pub mod schedule;
pub mod template;
pub mod trade;

pub use pricing::PricedValue;
pub use schedule::{schedule, AccrualPeriod, Frequency};
pub use template::NodeTemplate;
pub use trade::{
    LegRate, ResolvedFra, ResolvedFxSwap, ResolvedIborFuture, ResolvedSwap, ResolvedTermDeposit,
    ResolvedTrade, ResolvedZeroRate, SwapLeg, TradeKind,
};
