//! Rate index identifiers.
//!
//! A [`RateIndex`] names a floating rate (overnight or term) that a forward
//! curve projects. Curve group definitions map indices to curves, and
//! floating legs look their projection curve up by index.

use std::fmt;

use super::currency::Currency;

/// Standard interest rate tenors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tenor {
    /// Overnight rate (e.g., SOFR, ESTR)
    Overnight,
    /// 1-month tenor
    OneMonth,
    /// 3-month tenor
    #[default]
    ThreeMonth,
    /// 6-month tenor (e.g., 6M EURIBOR)
    SixMonth,
    /// 12-month tenor
    TwelveMonth,
}

impl Tenor {
    /// Period length in years.
    pub fn period_years(&self) -> f64 {
        match self {
            Tenor::Overnight => 1.0 / 365.0,
            Tenor::OneMonth => 1.0 / 12.0,
            Tenor::ThreeMonth => 0.25,
            Tenor::SixMonth => 0.5,
            Tenor::TwelveMonth => 1.0,
        }
    }

    /// Tenor name for display.
    pub fn name(&self) -> &'static str {
        match self {
            Tenor::Overnight => "ON",
            Tenor::OneMonth => "1M",
            Tenor::ThreeMonth => "3M",
            Tenor::SixMonth => "6M",
            Tenor::TwelveMonth => "12M",
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A floating rate index such as `USD-SOFR` or `EUR-EURIBOR-6M`.
///
/// Identity is the full triple, so two indices with the same name but
/// different currencies are distinct keys.
///
/// # Examples
///
/// ```
/// use curve_core::types::{Currency, RateIndex, Tenor};
///
/// let sofr = RateIndex::overnight("USD-SOFR", Currency::USD);
/// assert_eq!(sofr.tenor(), Tenor::Overnight);
/// assert_eq!(sofr.to_string(), "USD-SOFR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateIndex {
    name: String,
    currency: Currency,
    tenor: Tenor,
}

impl RateIndex {
    /// Creates a rate index.
    pub fn new(name: impl Into<String>, currency: Currency, tenor: Tenor) -> Self {
        Self {
            name: name.into(),
            currency,
            tenor,
        }
    }

    /// Creates an overnight index.
    pub fn overnight(name: impl Into<String>, currency: Currency) -> Self {
        Self::new(name, currency, Tenor::Overnight)
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the index currency.
    #[inline]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns the index tenor.
    #[inline]
    pub fn tenor(&self) -> Tenor {
        self.tenor
    }
}

impl fmt::Display for RateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
