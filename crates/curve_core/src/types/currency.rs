//! Currency types for curve calibration.
//!
//! ISO 4217 currency codes plus the currency pair key used to look up FX
//! spot rates in market data snapshots.
//!
//! # Examples
//!
//! ```
//! use curve_core::types::{Currency, CurrencyPair};
//!
//! let usd = Currency::USD;
//! assert_eq!(usd.code(), "USD");
//!
//! let pair = CurrencyPair::new(Currency::EUR, Currency::USD).unwrap();
//! assert_eq!(pair.inverse().base(), Currency::USD);
//! ```

use std::fmt;
use std::str::FromStr;

use super::error::CurrencyError;

/// ISO 4217 currency codes.
///
/// Enum-based so currencies can key hash maps without allocation.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Currency {
    /// United States Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound Sterling
    GBP,
    /// Japanese Yen
    JPY,
    /// Swiss Franc
    CHF,
}

impl Currency {
    /// Returns the ISO 4217 three-letter currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    /// Parses an ISO 4217 code (case-insensitive).
    fn from_str(s: &str) -> Result<Self, CurrencyError> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "JPY" => Ok(Currency::JPY),
            "CHF" => Ok(Currency::CHF),
            _ => Err(CurrencyError::UnknownCurrency(s.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An ordered pair of distinct currencies, BASE/COUNTER.
///
/// A rate quoted for the pair is the number of COUNTER units per BASE unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrencyPair {
    base: Currency,
    counter: Currency,
}

impl CurrencyPair {
    /// Creates a currency pair.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::SameCurrency` if both sides are equal.
    pub fn new(base: Currency, counter: Currency) -> Result<Self, CurrencyError> {
        if base == counter {
            return Err(CurrencyError::SameCurrency(base.code().to_string()));
        }
        Ok(Self { base, counter })
    }

    /// Returns the base currency.
    #[inline]
    pub fn base(&self) -> Currency {
        self.base
    }

    /// Returns the counter currency.
    #[inline]
    pub fn counter(&self) -> Currency {
        self.counter
    }

    /// Returns the pair with base and counter swapped.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.counter,
            counter: self.base,
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.counter)
    }
}

impl FromStr for CurrencyPair {
    type Err = CurrencyError;

    /// Parses `"EUR/USD"` style codes.
    fn from_str(s: &str) -> Result<Self, CurrencyError> {
        let (base, counter) = s
            .split_once('/')
            .ok_or_else(|| CurrencyError::ParseError(s.to_string()))?;
        CurrencyPair::new(base.trim().parse()?, counter.trim().parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_str_case_insensitive() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!("Eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!("gbP".parse::<Currency>().unwrap(), Currency::GBP);
    }

    #[test]
    fn test_currency_from_str_unknown() {
        match "XYZ".parse::<Currency>() {
            Err(CurrencyError::UnknownCurrency(code)) => assert_eq!(code, "XYZ"),
            other => panic!("Expected UnknownCurrency error, got {:?}", other),
        }
    }

    #[test]
    fn test_currency_roundtrip() {
        for currency in [
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::JPY,
            Currency::CHF,
        ] {
            let parsed: Currency = currency.code().parse().unwrap();
            assert_eq!(currency, parsed);
        }
    }

    #[test]
    fn test_pair_rejects_same_currency() {
        let result = CurrencyPair::new(Currency::USD, Currency::USD);
        assert_eq!(result, Err(CurrencyError::SameCurrency("USD".to_string())));
    }

    #[test]
    fn test_pair_inverse_and_display() {
        let pair = CurrencyPair::new(Currency::EUR, Currency::USD).unwrap();
        assert_eq!(format!("{}", pair), "EUR/USD");
        assert_eq!(format!("{}", pair.inverse()), "USD/EUR");
        assert_eq!(pair.inverse().inverse(), pair);
    }

    #[test]
    fn test_pair_parse() {
        let pair: CurrencyPair = "gbp/jpy".parse().unwrap();
        assert_eq!(pair.base(), Currency::GBP);
        assert_eq!(pair.counter(), Currency::JPY);
        assert!("GBPJPY".parse::<CurrencyPair>().is_err());
    }
}
