//! Market quote snapshots.
//!
//! [`MarketData`] is the read-only input of a calibration run: quoted values
//! by identifier, FX spot rates and historical fixings, all as of one
//! valuation date. Scenario copies are produced with [`MarketData::bumped`]
//! rather than by mutation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;

use crate::types::{CurrencyPair, RateIndex};

/// Identifier of a quoted market value, e.g. `"USD-OIS-5Y"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuoteId(String);

impl QuoteId {
    /// Creates a quote identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QuoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for QuoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Historical fixings of one index, by fixing date.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixingSeries(BTreeMap<NaiveDate, f64>);

impl FixingSeries {
    /// Creates an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the series with a fixing added or replaced.
    pub fn with_fixing(mut self, date: NaiveDate, value: f64) -> Self {
        self.0.insert(date, value);
        self
    }

    /// Fixing on `date`, if published.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.0.get(&date).copied()
    }

    /// Number of fixings.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the series has no fixings.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Quotes, FX spot rates and fixings as of a valuation date.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use curve_core::market_data::{MarketData, QuoteId};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let data = MarketData::new(date)
///     .with_quote("USD-OIS-1Y", 0.05)
///     .with_quote("USD-OIS-2Y", 0.048);
///
/// assert_eq!(data.quote(&QuoteId::new("USD-OIS-1Y")), Some(0.05));
///
/// let bumped = data.bumped(&QuoteId::new("USD-OIS-1Y"), 1e-4).unwrap();
/// assert!((bumped.quote(&QuoteId::new("USD-OIS-1Y")).unwrap() - 0.0501).abs() < 1e-15);
/// // The original snapshot is unchanged
/// assert_eq!(data.quote(&QuoteId::new("USD-OIS-1Y")), Some(0.05));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    valuation_date: NaiveDate,
    quotes: HashMap<QuoteId, f64>,
    fx_rates: HashMap<CurrencyPair, f64>,
    fixings: HashMap<RateIndex, FixingSeries>,
}

impl MarketData {
    /// Creates an empty snapshot.
    pub fn new(valuation_date: NaiveDate) -> Self {
        Self {
            valuation_date,
            quotes: HashMap::new(),
            fx_rates: HashMap::new(),
            fixings: HashMap::new(),
        }
    }

    /// Returns the snapshot with a quote added or replaced.
    pub fn with_quote(mut self, id: impl Into<QuoteId>, value: f64) -> Self {
        self.quotes.insert(id.into(), value);
        self
    }

    /// Returns the snapshot with an FX spot rate (COUNTER per BASE) added.
    pub fn with_fx_rate(mut self, pair: CurrencyPair, rate: f64) -> Self {
        self.fx_rates.insert(pair, rate);
        self
    }

    /// Returns the snapshot with a fixing series added or replaced.
    pub fn with_fixings(mut self, index: RateIndex, series: FixingSeries) -> Self {
        self.fixings.insert(index, series);
        self
    }

    /// Valuation date.
    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    /// Quoted value for `id`.
    pub fn quote(&self, id: &QuoteId) -> Option<f64> {
        self.quotes.get(id).copied()
    }

    /// Identifiers of all quotes, sorted.
    pub fn quote_ids(&self) -> Vec<&QuoteId> {
        let mut ids: Vec<_> = self.quotes.keys().collect();
        ids.sort();
        ids
    }

    /// FX spot rates by pair.
    pub fn fx_rates(&self) -> &HashMap<CurrencyPair, f64> {
        &self.fx_rates
    }

    /// Fixing series by index.
    pub fn fixings(&self) -> &HashMap<RateIndex, FixingSeries> {
        &self.fixings
    }

    /// Copy of the snapshot with quote `id` shifted by `amount`.
    ///
    /// Returns `None` if the quote does not exist.
    pub fn bumped(&self, id: &QuoteId, amount: f64) -> Option<Self> {
        let value = self.quote(id)?;
        let mut copy = self.clone();
        copy.quotes.insert(id.clone(), value + amount);
        Some(copy)
    }
}
