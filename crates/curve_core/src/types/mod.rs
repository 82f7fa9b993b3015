//! Core identifier and error types.
//!
//! This module provides:
//! - `currency`: ISO 4217 currency codes and currency pairs
//! - `index`: floating rate indices and tenors
//! - `error`: structured error types for currency and solver operations

pub mod currency;
pub mod error;
pub mod index;

pub use currency::{Currency, CurrencyPair};
pub use error::{CurrencyError, SolverError};
pub use index::{RateIndex, Tenor};
