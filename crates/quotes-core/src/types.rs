//! Core data types for quotes.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Normalized ticker
//! - [`Quote`] - Result of a single provider lookup
//! - [`CachedQuote`] - Persisted last-known quote for a ticker

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A trading symbol/ticker.
///
/// Symbols are trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, trimming and converting to uppercase.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_uppercase())
    }

    /// Creates a symbol, returning `None` when the input is blank.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let symbol = Self::new(s);
        (!symbol.0.is_empty()).then_some(symbol)
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Normalized result of a single provider lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker the quote is for.
    pub ticker: Symbol,
    /// Last traded price.
    pub last_price: Decimal,
    /// Change since the previous close, as an amount.
    pub change_today: Option<Decimal>,
    /// Change since the previous close, in percent units (1.5 means 1.5%).
    pub change_today_percentage: Option<Decimal>,
    /// Exchange code the quote was found on.
    pub market_identifier: Option<String>,
    /// Name of the provider that produced the quote.
    pub provider: String,
}

impl Quote {
    /// Creates a new quote with required fields.
    #[must_use]
    pub fn new(ticker: Symbol, last_price: Decimal, provider: impl Into<String>) -> Self {
        Self {
            ticker,
            last_price,
            change_today: None,
            change_today_percentage: None,
            market_identifier: None,
            provider: provider.into(),
        }
    }

    /// Sets the change amount and percentage.
    #[must_use]
    pub fn with_change(mut self, amount: Decimal, percentage: Decimal) -> Self {
        self.change_today = Some(amount);
        self.change_today_percentage = Some(percentage);
        self
    }

    /// Sets the market identifier.
    #[must_use]
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market_identifier = Some(market.into());
        self
    }
}

/// Last known quote for a ticker, as persisted by the cache service.
///
/// There is at most one row per ticker. `last_updated` is the time the row
/// was written, never an upstream timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedQuote {
    /// Ticker (unique key).
    pub ticker: Symbol,
    /// Last traded price.
    pub last_price: Decimal,
    /// Change since the previous close, as an amount.
    pub change_today: Option<Decimal>,
    /// Change since the previous close, in percent units.
    pub change_today_percentage: Option<Decimal>,
    /// Exchange code the quote was found on.
    pub market_identifier: Option<String>,
    /// Name of the provider that produced the row.
    pub provider_source: String,
    /// When the row was last written.
    pub last_updated: Option<DateTime<Utc>>,
}

impl CachedQuote {
    /// Builds a cache row from a provider quote, stamped with `now`.
    #[must_use]
    pub fn from_quote(ticker: Symbol, quote: &Quote, now: DateTime<Utc>) -> Self {
        Self {
            ticker,
            last_price: quote.last_price,
            change_today: quote.change_today,
            change_today_percentage: quote.change_today_percentage,
            market_identifier: quote.market_identifier.clone(),
            provider_source: quote.provider.clone(),
            last_updated: Some(now),
        }
    }

    /// Age of the row at `now`, or `None` when the timestamp is missing.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_updated.map(|updated| now.signed_duration_since(updated))
    }

    /// Returns true when the row was written no longer than `ttl` before `now`.
    ///
    /// Rows without a timestamp are never fresh.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        self.age(now).is_some_and(|age| age <= ttl)
    }
}
