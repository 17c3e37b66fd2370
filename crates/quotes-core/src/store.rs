//! Store trait for persisted quotes.
//!
//! This module defines the [`QuoteStore`] trait: a keyed store holding the
//! last known [`CachedQuote`] per ticker.

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{CachedQuote, Symbol},
};

/// Trait for persisting the last known quote per ticker.
///
/// Implementations must tolerate concurrent upserts for the same ticker; the
/// last write wins. Rows are overwritten in full and never partially updated.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Retrieves the cached row for a ticker.
    ///
    /// Returns `Ok(Some(row))` if a row exists, `Ok(None)` if not.
    async fn get(&self, ticker: &Symbol) -> Result<Option<CachedQuote>>;

    /// Inserts the row, or overwrites every field of the existing row for its ticker.
    async fn upsert(&self, quote: &CachedQuote) -> Result<()>;
}
