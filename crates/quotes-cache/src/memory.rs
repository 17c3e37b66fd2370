//! In-memory store implementation.

use async_trait::async_trait;
use quotes_core::{CachedQuote, QuoteStore, Result, Symbol};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Simple in-memory store for testing and development.
///
/// Rows are kept in a `RwLock`-protected `HashMap` keyed by ticker and are
/// lost when the store is dropped. Rows are cloned on get/upsert.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RwLock<HashMap<Symbol, CachedQuote>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tickers currently stored.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns true if no ticker is stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl QuoteStore for InMemoryStore {
    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn get(&self, ticker: &Symbol) -> Result<Option<CachedQuote>> {
        let rows = self.rows.read().await;
        match rows.get(ticker) {
            Some(row) => {
                debug!("Store hit");
                Ok(Some(row.clone()))
            }
            None => {
                debug!("Store miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, quote), fields(ticker = %quote.ticker))]
    async fn upsert(&self, quote: &CachedQuote) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(quote.ticker.clone(), quote.clone());
        debug!(provider = %quote.provider_source, "Stored quote");
        Ok(())
    }
}
