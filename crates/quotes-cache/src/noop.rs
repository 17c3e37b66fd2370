//! No-op store implementation.

use async_trait::async_trait;
use quotes_core::{CachedQuote, QuoteStore, Result, Symbol};
use tracing::trace;

/// A no-op store that doesn't keep anything.
///
/// `get` always returns `Ok(None)` and `upsert` always returns `Ok(())`.
/// Useful for disabling caching: every lookup goes to the providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl NoopStore {
    /// Create a new no-op store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QuoteStore for NoopStore {
    async fn get(&self, _ticker: &Symbol) -> Result<Option<CachedQuote>> {
        trace!("NoopStore: get called, returning None");
        Ok(None)
    }

    async fn upsert(&self, _quote: &CachedQuote) -> Result<()> {
        trace!("NoopStore: upsert called, doing nothing");
        Ok(())
    }
}
