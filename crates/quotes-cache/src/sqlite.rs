//! SQLite-based store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quotes_core::{CachedQuote, QuoteError, QuoteStore, Result, Symbol};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-based store for the last known quote per ticker.
///
/// This store keeps rows in a SQLite database file, providing persistence
/// across application restarts. Decimals are stored as TEXT so no precision
/// is lost, and timestamps as RFC 3339 TEXT.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw column values of a `quote_cache` row, before decoding.
type RawRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
);

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| QuoteError::Cache(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| QuoteError::Cache(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| QuoteError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS quote_cache (
                ticker TEXT NOT NULL PRIMARY KEY,
                last_price TEXT NOT NULL,
                change_today TEXT,
                change_today_percentage TEXT,
                market_identifier TEXT,
                provider_source TEXT NOT NULL,
                last_updated TEXT
            )",
            [],
        )
        .map_err(|e| QuoteError::Cache(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }

    fn decode_row(raw: RawRow) -> Result<CachedQuote> {
        let (ticker, last_price, change, change_pct, market, provider, updated) = raw;
        Ok(CachedQuote {
            ticker: Symbol::new(ticker),
            last_price: parse_decimal(&last_price)?,
            change_today: change.as_deref().map(parse_decimal).transpose()?,
            change_today_percentage: change_pct.as_deref().map(parse_decimal).transpose()?,
            market_identifier: market,
            provider_source: provider,
            last_updated: updated.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| QuoteError::Cache(format!("Invalid decimal {s:?}: {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| QuoteError::Cache(format!("Invalid timestamp {s:?}: {e}")))
}

#[async_trait]
impl QuoteStore for SqliteStore {
    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn get(&self, ticker: &Symbol) -> Result<Option<CachedQuote>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| QuoteError::Cache(e.to_string()))?;

        let raw: Option<RawRow> = conn
            .query_row(
                "SELECT ticker, last_price, change_today, change_today_percentage,
                        market_identifier, provider_source, last_updated
                 FROM quote_cache
                 WHERE ticker = ?1",
                params![ticker.as_str()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| QuoteError::Cache(e.to_string()))?;

        match raw {
            Some(raw) => {
                debug!("Store hit");
                Self::decode_row(raw).map(Some)
            }
            None => {
                debug!("Store miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, quote), fields(ticker = %quote.ticker))]
    async fn upsert(&self, quote: &CachedQuote) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| QuoteError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT INTO quote_cache
                (ticker, last_price, change_today, change_today_percentage,
                 market_identifier, provider_source, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(ticker) DO UPDATE SET
                last_price = excluded.last_price,
                change_today = excluded.change_today,
                change_today_percentage = excluded.change_today_percentage,
                market_identifier = excluded.market_identifier,
                provider_source = excluded.provider_source,
                last_updated = excluded.last_updated",
            params![
                quote.ticker.as_str(),
                quote.last_price.to_string(),
                quote.change_today.map(|d| d.to_string()),
                quote.change_today_percentage.map(|d| d.to_string()),
                quote.market_identifier,
                quote.provider_source,
                quote.last_updated.map(|dt| dt.to_rfc3339()),
            ],
        )
        .map_err(|e| QuoteError::Cache(e.to_string()))?;

        debug!(provider = %quote.provider_source, "Stored quote");
        Ok(())
    }
}
