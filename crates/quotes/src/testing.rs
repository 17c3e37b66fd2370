//! Recording stub provider shared by the unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use quotes_core::{Quote, QuoteError, QuoteProvider, QuoteSource, Result, Symbol};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Price(Decimal),
    Empty,
    Fail,
}

/// Provider returning a fixed outcome and recording every call.
#[derive(Debug)]
pub(crate) struct RecordingProvider {
    name: &'static str,
    outcome: Mutex<Outcome>,
    calls: AtomicU32,
    hints: Mutex<Vec<Option<String>>>,
}

impl RecordingProvider {
    pub(crate) fn new(name: &'static str, outcome: Outcome) -> Self {
        Self {
            name,
            outcome: Mutex::new(outcome),
            calls: AtomicU32::new(0),
            hints: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn hints(&self) -> Vec<Option<String>> {
        self.hints.lock().unwrap().clone()
    }
}

impl QuoteSource for RecordingProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "recording stub"
    }
}

#[async_trait]
impl QuoteProvider for RecordingProvider {
    async fn resolve(&self, ticker: &str, market_hint: Option<&str>) -> Result<Option<Quote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hints
            .lock()
            .unwrap()
            .push(market_hint.map(str::to_string));

        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            Outcome::Price(price) => Ok(Some(
                Quote::new(Symbol::new(ticker), price, self.name)
                    .with_change(Decimal::ONE, Decimal::ONE)
                    .with_market("STUBX"),
            )),
            Outcome::Empty => Ok(None),
            Outcome::Fail => Err(QuoteError::RateLimited {
                provider: self.name.to_string(),
                retry_after: None,
            }),
        }
    }
}
