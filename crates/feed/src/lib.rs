use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use common::{Error, PriceMap, PriceSource, Result};

/// A price together with the instant it was received.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Quote {
    price: f64,
    at: DateTime<Utc>,
}

/// Latest-price board fed by an external market-data process.
///
/// Prices are pushed in with `update_price`/`update_prices` and read back by
/// the tick scheduler through `PriceSource`. Nothing here fetches data itself.
/// With a max age set, quotes older than that are treated as missing so a
/// silent feed never gets applied at a fresh timestamp.
#[derive(Clone, Default)]
pub struct PriceBoard {
    quotes: Arc<RwLock<HashMap<String, Quote>>>,
    max_age: Option<Duration>,
}

impl PriceBoard {
    /// A board that serves every quote regardless of age.
    pub fn new() -> Self {
        Self::default()
    }

    /// A board that stops serving a symbol once its latest quote is older
    /// than `max_age`.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            quotes: Arc::default(),
            max_age: Some(max_age),
        }
    }

    /// Record the latest price for a symbol, received now.
    pub async fn update_price(&self, symbol: &str, price: f64) -> Result<()> {
        self.update_price_at(symbol, price, Utc::now()).await
    }

    /// Record a price received at `at`. Non-positive or non-finite prices are
    /// refused and leave the previous quote in place.
    pub async fn update_price_at(&self, symbol: &str, price: f64, at: DateTime<Utc>) -> Result<()> {
        if !usable(price) {
            return Err(Error::PriceFeed(format!(
                "refusing price {price} for '{symbol}': must be a positive number"
            )));
        }
        self.quotes
            .write()
            .await
            .insert(symbol.to_string(), Quote { price, at });
        Ok(())
    }

    /// Apply a batch of updates received now, skipping unusable entries.
    /// Returns how many prices were accepted.
    pub async fn update_prices(&self, updates: &PriceMap) -> usize {
        let at = Utc::now();
        let mut quotes = self.quotes.write().await;
        let mut accepted = 0;
        for (symbol, &price) in updates {
            if usable(price) {
                quotes.insert(symbol.clone(), Quote { price, at });
                accepted += 1;
            } else {
                warn!(symbol = %symbol, price = price, "Skipping unusable price update");
            }
        }
        debug!(accepted, total = updates.len(), "Price board updated");
        accepted
    }

    /// Last price received for a symbol, however old.
    pub async fn latest(&self, symbol: &str) -> Option<f64> {
        self.quotes.read().await.get(symbol).map(|q| q.price)
    }

    pub async fn len(&self) -> usize {
        self.quotes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quotes.read().await.is_empty()
    }

    fn is_fresh(&self, quote: &Quote, now: DateTime<Utc>) -> bool {
        match self.max_age {
            // A quote stamped in the future counts as zero age.
            Some(max_age) => (now - quote.at).to_std().unwrap_or_default() <= max_age,
            None => true,
        }
    }
}

fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

#[async_trait]
impl PriceSource for PriceBoard {
    async fn prices(&self, symbols: &[String]) -> Result<PriceMap> {
        let now = Utc::now();
        let quotes = self.quotes.read().await;
        let mut prices = PriceMap::with_capacity(symbols.len());
        for symbol in symbols {
            match quotes.get(symbol) {
                Some(quote) if self.is_fresh(quote, now) => {
                    prices.insert(symbol.clone(), quote.price);
                }
                Some(quote) => {
                    debug!(symbol = %symbol, received = %quote.at, "Stale quote withheld");
                }
                None => {}
            }
        }
        Ok(prices)
    }
}
