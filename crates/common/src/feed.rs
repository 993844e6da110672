use async_trait::async_trait;

use crate::{PriceMap, Result};

/// Abstraction over wherever latest prices come from.
///
/// `PriceBoard` in `crates/feed` implements this for prices pushed in by an
/// external market-data process. Only the tick scheduler in `crates/engine`
/// should hold a `dyn PriceSource`.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Latest prices for the requested symbols. Symbols without a known price
    /// are left out of the map rather than reported as errors.
    async fn prices(&self, symbols: &[String]) -> Result<PriceMap>;
}
