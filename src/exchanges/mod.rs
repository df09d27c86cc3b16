//! Exchange integrations.
//!
//! Defines the `ExchangeApi` trait and the REST implementation used
//! against CoinAPI-style endpoints. Tests exercise the trait through
//! hand-rolled deterministic stubs.

pub mod rest;

use async_trait::async_trait;

use crate::types::{OhlcvBar, ScanError, Symbol};

/// Abstraction over a market-data exchange.
///
/// Implementors issue authenticated requests for symbol lists, spot
/// exchange rates, and OHLCV history. All methods are read-only; errors
/// are recoverable at the scanner level.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Exchange name for logging, cache keys, and result attribution.
    fn name(&self) -> &str;

    /// Fetch the full symbol list for this exchange.
    async fn get_symbols(&self) -> Result<Vec<Symbol>, ScanError>;

    /// Current conversion rate from `base_asset` to `quote_asset`.
    ///
    /// Implementations consult the shared rate cache before hitting the
    /// network and store fresh values on a miss.
    async fn get_exchange_rate(
        &self,
        base_asset: &str,
        quote_asset: &str,
    ) -> Result<f64, ScanError>;

    /// Historical candles for a symbol, newest-last.
    async fn get_ohlcv(
        &self,
        symbol_id: &str,
        period_id: &str,
        limit: u32,
    ) -> Result<Vec<OhlcvBar>, ScanError>;
}
