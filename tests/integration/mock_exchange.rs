//! Mock exchange for integration testing.
//!
//! Provides a deterministic `ExchangeApi` implementation backed by
//! in-memory symbol lists, rate tables, and close-price series — all
//! fully controllable from test code, with per-method error injection.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use triscan::exchanges::ExchangeApi;
use triscan::types::{MarketType, OhlcvBar, ScanError, Symbol};

/// A mock exchange for deterministic testing.
pub struct MockExchange {
    name: String,
    symbols: Vec<Symbol>,
    rates: Mutex<HashMap<(String, String), f64>>,
    closes: HashMap<String, Vec<f64>>,
    /// If set, `get_symbols` returns this error message with a 503.
    symbols_error: Mutex<Option<String>>,
    rate_requests: AtomicUsize,
}

impl MockExchange {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            symbols: Vec::new(),
            rates: Mutex::new(HashMap::new()),
            closes: HashMap::new(),
            symbols_error: Mutex::new(None),
            rate_requests: AtomicUsize::new(0),
        }
    }

    /// Add a spot symbol with its close-price history.
    pub fn with_spot(mut self, base: &str, quote: &str, closes: &[f64]) -> Self {
        let symbol_id = format!(
            "{}_SPOT_{}_{}",
            self.name.to_uppercase(),
            base,
            quote
        );
        self.symbols.push(Symbol {
            symbol_id: symbol_id.clone(),
            symbol_type: MarketType::Spot,
            base_asset: base.to_string(),
            quote_asset: quote.to_string(),
        });
        self.closes.insert(symbol_id, closes.to_vec());
        self
    }

    pub fn with_rate(self, base: &str, quote: &str, rate: f64) -> Self {
        self.rates
            .lock()
            .unwrap()
            .insert((base.to_string(), quote.to_string()), rate);
        self
    }

    /// Force all subsequent symbol fetches to fail.
    pub fn fail_symbols(&self, message: &str) {
        *self.symbols_error.lock().unwrap() = Some(message.to_string());
    }

    /// Update a rate mid-test (markets move).
    pub fn set_rate(&self, base: &str, quote: &str, rate: f64) {
        self.rates
            .lock()
            .unwrap()
            .insert((base.to_string(), quote.to_string()), rate);
    }

    /// Rate lookups served so far.
    pub fn rate_requests(&self) -> usize {
        self.rate_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_symbols(&self) -> Result<Vec<Symbol>, ScanError> {
        if let Some(message) = self.symbols_error.lock().unwrap().clone() {
            return Err(ScanError::ApiRequest {
                url: format!("https://{}.test/v1/symbols", self.name),
                status: 503,
                message,
            });
        }
        Ok(self.symbols.clone())
    }

    async fn get_exchange_rate(
        &self,
        base_asset: &str,
        quote_asset: &str,
    ) -> Result<f64, ScanError> {
        self.rate_requests.fetch_add(1, Ordering::SeqCst);
        self.rates
            .lock()
            .unwrap()
            .get(&(base_asset.to_string(), quote_asset.to_string()))
            .copied()
            .ok_or_else(|| ScanError::ApiRequest {
                url: format!("https://{}.test/v1/exchangerate", self.name),
                status: 404,
                message: format!("no market for {base_asset}/{quote_asset}"),
            })
    }

    async fn get_ohlcv(
        &self,
        symbol_id: &str,
        _period_id: &str,
        limit: u32,
    ) -> Result<Vec<OhlcvBar>, ScanError> {
        let closes = self.closes.get(symbol_id).cloned().unwrap_or_default();
        Ok(closes
            .into_iter()
            .take(limit as usize)
            .enumerate()
            .map(|(i, close)| {
                OhlcvBar::from((i as i64 * 86_400_000, close, close, close, close, 1_000.0))
            })
            .collect())
    }
}
