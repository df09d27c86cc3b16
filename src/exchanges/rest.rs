//! REST exchange client.
//!
//! Thin typed wrapper over an exchange's REST endpoints. Every response
//! arrives in a JSON `data` envelope:
//!
//! - symbols:       `{"data": [{"symbol_id": .., "symbol_type": "SPOT", ..}]}`
//! - exchange rate: `{"data": {"rate": 1.23}}`
//! - OHLCV:         `{"data": [[ms_epoch, o, h, l, c, v], ..]}`
//!
//! All requests attach an `X-API-Key` header and ride a shared
//! `reqwest::Client` connection pool — no instance opens its own pool.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::ExchangeApi;
use crate::cache::RateCache;
use crate::config::ExchangeConfig;
use crate::types::{OhlcvBar, OhlcvRow, ScanError, Symbol};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RateBody {
    rate: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One exchange's connection details. Immutable after construction.
pub struct RestExchange {
    name: String,
    base_url: String,
    symbols_path: String,
    exchange_rate_path: String,
    ohlcv_path: String,
    api_key: String,
    http: Client,
    rates: Arc<RateCache>,
}

impl RestExchange {
    /// Build a client for one configured exchange.
    ///
    /// `http` is the process-wide pooled client; `rates` is the shared
    /// exchange-rate cache (keys are namespaced per exchange).
    pub fn new(
        name: &str,
        cfg: &ExchangeConfig,
        api_key: String,
        http: Client,
        rates: Arc<RateCache>,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_url: cfg.base_url.clone(),
            symbols_path: cfg.endpoints.symbols.clone(),
            exchange_rate_path: cfg.endpoints.exchange_rate.clone(),
            ohlcv_path: cfg.endpoints.ohlcv.clone(),
            api_key,
            http,
            rates,
        }
    }

    /// Issue a GET and deserialize the JSON body.
    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ScanError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(exchange = %self.name, url = %url, "Exchange request");

        let resp = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|source| ScanError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ScanError::ApiRequest {
                url,
                status: status.as_u16(),
                message,
            });
        }

        // A malformed payload surfaces as a decode error on the same URL.
        resp.json::<T>()
            .await
            .map_err(|source| ScanError::Transport { url, source })
    }
}

/// Cache key for an exchange rate: `{exchange_name}_{base}_{quote}`.
pub(crate) fn rate_key(exchange: &str, base_asset: &str, quote_asset: &str) -> String {
    format!("{exchange}_{base_asset}_{quote_asset}")
}

#[async_trait]
impl ExchangeApi for RestExchange {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_symbols(&self) -> Result<Vec<Symbol>, ScanError> {
        let env: Envelope<Vec<Symbol>> = self.request(&self.symbols_path, &[]).await?;
        Ok(env.data)
    }

    async fn get_exchange_rate(
        &self,
        base_asset: &str,
        quote_asset: &str,
    ) -> Result<f64, ScanError> {
        let key = rate_key(&self.name, base_asset, quote_asset);
        if let Some(rate) = self.rates.get(&key) {
            debug!(exchange = %self.name, key = %key, rate, "Rate cache hit");
            return Ok(rate);
        }

        let params = [
            ("base_asset", base_asset.to_string()),
            ("quote_asset", quote_asset.to_string()),
        ];
        let env: Envelope<RateBody> =
            self.request(&self.exchange_rate_path, &params).await?;

        self.rates.set(&key, env.data.rate);
        Ok(env.data.rate)
    }

    async fn get_ohlcv(
        &self,
        symbol_id: &str,
        period_id: &str,
        limit: u32,
    ) -> Result<Vec<OhlcvBar>, ScanError> {
        let params = [
            ("symbol_id", symbol_id.to_string()),
            ("period_id", period_id.to_string()),
            ("limit", limit.to_string()),
        ];
        let env: Envelope<Vec<OhlcvRow>> = self.request(&self.ohlcv_path, &params).await?;
        Ok(env.data.into_iter().map(OhlcvBar::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
