//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`. Configuration is validated
//! once at load time; hot-path code never touches untyped lookups.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::types::ScanError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub cache: CacheConfig,
    /// Exchange name -> connection details.
    pub exchanges: HashMap<String, ExchangeConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// Seconds between scan cycles.
    pub time_interval_secs: u64,
    /// Notional amount (in the quote asset) pushed through each round trip.
    pub quote_asset_amount: f64,
    /// Minimum profit fraction for an opportunity to be reported.
    pub profit_threshold: f64,
    /// Upper bound on concurrently in-flight OHLCV fetches per exchange.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Look-back window for the momentum filter.
    #[serde(default = "default_lookback_bars")]
    pub lookback_bars: u32,
    /// Candle period for the momentum filter.
    #[serde(default = "default_period_id")]
    pub period_id: String,
    /// Quote assets eligible as entry legs. Empty means no restriction.
    #[serde(default)]
    pub quote_assets: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub exchange_rate_ttl_secs: u64,
    pub percentage_change_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Env var holding the API key. Defaults to `{NAME}_API_KEY`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    pub endpoints: EndpointsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointsConfig {
    pub symbols: String,
    pub exchange_rate: String,
    pub ohlcv: String,
}

fn default_chunk_size() -> usize {
    50
}

fn default_lookback_bars() -> u32 {
    30
}

fn default_period_id() -> String {
    "1DAY".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the scanner cannot run with. Startup-fatal.
    fn validate(&self) -> Result<(), ScanError> {
        if self.exchanges.len() < 2 {
            return Err(ScanError::Config(
                "at least two exchanges are required for triangular scanning"
                    .to_string(),
            ));
        }
        if self.scanner.time_interval_secs == 0 {
            return Err(ScanError::Config(
                "scanner.time_interval_secs must be positive".to_string(),
            ));
        }
        if self.scanner.quote_asset_amount <= 0.0 {
            return Err(ScanError::Config(
                "scanner.quote_asset_amount must be positive".to_string(),
            ));
        }
        if self.scanner.chunk_size == 0 {
            return Err(ScanError::Config(
                "scanner.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.scanner.lookback_bars < 2 {
            return Err(ScanError::Config(
                "scanner.lookback_bars must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the API key for a named exchange from the environment.
    /// A missing credential is fatal — the process must not start with an
    /// incomplete configuration.
    pub fn resolve_api_key(&self, name: &str) -> Result<String, ScanError> {
        let exchange = self.exchanges.get(name).ok_or_else(|| {
            ScanError::Config(format!("unknown exchange: {name}"))
        })?;
        let env_name = exchange
            .api_key_env
            .clone()
            .unwrap_or_else(|| format!("{}_API_KEY", name.to_uppercase()));
        std::env::var(&env_name).map_err(|_| {
            ScanError::Config(format!(
                "environment variable not set: {env_name} (API key for {name})"
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
