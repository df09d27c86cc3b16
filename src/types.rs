//! Shared domain types.
//!
//! Core data model for the scanner: trading symbols, OHLCV bars, the
//! per-opportunity `ScanResult`, and the crate-wide error taxonomy.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

/// Market type tag attached to each listed symbol.
///
/// Only `Spot` symbols are eligible as arbitrage entry legs; everything
/// else is carried through deserialization and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketType {
    Spot,
    Futures,
    Perpetual,
    Option,
    Index,
    #[serde(other)]
    Other,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketType::Spot => "SPOT",
            MarketType::Futures => "FUTURES",
            MarketType::Perpetual => "PERPETUAL",
            MarketType::Option => "OPTION",
            MarketType::Index => "INDEX",
            MarketType::Other => "OTHER",
        };
        write!(f, "{s}")
    }
}

/// A tradeable symbol as listed by an exchange.
///
/// Deserialized straight off the wire (`/symbols` envelope rows).
/// Read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Symbol {
    pub symbol_id: String,
    pub symbol_type: MarketType,
    pub base_asset: String,
    pub quote_asset: String,
}

impl Symbol {
    pub fn is_spot(&self) -> bool {
        self.symbol_type == MarketType::Spot
    }
}

// ---------------------------------------------------------------------------
// OHLCV
// ---------------------------------------------------------------------------

/// One historical price bar. Only `close` is consumed downstream; the
/// remaining fields are kept for completeness of the wire model.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub time_period_start: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Wire shape: `[ms_epoch, open, high, low, close, volume]`.
pub type OhlcvRow = (i64, f64, f64, f64, f64, f64);

impl From<OhlcvRow> for OhlcvBar {
    fn from((ms, open, high, low, close, volume): OhlcvRow) -> Self {
        Self {
            time_period_start: ms_to_datetime(ms),
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Convert a wire timestamp (ms since epoch) to `DateTime<Utc>`.
/// Out-of-range values fall back to the current time.
pub fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

// ---------------------------------------------------------------------------
// Scan results
// ---------------------------------------------------------------------------

/// One leg of a triangular round trip: the pair traded and its assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeLeg {
    pub symbol_id: String,
    pub base_asset: String,
    pub quote_asset: String,
}

impl TradeLeg {
    pub fn new(base_asset: &str, quote_asset: &str) -> Self {
        Self {
            symbol_id: format!("{base_asset}_{quote_asset}"),
            base_asset: base_asset.to_string(),
            quote_asset: quote_asset.to_string(),
        }
    }
}

/// A qualifying triangular arbitrage opportunity.
///
/// Only ever constructed after the computed profit exceeds the configured
/// threshold — sub-threshold candidates are never materialised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub exchange_a: String,
    pub exchange_b: String,
    /// Entry leg: the trending spot symbol bought on exchange A.
    pub leg_a: TradeLeg,
    /// Cross leg: base asset converted to the common asset on exchange A.
    pub leg_b: TradeLeg,
    /// Exit leg: common asset sold back to the quote asset on exchange B.
    pub leg_c: TradeLeg,
    pub quote_asset_amount: f64,
    pub profit_percentage: f64,
}

impl ScanResult {
    /// Route summary like `coinapi:ETH/USD -> ETH -> cryptowatch:USD`.
    pub fn route(&self) -> String {
        format!(
            "{}:{}/{} -> {} -> {}:{}",
            self.exchange_a,
            self.leg_a.base_asset,
            self.leg_a.quote_asset,
            self.leg_b.quote_asset,
            self.exchange_b,
            self.leg_c.quote_asset,
        )
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} notional={:.2} profit={:.4}%",
            self.route(),
            self.quote_asset_amount,
            self.profit_percentage * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for TRISCAN.
///
/// `Config` is fatal at startup. `ApiRequest` and `Transport` are
/// recoverable — the offending exchange/symbol/pair is skipped and the
/// scan continues. `InsufficientData` is treated as "no signal".
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request to {url} failed with status {status}: {message}")]
    ApiRequest {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Insufficient data: need at least {needed} closes, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
