//! Triangular arbitrage opportunity scanner.
//!
//! One scan pass: fetch each exchange's symbol list concurrently, keep
//! spot symbols trending upward over the look-back window (momentum entry
//! filter), cross-reference every candidate with every other exchange
//! sharing a common tradeable asset, price the three-leg round trip via
//! cached rate lookups, and collect everything above the profit threshold.
//!
//! Partial failure is first-class: a dead exchange, a thin symbol, or a
//! failed rate lookup is logged and skipped — never aborting the batch.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::RateCache;
use crate::config::ScannerConfig;
use crate::exchanges::ExchangeApi;
use crate::strategy::{average_percentage_change, triangular_profit};
use crate::types::{ScanError, ScanResult, Symbol, TradeLeg};

// ---------------------------------------------------------------------------
// Scan trait
// ---------------------------------------------------------------------------

/// One full opportunity pass. Abstracted so the poll loop can be driven
/// by a test double.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scan: Send + Sync {
    async fn scan(&self) -> Result<Vec<ScanResult>>;
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Per-exchange snapshot for one cycle: the client, its spot symbols,
/// and the set of base assets it trades.
struct ExchangeBook {
    exchange: Arc<dyn ExchangeApi>,
    symbols: Vec<Symbol>,
    assets: HashSet<String>,
}

/// Scans a configured set of exchanges for triangular opportunities.
pub struct OpportunityScanner {
    exchanges: Vec<Arc<dyn ExchangeApi>>,
    /// Memoises computed average percentage changes across cycles.
    change_cache: Arc<RateCache>,
    quote_assets: Vec<String>,
    quote_asset_amount: f64,
    profit_threshold: f64,
    chunk_size: usize,
    period_id: String,
    lookback_bars: u32,
}

impl OpportunityScanner {
    pub fn new(
        exchanges: Vec<Arc<dyn ExchangeApi>>,
        change_cache: Arc<RateCache>,
        cfg: &ScannerConfig,
    ) -> Self {
        Self {
            exchanges,
            change_cache,
            quote_assets: cfg.quote_assets.clone(),
            quote_asset_amount: cfg.quote_asset_amount,
            profit_threshold: cfg.profit_threshold,
            chunk_size: cfg.chunk_size.max(1),
            period_id: cfg.period_id.clone(),
            lookback_bars: cfg.lookback_bars,
        }
    }

    /// Run one full scan cycle and return every qualifying opportunity.
    pub async fn scan_cycle(&self) -> Result<Vec<ScanResult>> {
        // Periodic cache cleanup — stale trend entries are never served,
        // but there is no point carrying them between cycles.
        self.change_cache.evict_expired();

        let books = self.fetch_books().await;
        let mut results = Vec::new();

        for (idx, book) in books.iter().enumerate() {
            let candidates = self.momentum_candidates(book).await;
            debug!(
                exchange = %book.exchange.name(),
                candidates = candidates.len(),
                "Trending entry symbols"
            );

            for symbol in &candidates {
                for (other_idx, other) in books.iter().enumerate() {
                    if other_idx == idx {
                        continue;
                    }
                    let Some(common) =
                        common_asset(&book.assets, &other.assets, &symbol.base_asset)
                    else {
                        continue;
                    };

                    match self
                        .evaluate_pair(
                            book.exchange.as_ref(),
                            other.exchange.as_ref(),
                            symbol,
                            &common,
                        )
                        .await
                    {
                        Ok(Some(result)) => results.push(result),
                        Ok(None) => {}
                        Err(e) => warn!(
                            exchange_a = %book.exchange.name(),
                            exchange_b = %other.exchange.name(),
                            symbol = %symbol.symbol_id,
                            error = %e,
                            "Rate lookup failed, skipping candidate"
                        ),
                    }
                }
            }
        }

        info!(opportunities = results.len(), "Scan cycle complete");
        Ok(results)
    }

    // -- Symbol fan-out ---------------------------------------------------

    /// Fetch every exchange's symbol list concurrently. An exchange whose
    /// fetch fails is logged and left out for this cycle.
    async fn fetch_books(&self) -> Vec<ExchangeBook> {
        let fetches = join_all(self.exchanges.iter().map(|ex| async move {
            (Arc::clone(ex), ex.get_symbols().await)
        }))
        .await;

        let mut books = Vec::with_capacity(fetches.len());
        for (exchange, outcome) in fetches {
            match outcome {
                Ok(symbols) => {
                    let symbols: Vec<Symbol> =
                        symbols.into_iter().filter(Symbol::is_spot).collect();
                    let assets = symbols
                        .iter()
                        .map(|s| s.base_asset.clone())
                        .collect::<HashSet<_>>();
                    debug!(
                        exchange = %exchange.name(),
                        spot_symbols = symbols.len(),
                        "Symbols fetched"
                    );
                    books.push(ExchangeBook {
                        exchange,
                        symbols,
                        assets,
                    });
                }
                Err(e) => warn!(
                    exchange = %exchange.name(),
                    error = %e,
                    "Symbol fetch failed, skipping exchange this cycle"
                ),
            }
        }
        books
    }

    // -- Momentum filter --------------------------------------------------

    /// Entry symbols for one exchange: spot pairs in the configured quote
    /// universe whose average percentage change over the look-back window
    /// is positive. OHLCV fetches run with bounded concurrency.
    async fn momentum_candidates(&self, book: &ExchangeBook) -> Vec<Symbol> {
        // Owned values only past this point: a lazy borrowing iterator does
        // not survive the trait-object future the fan-out runs inside.
        let eligible: Vec<Symbol> = book
            .symbols
            .iter()
            .filter(|s| {
                self.quote_assets.is_empty()
                    || self.quote_assets.iter().any(|q| *q == s.quote_asset)
            })
            .cloned()
            .collect();

        let checked: Vec<(Symbol, Result<f64, ScanError>)> =
            stream::iter(eligible.into_iter().map(|symbol| {
                let exchange = Arc::clone(&book.exchange);
                async move {
                    let trend = self
                        .average_change(exchange.as_ref(), &symbol.symbol_id)
                        .await;
                    (symbol, trend)
                }
            }))
            .buffer_unordered(self.chunk_size)
            .collect()
            .await;

        let mut candidates = Vec::new();
        for (symbol, trend) in checked {
            match trend {
                Ok(t) if t > 0.0 => candidates.push(symbol),
                Ok(_) => {} // flat or falling — not an entry leg
                Err(ScanError::InsufficientData { .. }) => debug!(
                    symbol = %symbol.symbol_id,
                    "Not enough history, no signal"
                ),
                Err(e) => warn!(
                    symbol = %symbol.symbol_id,
                    error = %e,
                    "Trend computation failed, skipping symbol"
                ),
            }
        }
        candidates
    }

    /// Average percentage change for one symbol, memoised under
    /// `{exchange}_{symbol}_{period}_{limit}`.
    async fn average_change(
        &self,
        exchange: &dyn ExchangeApi,
        symbol_id: &str,
    ) -> Result<f64, ScanError> {
        let key = format!(
            "{}_{}_{}_{}",
            exchange.name(),
            symbol_id,
            self.period_id,
            self.lookback_bars
        );
        if let Some(cached) = self.change_cache.get(&key) {
            return Ok(cached);
        }

        let bars = exchange
            .get_ohlcv(symbol_id, &self.period_id, self.lookback_bars)
            .await?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let average = average_percentage_change(&closes)?;

        self.change_cache.set(&key, average);
        Ok(average)
    }

    // -- Pair evaluation --------------------------------------------------

    /// Price the three-leg round trip for one candidate/pair and build a
    /// `ScanResult` only when the profit strictly exceeds the threshold.
    ///
    /// Legs: buy the base asset at its entry price on A (divide), cross
    /// into the common asset on A (multiply; identity when the base *is*
    /// the common asset), sell the common asset for the quote asset on B.
    async fn evaluate_pair(
        &self,
        exchange_a: &dyn ExchangeApi,
        exchange_b: &dyn ExchangeApi,
        symbol: &Symbol,
        common: &str,
    ) -> Result<Option<ScanResult>, ScanError> {
        let entry = exchange_a
            .get_exchange_rate(&symbol.base_asset, &symbol.quote_asset)
            .await?;
        let cross = if symbol.base_asset == common {
            1.0
        } else {
            exchange_a
                .get_exchange_rate(&symbol.base_asset, common)
                .await?
        };
        let exit = exchange_b
            .get_exchange_rate(common, &symbol.quote_asset)
            .await?;

        // Zero, negative, or non-finite rates mean a broken feed, not an
        // opportunity.
        if !(entry > 0.0 && cross > 0.0 && exit > 0.0)
            || !entry.is_finite()
            || !cross.is_finite()
            || !exit.is_finite()
        {
            debug!(
                symbol = %symbol.symbol_id,
                entry, cross, exit,
                "Unusable rates, dropping candidate"
            );
            return Ok(None);
        }

        let profit = triangular_profit(self.quote_asset_amount, entry, cross, exit);
        if profit <= self.profit_threshold {
            return Ok(None);
        }

        Ok(Some(ScanResult {
            exchange_a: exchange_a.name().to_string(),
            exchange_b: exchange_b.name().to_string(),
            leg_a: TradeLeg {
                symbol_id: symbol.symbol_id.clone(),
                base_asset: symbol.base_asset.clone(),
                quote_asset: symbol.quote_asset.clone(),
            },
            leg_b: TradeLeg::new(&symbol.base_asset, common),
            leg_c: TradeLeg::new(common, &symbol.quote_asset),
            quote_asset_amount: self.quote_asset_amount,
            profit_percentage: profit,
        }))
    }
}

#[async_trait]
impl Scan for OpportunityScanner {
    async fn scan(&self) -> Result<Vec<ScanResult>> {
        self.scan_cycle().await
    }
}

// ---------------------------------------------------------------------------
// Common asset selection
// ---------------------------------------------------------------------------

/// Pick the asset both exchanges trade. Prefers the candidate's own base
/// asset (a direct transfer leg); otherwise the lexicographically smallest
/// shared asset, for a reproducible choice.
fn common_asset(
    a: &HashSet<String>,
    b: &HashSet<String>,
    prefer: &str,
) -> Option<String> {
    if a.contains(prefer) && b.contains(prefer) {
        return Some(prefer.to_string());
    }
    a.intersection(b).min().cloned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
