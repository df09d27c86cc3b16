//! TRISCAN — cross-exchange triangular arbitrage opportunity scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the exchange clients and caches, and runs the scan loop with
//! graceful shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use triscan::cache::RateCache;
use triscan::config::AppConfig;
use triscan::engine::reporter::LogReporter;
use triscan::engine::runner::PollLoop;
use triscan::engine::scanner::OpportunityScanner;
use triscan::exchanges::rest::RestExchange;
use triscan::exchanges::ExchangeApi;

const BANNER: &str = r#"
 _____ ____  ___ ____   ____    _    _   _
|_   _|  _ \|_ _/ ___| / ___|  / \  | \ | |
  | | | |_) || |\___ \| |     / _ \ |  \| |
  | | |  _ < | | ___) | |___ / ___ \| |\  |
  |_| |_| \_\___|____/ \____/_/   \_\_| \_|

  Triangular Arbitrage Opportunity Scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML — incomplete config is fatal here,
    // before anything touches the network.
    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        exchanges = cfg.exchanges.len(),
        interval_secs = cfg.scanner.time_interval_secs,
        quote_asset_amount = cfg.scanner.quote_asset_amount,
        profit_threshold = cfg.scanner.profit_threshold,
        "TRISCAN starting up"
    );

    // One pooled HTTP client shared by every exchange.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("triscan/0.1.0 (arbitrage-scanner)")
        .build()
        .context("Failed to build HTTP client")?;

    let rate_cache = Arc::new(RateCache::from_secs(cfg.cache.exchange_rate_ttl_secs));
    let change_cache = Arc::new(RateCache::from_secs(cfg.cache.percentage_change_ttl_secs));

    // Sorted for stable startup logs; API keys resolve from the
    // environment and a missing one aborts startup.
    let mut names: Vec<&String> = cfg.exchanges.keys().collect();
    names.sort();

    let mut exchanges: Vec<Arc<dyn ExchangeApi>> = Vec::with_capacity(names.len());
    for name in names {
        let api_key = cfg.resolve_api_key(name)?;
        let ex_cfg = &cfg.exchanges[name];
        info!(exchange = %name, base_url = %ex_cfg.base_url, "Exchange configured");
        exchanges.push(Arc::new(RestExchange::new(
            name,
            ex_cfg,
            api_key,
            http.clone(),
            Arc::clone(&rate_cache),
        )));
    }

    let scanner = OpportunityScanner::new(exchanges, change_cache, &cfg.scanner);
    let poll = PollLoop::new(
        scanner,
        LogReporter,
        Duration::from_secs(cfg.scanner.time_interval_secs),
    );

    info!(
        interval_secs = cfg.scanner.time_interval_secs,
        "Entering scan loop. Press Ctrl+C to stop."
    );

    let poll = poll
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    info!(
        cycles = poll.cycles_completed(),
        "TRISCAN shut down cleanly."
    );
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("triscan=info"));

    let json_logging = std::env::var("TRISCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
