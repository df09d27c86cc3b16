//! End-to-end scan cycle scenarios against mock exchanges.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use triscan::cache::RateCache;
use triscan::config::ScannerConfig;
use triscan::engine::reporter::ReportSink;
use triscan::engine::runner::PollLoop;
use triscan::engine::scanner::{OpportunityScanner, Scan};
use triscan::exchanges::ExchangeApi;
use triscan::types::ScanResult;

use crate::mock_exchange::MockExchange;

fn config(threshold: f64) -> ScannerConfig {
    ScannerConfig {
        time_interval_secs: 60,
        quote_asset_amount: 1000.0,
        profit_threshold: threshold,
        chunk_size: 16,
        lookback_bars: 30,
        period_id: "1DAY".to_string(),
        quote_assets: vec!["USD".to_string()],
    }
}

fn scanner(exchanges: Vec<Arc<dyn ExchangeApi>>, threshold: f64) -> OpportunityScanner {
    OpportunityScanner::new(exchanges, Arc::new(RateCache::from_secs(300)), &config(threshold))
}

/// Two exchanges sharing ETH: bought at 2000 on A, sold at 2010 on B.
/// Hand computation: 1000 / 2000 * 1.0 * 2010 = 1005 -> profit 0.005.
fn eth_pair() -> (Arc<MockExchange>, Arc<MockExchange>) {
    let a = MockExchange::new("exchange_a")
        .with_spot("ETH", "USD", &[100.0, 102.0, 104.0])
        .with_rate("ETH", "USD", 2000.0);
    let b = MockExchange::new("exchange_b")
        // Flat trend: exchange B never originates an entry leg.
        .with_spot("ETH", "USD", &[100.0, 100.0])
        .with_rate("ETH", "USD", 2010.0);
    (Arc::new(a), Arc::new(b))
}

#[tokio::test]
async fn worked_example_emitted_above_threshold() {
    let (a, b) = eth_pair();
    let scanner = scanner(vec![a, b], 0.001);

    let results = scanner.scan_cycle().await.unwrap();
    assert_eq!(results.len(), 1);

    let r = &results[0];
    assert_eq!(r.exchange_a, "exchange_a");
    assert_eq!(r.exchange_b, "exchange_b");
    assert_eq!(r.leg_a.base_asset, "ETH");
    assert_eq!(r.leg_b.quote_asset, "ETH");
    assert_eq!(r.leg_c.symbol_id, "ETH_USD");
    assert_eq!(r.quote_asset_amount, 1000.0);
    assert!((r.profit_percentage - 0.005).abs() < 1e-12);
}

#[tokio::test]
async fn worked_example_suppressed_below_threshold() {
    let (a, b) = eth_pair();
    // 0.005 does not exceed a 1% threshold.
    let scanner = scanner(vec![a, b], 0.01);
    let results = scanner.scan_cycle().await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn no_result_at_exactly_the_threshold() {
    let (a, b) = eth_pair();
    let scanner = scanner(vec![a, b], 0.005);
    let results = scanner.scan_cycle().await.unwrap();
    assert!(
        results.is_empty(),
        "profit equal to the threshold must not be materialised"
    );
}

#[tokio::test]
async fn one_dead_exchange_does_not_suppress_the_rest() {
    let (a, b) = eth_pair();
    let dead = Arc::new(MockExchange::new("exchange_c"));
    dead.fail_symbols("gateway timeout");

    let scanner = scanner(vec![dead, a, b], 0.001);
    let results = scanner.scan_cycle().await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].exchange_a, "exchange_a");
    assert_eq!(results[0].exchange_b, "exchange_b");
}

#[tokio::test]
async fn per_cycle_lookup_volume_does_not_grow() {
    // The trend cache absorbs repeat OHLCV work, so a second cycle issues
    // exactly the same number of rate lookups as the first: the total
    // after two cycles is exactly double the total after one.
    let (a, b) = eth_pair();
    let scanner = scanner(
        vec![Arc::clone(&a) as Arc<dyn ExchangeApi>, Arc::clone(&b) as Arc<dyn ExchangeApi>],
        0.001,
    );

    scanner.scan_cycle().await.unwrap();
    let after_first = a.rate_requests() + b.rate_requests();
    scanner.scan_cycle().await.unwrap();
    let after_second = a.rate_requests() + b.rate_requests();

    // Same candidate set both cycles, no extra lookups per cycle.
    assert_eq!(after_second, after_first * 2);
}

#[tokio::test]
async fn rate_moves_change_the_result_set() {
    let (a, b) = eth_pair();
    let scanner = scanner(
        vec![Arc::clone(&a) as Arc<dyn ExchangeApi>, Arc::clone(&b) as Arc<dyn ExchangeApi>],
        0.001,
    );

    let results = scanner.scan_cycle().await.unwrap();
    assert_eq!(results.len(), 1);

    // Spread collapses: B now quotes below A's entry price.
    b.set_rate("ETH", "USD", 1995.0);
    let results = scanner.scan_cycle().await.unwrap();
    assert!(results.is_empty());
}

// ---------------------------------------------------------------------------
// Poll loop over the real scanner
// ---------------------------------------------------------------------------

/// Sink that records every reported cycle.
#[derive(Default)]
struct RecordingSink {
    cycles: AtomicUsize,
    results: Mutex<Vec<ScanResult>>,
}

/// Local handle so the sink can be shared with the poll loop while the
/// test keeps its own reference for assertions.
struct SinkHandle(Arc<RecordingSink>);

impl ReportSink for SinkHandle {
    fn report(&self, _cycle: u64, results: &[ScanResult]) {
        self.0.cycles.fetch_add(1, Ordering::SeqCst);
        self.0.results.lock().unwrap().extend_from_slice(results);
    }
}

#[tokio::test]
async fn poll_loop_reports_each_cycle() {
    let (a, b) = eth_pair();
    let scanner = scanner(vec![a, b], 0.001);
    let sink = Arc::new(RecordingSink::default());

    let mut poll = PollLoop::new(scanner, SinkHandle(Arc::clone(&sink)), Duration::from_secs(60));
    for _ in 0..3 {
        poll.run_once().await;
    }

    assert_eq!(poll.cycles_completed(), 3);
    assert_eq!(sink.cycles.load(Ordering::SeqCst), 3);
    assert_eq!(sink.results.lock().unwrap().len(), 3);
}

/// A scanner that errors on its second cycle.
struct FlakyScan {
    inner: OpportunityScanner,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Scan for FlakyScan {
    async fn scan(&self) -> anyhow::Result<Vec<ScanResult>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 1 {
            anyhow::bail!("simulated mid-run failure");
        }
        self.inner.scan().await
    }
}

#[tokio::test]
async fn poll_loop_survives_a_failing_cycle() {
    let (a, b) = eth_pair();
    let flaky = FlakyScan {
        inner: scanner(vec![a, b], 0.001),
        calls: AtomicUsize::new(0),
    };
    let sink = Arc::new(RecordingSink::default());

    let mut poll = PollLoop::new(flaky, SinkHandle(Arc::clone(&sink)), Duration::from_secs(60));
    for _ in 0..3 {
        poll.run_once().await;
    }

    // Cycle 2 failed; cycles 1 and 3 still reported.
    assert_eq!(poll.cycles_completed(), 3);
    assert_eq!(sink.cycles.load(Ordering::SeqCst), 2);
}
