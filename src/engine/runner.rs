//! Interval-driven poll loop.
//!
//! Drives the scanner on a fixed interval: scan, hand the result set to
//! the reporting sink, sleep, repeat. A failed cycle is logged and the
//! loop moves on — transient API trouble must never kill the service.
//! Shutdown is cooperative and takes effect between cycles.

use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use super::reporter::ReportSink;
use super::scanner::Scan;

pub struct PollLoop<S, R> {
    scanner: S,
    reporter: R,
    interval: Duration,
    cycle: u64,
}

impl<S: Scan, R: ReportSink> PollLoop<S, R> {
    pub fn new(scanner: S, reporter: R, interval: Duration) -> Self {
        Self {
            scanner,
            reporter,
            interval,
            cycle: 0,
        }
    }

    /// Cycles completed so far (including failed ones).
    pub fn cycles_completed(&self) -> u64 {
        self.cycle
    }

    /// Run a single scan-and-report cycle. Errors are contained here:
    /// logged with context, never propagated.
    pub async fn run_once(&mut self) {
        self.cycle += 1;
        info!(cycle = self.cycle, "Checking for profitable trades...");

        match self.scanner.scan().await {
            Ok(results) => self.reporter.report(self.cycle, &results),
            Err(e) => error!(
                cycle = self.cycle,
                error = format!("{e:#}"),
                "Scan cycle failed, continuing to next"
            ),
        }
    }

    /// Run until the `shutdown` future completes. The stop signal is
    /// observed between cycles; in-flight work is simply abandoned.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Self {
        let mut interval = tokio::time::interval(self.interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => self.run_once().await,
                _ = &mut shutdown => {
                    info!(cycles = self.cycle, "Shutdown signal received");
                    break;
                }
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
