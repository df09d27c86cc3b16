//! Per-cycle result reporting.
//!
//! The scanner exposes its results as a plain sequence of records; how
//! they are surfaced is the sink's business. The default sink renders a
//! fixed-width table into the structured log.

use tracing::info;

use crate::types::ScanResult;

/// Injected reporting collaborator for the poll loop.
#[cfg_attr(test, mockall::automock)]
pub trait ReportSink: Send + Sync {
    /// Receive one cycle's result set.
    fn report(&self, cycle: u64, results: &[ScanResult]);
}

/// Logs the per-cycle count and, when non-empty, a tabular rendering.
pub struct LogReporter;

impl ReportSink for LogReporter {
    fn report(&self, cycle: u64, results: &[ScanResult]) {
        if results.is_empty() {
            info!(cycle, "No profitable trades found");
            return;
        }
        info!(cycle, count = results.len(), "Found profitable trades!");
        info!("\n{}", render_table(results));
    }
}

/// Render results as a fixed-width text table.
pub fn render_table(results: &[ScanResult]) -> String {
    let mut rows: Vec<[String; 5]> = vec![[
        "EXCHANGE A".to_string(),
        "EXCHANGE B".to_string(),
        "ROUTE".to_string(),
        "NOTIONAL".to_string(),
        "PROFIT %".to_string(),
    ]];

    for r in results {
        rows.push([
            r.exchange_a.clone(),
            r.exchange_b.clone(),
            format!(
                "{}/{} -> {} -> {}",
                r.leg_a.base_asset, r.leg_a.quote_asset, r.leg_b.quote_asset, r.leg_c.quote_asset,
            ),
            format!("{:.2}", r.quote_asset_amount),
            format!("{:.4}", r.profit_percentage * 100.0),
        ]);
    }

    let mut widths = [0usize; 5];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
