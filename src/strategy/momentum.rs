//! Historical close-price momentum.

use crate::types::ScanError;

/// Minimum number of close prices needed for one period-over-period change.
const MIN_CLOSES: usize = 2;

/// Mean of period-over-period fractional close-price changes.
///
/// Fewer than two closes cannot produce a single change, so rather than
/// dividing by an empty sequence this fails with
/// `ScanError::InsufficientData`.
pub fn average_percentage_change(closes: &[f64]) -> Result<f64, ScanError> {
    if closes.len() < MIN_CLOSES {
        return Err(ScanError::InsufficientData {
            needed: MIN_CLOSES,
            got: closes.len(),
        });
    }

    let changes: Vec<f64> = closes
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    Ok(changes.iter().sum::<f64>() / changes.len() as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
