//! Triangular conversion profit.

/// Profit fraction of a three-leg round trip starting from `notional`
/// units of the quote asset.
///
/// Leg order: divide by `rate_ab` (buy the base asset at its entry price),
/// multiply by `rate_bc` (cross into the common asset), multiply by
/// `rate_ca` (sell the common asset back on the second exchange).
///
/// Stateless and unclamped — a negative result is a valid, expected
/// outcome and intermediate values are kept at full float precision.
pub fn triangular_profit(notional: f64, rate_ab: f64, rate_bc: f64, rate_ca: f64) -> f64 {
    let base_amount = notional / rate_ab;
    let common_amount = base_amount * rate_bc;
    let final_amount = common_amount * rate_ca;
    (final_amount - notional) / notional
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
