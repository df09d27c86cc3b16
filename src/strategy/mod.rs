//! Pure trade-math functions.
//!
//! - `profit` — three-leg triangular conversion profit
//! - `momentum` — average period-over-period close-price change

pub mod momentum;
pub mod profit;

pub use momentum::average_percentage_change;
pub use profit::triangular_profit;
