//! Scan engine.
//!
//! - `scanner` — one-pass triangular opportunity detection across exchanges
//! - `reporter` — per-cycle result reporting sink
//! - `runner` — interval-driven poll loop with cooperative shutdown

pub mod reporter;
pub mod runner;
pub mod scanner;
