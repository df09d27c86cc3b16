//! TRISCAN — cross-exchange triangular arbitrage opportunity scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cache;
pub mod config;
pub mod engine;
pub mod exchanges;
pub mod strategy;
pub mod types;
