//! PINGPONG: two-token ping-pong arbitrage bot
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod state;
pub mod services;
pub mod engine;
pub mod control;
pub mod report;
