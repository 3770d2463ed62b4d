//! airlog-sc library interface
//!
//! Exposes the collector's services for integration testing; the binary in
//! `main.rs` wires them into a single run-once collection cycle.

pub mod collector;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use collector::Collector;
pub use config::CollectorConfig;
