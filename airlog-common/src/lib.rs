//! # AIRLOG Common Library
//!
//! Shared code for the AIRLOG collector including:
//! - Error types
//! - Database initialization and schema maintenance
//! - Persisted sample rows and per-channel lookups

pub mod channel;
pub mod db;
pub mod error;

pub use channel::Channel;
pub use error::{Error, Result};
