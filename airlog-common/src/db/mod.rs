//! Database access for AIRLOG
//!
//! One SQLite database holding the wide-row analytics table the collector
//! appends to once per polling cycle.

pub mod init;
pub mod samples;

pub use init::init_database;
