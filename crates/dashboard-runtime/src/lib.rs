//! Runtime layer for the anomaly dashboard.
//!
//! Owns the session's loaded tables and decides when they must be read
//! again from disk.

pub mod data_manager;

pub use dashboard_core as core;
pub use dashboard_data as data;
