//! Data layer for the anomaly dashboard.
//!
//! Loads and joins the universe, watchlist and historical CSV tables,
//! aggregates them per sector, and builds the page views handed to the
//! rendering layer.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod history;
pub mod reader;

pub use dashboard_core as core;
