//! Text rendering layer for the anomaly dashboard.
//!
//! Provides aligned plain-text tables and one renderer per dashboard page.

pub mod pages;
pub mod table_view;

pub use dashboard_core as core;
