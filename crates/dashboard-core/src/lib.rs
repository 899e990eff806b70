//! Shared domain types for the peer-group anomaly dashboard.
//!
//! Holds the joined company/historical record models, the error type, CLI
//! settings with persisted last-used parameters, the narrative lookup table
//! and number formatting helpers used by every page.

pub mod error;
pub mod formatting;
pub mod models;
pub mod narrative;
pub mod settings;

pub use error::{DashboardError, Result};
