//! Hyperlapse Common Utilities
//!
//! Shared infrastructure for all Hyperlapse crates:
//! - Error types and result aliases
//! - Pipeline configuration loading
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
