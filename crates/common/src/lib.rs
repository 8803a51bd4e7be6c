//! handctl Common Utilities
//!
//! Shared infrastructure for all handctl crates:
//! - Error types and result aliases
//! - Pipeline clock and rate limiting
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
