//! Askgate Core Library
//!
//! This crate provides the foundational utilities for the askgate workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Gateway configuration

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::GatewayConfig;
pub use error::{AppError, AppResult};
