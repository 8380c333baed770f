//! Error handling for colbridge.
//!
//! This module provides the stable error codes shared across crates and
//! the configuration error type.

mod codes;

pub use codes::{ConfigError, ErrorCode};

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
