//! # colbridge-common
//!
//! Common types, error codes, and configuration for colbridge.
//!
//! This crate provides the foundations shared by the client and test crates:
//!
//! - **Errors**: stable `ErrorCode`s with SQLSTATE classes, and `ConfigError`
//! - **Config**: normalized connection parameters, session and cursor settings
//! - **Constants**: display widths, protocol defaults and limits
//!
//! ## Example
//!
//! ```rust
//! use colbridge_common::config::{ConnectionParams, SessionConfig};
//!
//! let params = ConnectionParams::new()
//!     .with("Host", "10.0.0.1--10.0.0.2")
//!     .with("keyspace", "metrics");
//! let config = SessionConfig::from_params(&params).unwrap();
//! assert_eq!(config.hosts, vec!["10.0.0.1", "10.0.0.2"]);
//! assert_eq!(config.port, 9042);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;

pub use config::{
    ConnectionParams, CursorOptions, CursorType, FetchDirection, SessionConfig,
};
pub use constants::*;
pub use error::{ConfigError, ConfigResult, ErrorCode};
