//! Configuration for colbridge.
//!
//! Connection parameters arrive as an already-parsed key/value mapping.
//! This module normalizes them into cache keys and typed configurations.

mod cursor;
mod params;
mod session;

pub use cursor::{CursorOptions, CursorType, FetchDirection};
pub use params::{keys, ConnectionParams};
pub use session::SessionConfig;
