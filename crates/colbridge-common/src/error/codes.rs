//! Error codes and configuration errors.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Operation not supported.
    NotSupported = 0x0002,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,

    // Type errors (0x0100 - 0x01FF)
    /// Type identifier or name not present in the registry.
    UnknownType = 0x0100,
    /// Malformed bytes for a column value.
    Decode = 0x0101,
    /// Value cannot be represented at the requested scale.
    InvalidScale = 0x0102,
    /// Accessor not applicable to the declared column type.
    TypeMismatch = 0x0103,

    // Column errors (0x0200 - 0x02FF)
    /// Column name not present in the row.
    NoSuchColumn = 0x0200,
    /// Column index outside `1..=column_count`.
    ColumnIndexOutOfRange = 0x0201,

    // Cursor errors (0x0300 - 0x03FF)
    /// Accessor called while the cursor is not on a row.
    NoCurrentRow = 0x0300,
    /// Cursor already closed.
    CursorClosed = 0x0301,
    /// Illegal fetch direction or size.
    InvalidFetch = 0x0302,

    // Session errors (0x0400 - 0x04FF)
    /// Could not build the underlying cluster session.
    ConnectionFailed = 0x0400,
    /// Connection handle already closed.
    ConnectionClosed = 0x0401,
    /// Query execution failed in the cluster session.
    QueryFailed = 0x0402,
    /// Invalid connection configuration.
    InvalidConfig = 0x0403,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Type",
            0x02 => "Column",
            0x03 => "Cursor",
            0x04 => "Session",
            _ => "Unknown",
        }
    }

    /// Returns the SQLSTATE class reported to tabular clients.
    #[must_use]
    pub const fn sql_state(&self) -> &'static str {
        match self {
            Self::Unknown | Self::Internal => "HY000",
            Self::NotSupported => "0A000",
            Self::InvalidArgument => "HY009",
            Self::UnknownType => "HY004",
            Self::Decode => "22018",
            Self::InvalidScale => "22003",
            Self::TypeMismatch => "22005",
            Self::NoSuchColumn => "42S22",
            Self::ColumnIndexOutOfRange => "07009",
            Self::NoCurrentRow => "24000",
            Self::CursorClosed => "HY010",
            Self::InvalidFetch => "HY024",
            Self::ConnectionFailed => "08001",
            Self::ConnectionClosed => "08003",
            Self::QueryFailed => "42000",
            Self::InvalidConfig => "HY024",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Configuration error.
///
/// Raised while turning connection parameters into a session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required parameter is missing.
    #[error("missing connection parameter '{key}'")]
    Missing {
        /// The parameter key.
        key: String,
    },

    /// A parameter has a value that cannot be used.
    #[error("invalid value '{value}' for connection parameter '{key}': {reason}")]
    Invalid {
        /// The parameter key.
        key: String,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidConfig
    }
}
