//! Error types for the client library.

use colbridge_common::{ConfigError, ErrorCode};
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Type identifier or name not present in the registry.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Column name not present in the current row.
    #[error("no such column '{0}'")]
    NoSuchColumn(String),

    /// Column index outside `1..=count`.
    #[error("column index {index} out of range, expected 1..={count}")]
    ColumnIndexOutOfRange {
        /// The requested 1-based index, as given.
        index: i64,
        /// Number of columns in the row.
        count: usize,
    },

    /// Malformed bytes for a column value.
    #[error("cannot decode {type_name}: {reason}")]
    Decode {
        /// Declared type of the value.
        type_name: String,
        /// What was wrong with the bytes.
        reason: String,
        /// Underlying failure, for collection and structure elements.
        #[source]
        source: Option<Box<ClientError>>,
    },

    /// Value cannot be encoded as the requested column type.
    #[error("cannot encode {value_kind} as {type_name}")]
    Encode {
        /// Target column type.
        type_name: String,
        /// Kind of the offending value.
        value_kind: &'static str,
    },

    /// Accessor not applicable to the declared column type.
    #[error("cannot read {declared} column '{column}' as {requested}")]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Declared column type.
        declared: String,
        /// Requested client type.
        requested: &'static str,
    },

    /// Decimal cannot be rescaled without losing digits.
    #[error("cannot rescale decimal from scale {from} to {scale} exactly")]
    InvalidScale {
        /// The stored scale.
        from: i32,
        /// The requested scale.
        scale: i32,
    },

    /// Accessor called while the cursor is not on a row.
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,

    /// Cursor already closed.
    #[error("cursor is closed")]
    CursorClosed,

    /// Operation not available on a forward-only cursor.
    #[error("operation not supported: {0}")]
    FeatureNotSupported(&'static str),

    /// Fetch direction not allowed for this cursor.
    #[error("illegal fetch direction {0}")]
    InvalidFetchDirection(i32),

    /// Negative fetch size.
    #[error("fetch size must be non-negative, got {0}")]
    InvalidFetchSize(i32),

    /// Could not build the underlying cluster session.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection handle already closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Query execution failed in the cluster session.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Invalid connection configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Creates a decode error without an underlying cause.
    pub fn decode(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            type_name: type_name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a decode error for a fixed-width type given the wrong number
    /// of bytes.
    pub fn width(type_name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::decode(
            type_name,
            format!("expected exactly {} bytes, got {}", expected, actual),
        )
    }

    /// Out-of-range error for a 1-based position.
    pub(crate) fn index_out_of_range(index: usize, count: usize) -> Self {
        Self::ColumnIndexOutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            count,
        }
    }

    /// Wraps the failure of one element of a collection or structure.
    pub fn element(type_name: impl Into<String>, index: usize, cause: ClientError) -> Self {
        Self::Decode {
            type_name: type_name.into(),
            reason: format!("element {} is malformed", index),
            source: Some(Box::new(cause)),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownType(_) => ErrorCode::UnknownType,
            Self::NoSuchColumn(_) => ErrorCode::NoSuchColumn,
            Self::ColumnIndexOutOfRange { .. } => ErrorCode::ColumnIndexOutOfRange,
            Self::Decode { .. } => ErrorCode::Decode,
            Self::Encode { .. } => ErrorCode::InvalidArgument,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::InvalidScale { .. } => ErrorCode::InvalidScale,
            Self::NoCurrentRow => ErrorCode::NoCurrentRow,
            Self::CursorClosed => ErrorCode::CursorClosed,
            Self::FeatureNotSupported(_) => ErrorCode::NotSupported,
            Self::InvalidFetchDirection(_) | Self::InvalidFetchSize(_) => ErrorCode::InvalidFetch,
            Self::ConnectionFailed(_) => ErrorCode::ConnectionFailed,
            Self::ConnectionClosed => ErrorCode::ConnectionClosed,
            Self::QueryFailed(_) => ErrorCode::QueryFailed,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Returns true if retrying the same call could succeed.
    ///
    /// Nothing in this crate is retried: malformed bytes and schema
    /// mismatches are deterministic, and connection failures surface as-is.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns true if this is a decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}
