//! # colbridge-client
//!
//! Tabular cursor adapter over a wide-column cluster session.
//!
//! This crate exposes query results from a wide-column store through a
//! forward-only, row-at-a-time cursor with typed accessors. It includes:
//!
//! - **Type System**: column types, their protocol ids and a descriptor registry
//! - **Codec**: wire decoding and encoding for every scalar, collection and structure type
//! - **Cursor**: forward-only navigation over one or many result sources, with metadata
//! - **Session Sharing**: one reference-counted cluster session per distinct parameter set
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use colbridge_client::{Connection, SessionCache};
//! use colbridge_common::ConnectionParams;
//!
//! let cache = SessionCache::new(my_cluster_builder);
//! let params = ConnectionParams::new().with("host", "10.0.0.1").with("keyspace", "app");
//!
//! let conn = Connection::open(&cache, &params)?;
//! let mut cursor = conn.query("SELECT id, name FROM users")?;
//! while cursor.next()? {
//!     let id = cursor.get_uuid("id")?;
//!     let name = cursor.get_string(2)?;
//!     println!("{:?} {:?}", id, name);
//! }
//! ```
//!
//! Columns are addressed by 1-based index or by name. A name in double
//! quotes matches case-sensitively; other names match ignoring ASCII case.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;

/// Column types and the type registry.
pub mod types;

/// Value decoding, encoding and coercion.
pub mod codec;

/// Row cursor, row sources and result metadata.
pub mod cursor;

/// Shared cluster sessions.
pub mod session;

/// Client connections.
pub mod connection;

// Re-exports
pub use codec::{
    CqlDuration, Decimal, SqlDate, SqlTime, SqlTimestamp, TupleValue, UdtValue, Value, ValueMap,
    ValueSet, Varint,
};
pub use connection::Connection;
pub use cursor::{
    ColumnDefinitions, ColumnRef, ColumnSpec, FromCell, QueryOutput, ResultMetadata, ResultPage,
    Row, RowCursor, RowSource, SharedCursor,
};
pub use error::{ClientError, ClientResult};
pub use session::{Cluster, ClusterBuilder, ClusterSession, SessionCache, SessionHandle};
pub use types::{ClientKind, ColumnType, SqlType, TypeKind, TypeRegistry, UdtType};
