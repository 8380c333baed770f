//! Shared session lifecycle manager.
//!
//! Opening a cluster session is expensive, so every connection opened with
//! the same normalized parameters shares one [`SessionHandle`]. Handles live
//! in a [`SessionCache`] and are reference counted without locks:
//!
//! ```text
//! uninitialized --build--> referenced(n >= 1) --last release--> disposed
//! ```
//!
//! The thread whose release moves the count from 1 to the disposed sentinel
//! closes the session and evicts the cache entry. An acquire that finds the
//! sentinel fails at once, and the caller builds a fresh handle.

mod cache;
mod handle;

pub use cache::{SessionCache, SessionCacheStats};
pub use handle::SessionHandle;

use colbridge_common::SessionConfig;

use crate::cursor::QueryOutput;
use crate::error::ClientResult;

/// An open session against the cluster.
pub trait ClusterSession: Send + Sync {
    /// Executes a query and returns its row sources.
    fn execute(&self, query: &str) -> ClientResult<QueryOutput>;

    /// Closes the session. Called once, by the disposing thread.
    fn close(&self);
}

/// A cluster handle: contact points, pools and policies.
pub trait Cluster: Send {
    /// Opens a session, bound to `keyspace` if given.
    fn connect(&mut self, keyspace: Option<&str>) -> ClientResult<Box<dyn ClusterSession>>;

    /// Releases sockets and threads held by the cluster.
    fn close(&mut self);
}

/// Builds cluster handles from configuration.
pub trait ClusterBuilder: Send + Sync {
    /// Builds a cluster handle. No session is opened yet.
    fn build(&self, config: &SessionConfig) -> ClientResult<Box<dyn Cluster>>;
}

impl<F> ClusterBuilder for F
where
    F: Fn(&SessionConfig) -> ClientResult<Box<dyn Cluster>> + Send + Sync,
{
    fn build(&self, config: &SessionConfig) -> ClientResult<Box<dyn Cluster>> {
        self(config)
    }
}
