//! Reference-counted session handle.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use colbridge_common::{ConnectionParams, SessionConfig, DISPOSED_REFS};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::cache::CacheShared;
use super::{Cluster, ClusterBuilder, ClusterSession};
use crate::error::{ClientError, ClientResult};

/// One shared cluster session and its reference count.
///
/// The count starts at 0, rises on [`acquire`](Self::acquire) and falls on
/// [`release`](Self::release). The release that would take it from 1 to 0
/// stores [`DISPOSED_REFS`] instead and tears the session down.
pub struct SessionHandle {
    key: ConnectionParams,
    config: SessionConfig,
    session: Box<dyn ClusterSession>,
    cluster: Mutex<Option<Box<dyn Cluster>>>,
    refs: AtomicI32,
    cache: Weak<CacheShared>,
}

impl SessionHandle {
    /// Builds the cluster and opens a session for `key`.
    ///
    /// If the session cannot be opened the cluster is closed before the
    /// error is returned.
    pub(crate) fn build(
        key: ConnectionParams,
        builder: &dyn ClusterBuilder,
        cache: Weak<CacheShared>,
    ) -> ClientResult<Self> {
        let config = SessionConfig::from_params(&key)?;
        let mut cluster = builder.build(&config).map_err(connection_failed)?;
        let session = match cluster.connect(config.keyspace.as_deref()) {
            Ok(session) => session,
            Err(e) => {
                cluster.close();
                return Err(connection_failed(e));
            }
        };

        debug!(
            params = %key.label(),
            hosts = ?config.hosts,
            keyspace = ?config.keyspace,
            "cluster session built"
        );

        Ok(Self {
            key,
            config,
            session,
            cluster: Mutex::new(Some(cluster)),
            refs: AtomicI32::new(0),
            cache,
        })
    }

    /// Takes a reference.
    ///
    /// Returns false, without waiting, if the handle is already disposed;
    /// the caller should build a fresh handle instead.
    pub fn acquire(&self) -> bool {
        let mut current = self.refs.load(Ordering::Acquire);
        loop {
            if current < 0 {
                trace!(params = %self.key.label(), "handle already disposed, rebuilding");
                return false;
            }
            match self.refs.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    trace!(params = %self.key.label(), refs = current + 1, "session acquired");
                    return true;
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Drops a reference. Returns true if this call disposed the handle.
    ///
    /// Releasing a handle that holds no reference does nothing.
    pub fn release(&self) -> bool {
        let mut current = self.refs.load(Ordering::Acquire);
        loop {
            if current <= 0 {
                trace!(params = %self.key.label(), refs = current, "release without reference");
                return false;
            }
            let next = if current == 1 { DISPOSED_REFS } else { current - 1 };
            match self
                .refs
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) if next == DISPOSED_REFS => {
                    self.dispose();
                    return true;
                }
                Ok(_) => {
                    trace!(params = %self.key.label(), refs = next, "session released");
                    return false;
                }
                Err(observed) => current = observed,
            }
        }
    }

    fn dispose(&self) {
        self.close_resources();
        if let Some(cache) = self.cache.upgrade() {
            cache.evict(&self.key, self);
        }
        debug!(params = %self.key.label(), "cluster session disposed");
    }

    fn close_resources(&self) {
        self.session.close();
        if let Some(mut cluster) = self.cluster.lock().take() {
            cluster.close();
        }
    }

    /// Current reference count; [`DISPOSED_REFS`] once disposed.
    pub fn ref_count(&self) -> i32 {
        self.refs.load(Ordering::Acquire)
    }

    /// Returns true once disposed.
    pub fn is_disposed(&self) -> bool {
        self.ref_count() < 0
    }

    /// The open session.
    pub fn session(&self) -> &dyn ClusterSession {
        self.session.as_ref()
    }

    /// The configuration the session was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The normalized parameters this handle is cached under.
    pub fn key(&self) -> &ConnectionParams {
        &self.key
    }

    /// Returns true if `a` and `b` are the same handle.
    pub fn same(a: &Arc<SessionHandle>, b: &SessionHandle) -> bool {
        std::ptr::eq(Arc::as_ptr(a), b)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // A handle dropped without its last release still owns the session.
        if !self.is_disposed() {
            trace!(params = %self.key.label(), "closing undisposed session on drop");
            self.close_resources();
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("key", &self.key)
            .field("refs", &self.ref_count())
            .finish()
    }
}

fn connection_failed(e: ClientError) -> ClientError {
    match e {
        ClientError::ConnectionFailed(_) | ClientError::InvalidConfig(_) => e,
        other => ClientError::ConnectionFailed(other.to_string()),
    }
}
