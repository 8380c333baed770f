//! Client-facing connection handles.
//!
//! A [`Connection`] is cheap: it holds one reference on a shared
//! [`SessionHandle`] and releases it exactly once, on close or drop.

use std::sync::Arc;

use colbridge_common::{ConnectionParams, CursorOptions, SessionConfig};
use tracing::debug;

use crate::cursor::RowCursor;
use crate::error::{ClientError, ClientResult};
use crate::session::{SessionCache, SessionHandle};

/// An open connection backed by a shared cluster session.
#[derive(Debug)]
pub struct Connection {
    handle: Option<Arc<SessionHandle>>,
    options: CursorOptions,
}

impl Connection {
    /// Opens a connection, sharing a cached session for equal parameters.
    pub fn open(cache: &SessionCache, params: &ConnectionParams) -> ClientResult<Self> {
        let handle = cache.acquire(params)?;
        debug!(params = %params.label(), refs = handle.ref_count(), "connection opened");
        Ok(Self {
            handle: Some(handle),
            options: CursorOptions::default(),
        })
    }

    /// Opens a connection from URL-derived parameters plus explicit ones.
    ///
    /// Explicit parameters override URL-derived ones with the same key.
    pub fn open_with(
        cache: &SessionCache,
        url_params: &ConnectionParams,
        explicit: &ConnectionParams,
    ) -> ClientResult<Self> {
        Self::open(cache, &url_params.clone().merged(explicit))
    }

    /// Sets the options given to cursors of this connection.
    #[must_use]
    pub fn with_cursor_options(mut self, options: CursorOptions) -> Self {
        self.options = options;
        self
    }

    fn handle(&self) -> ClientResult<&Arc<SessionHandle>> {
        self.handle.as_ref().ok_or(ClientError::ConnectionClosed)
    }

    /// Executes a query and returns a cursor over its rows.
    pub fn query(&self, cql: &str) -> ClientResult<RowCursor> {
        let output = self.handle()?.session().execute(cql)?;
        Ok(RowCursor::new(output, self.options.clone()))
    }

    /// Configuration of the underlying session.
    pub fn config(&self) -> ClientResult<&SessionConfig> {
        Ok(self.handle()?.config())
    }

    /// The shared session handle, while open.
    pub fn session_handle(&self) -> Option<&Arc<SessionHandle>> {
        self.handle.as_ref()
    }

    /// Releases the session reference. Later calls do nothing.
    ///
    /// Returns true if this close disposed the shared session.
    pub fn close(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let disposed = handle.release();
                debug!(params = %handle.key().label(), disposed, "connection closed");
                disposed
            }
            None => false,
        }
    }

    /// Returns true once closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
