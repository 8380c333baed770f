//! Cache of shared session handles keyed by connection parameters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use colbridge_common::ConnectionParams;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::handle::SessionHandle;
use super::ClusterBuilder;
use crate::error::ClientResult;

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCacheStats {
    /// Handles built on a cache miss.
    pub loads: u64,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Entries removed after disposal or invalidation.
    pub evictions: u64,
    /// Handles currently cached.
    pub cached: usize,
}

/// One cache entry. The handle is set once; `building` serializes
/// construction for the key without holding any map lock.
#[derive(Default)]
struct Slot {
    handle: OnceLock<Arc<SessionHandle>>,
    /// True once a build for this slot failed and the slot was detached.
    building: Mutex<bool>,
}

impl Slot {
    fn holds(&self, handle: &SessionHandle) -> bool {
        self.handle
            .get()
            .is_some_and(|cached| SessionHandle::same(cached, handle))
    }
}

pub(crate) struct CacheShared {
    sessions: DashMap<ConnectionParams, Arc<Slot>>,
    builder: Box<dyn ClusterBuilder>,
    loads: AtomicU64,
    hits: AtomicU64,
    evictions: AtomicU64,
}

impl CacheShared {
    /// Removes the entry for `key` if it still holds `handle`.
    ///
    /// Never waits on a build in progress.
    pub(crate) fn evict(&self, key: &ConnectionParams, handle: &SessionHandle) -> bool {
        let removed = self
            .sessions
            .remove_if(key, |_, slot| slot.holds(handle))
            .is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }
}

/// Process-scoped cache of [`SessionHandle`]s.
///
/// Cloning the cache shares its entries. Independent caches never share
/// handles.
#[derive(Clone)]
pub struct SessionCache {
    shared: Arc<CacheShared>,
}

impl SessionCache {
    /// Creates an empty cache that builds clusters with `builder`.
    pub fn new(builder: impl ClusterBuilder + 'static) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                sessions: DashMap::new(),
                builder: Box::new(builder),
                loads: AtomicU64::new(0),
                hits: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the handle for `key`, building it on a miss.
    ///
    /// Construction for one key happens at most once at a time; concurrent
    /// callers for the same key wait for it. The map itself is only locked
    /// to look up or insert the slot, never across a build.
    pub fn load(&self, key: &ConnectionParams) -> ClientResult<Arc<SessionHandle>> {
        loop {
            let cached = self.shared.sessions.get(key).map(|slot| Arc::clone(slot.value()));
            let slot = match cached {
                Some(slot) => slot,
                None => Arc::clone(
                    self.shared
                        .sessions
                        .entry(key.clone())
                        .or_insert_with(|| Arc::new(Slot::default()))
                        .value(),
                ),
            };
            if let Some(handle) = slot.handle.get() {
                self.shared.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(handle));
            }

            let mut failed = slot.building.lock();
            if *failed {
                // Detached by a failed build; look the key up again.
                continue;
            }
            if let Some(handle) = slot.handle.get() {
                self.shared.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(handle));
            }

            match SessionHandle::build(
                key.clone(),
                self.shared.builder.as_ref(),
                Arc::downgrade(&self.shared),
            ) {
                Ok(handle) => {
                    let handle = Arc::new(handle);
                    let stored = Arc::clone(slot.handle.get_or_init(|| Arc::clone(&handle)));
                    self.shared.loads.fetch_add(1, Ordering::Relaxed);
                    return Ok(stored);
                }
                Err(e) => {
                    *failed = true;
                    self.shared
                        .sessions
                        .remove_if(key, |_, cached| Arc::ptr_eq(cached, &slot));
                    return Err(e);
                }
            }
        }
    }

    /// Returns an acquired handle for `key`.
    ///
    /// A cached handle that turns out to be disposed is evicted and replaced
    /// by a freshly built one.
    pub fn acquire(&self, key: &ConnectionParams) -> ClientResult<Arc<SessionHandle>> {
        loop {
            let handle = self.load(key)?;
            if handle.acquire() {
                return Ok(handle);
            }
            self.shared.evict(key, &handle);
        }
    }

    /// Removes the entry for `key`, if any.
    pub fn invalidate(&self, key: &ConnectionParams) -> bool {
        let removed = self.shared.sessions.remove(key).is_some();
        if removed {
            self.shared.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(params = %key.label(), "session cache entry invalidated");
        }
        removed
    }

    /// Returns true if a built handle is cached for `key`.
    pub fn contains(&self, key: &ConnectionParams) -> bool {
        self.shared
            .sessions
            .get(key)
            .is_some_and(|slot| slot.handle.get().is_some())
    }

    /// Number of cached handles. Keys still being built are not counted.
    pub fn len(&self) -> usize {
        self.shared
            .sessions
            .iter()
            .filter(|slot| slot.handle.get().is_some())
            .count()
    }

    /// Returns true if no handle is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> SessionCacheStats {
        SessionCacheStats {
            loads: self.shared.loads.load(Ordering::Relaxed),
            hits: self.shared.hits.load(Ordering::Relaxed),
            evictions: self.shared.evictions.load(Ordering::Relaxed),
            cached: self.len(),
        }
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("cached", &self.len())
            .finish()
    }
}
