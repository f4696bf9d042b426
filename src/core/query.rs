//! Keyed query cache.
//!
//! A [`Query`] keeps the last known result per filter key, tracks which request each
//! key is waiting on, and only ever exposes the entry for its *current* key. A
//! response that arrives for a key the consumer has moved away from is still cached
//! under its own key, but never shows up as current data.

use crate::errors::{Error, SharedError};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Identifies one dispatched fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

/// What happened to a response
#[derive(Debug, Clone)]
pub struct Settled {
    /// Request the response belongs to
    pub request: RequestId,
    /// Whether it was stored; `false` for superseded or invalidated requests
    pub applied: bool,
    /// The error it carried, if it failed and was applied
    pub error: Option<SharedError>,
}

#[derive(Debug)]
struct Entry<V> {
    data: Option<Arc<V>>,
    error: Option<SharedError>,
    fetched_at: Option<Instant>,
    pending: Option<RequestId>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetched_at: None,
            pending: None,
        }
    }
}

/// Cached results for one kind of resource, keyed by filter value
#[derive(Debug)]
pub struct Query<K, V> {
    resource: &'static str,
    entries: HashMap<K, Entry<V>>,
    key: Option<K>,
    stale_after: Duration,
}

impl<K, V> Query<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    /// Creates an empty, disabled query.
    #[must_use]
    pub fn new(resource: &'static str, stale_after: Duration) -> Self {
        Self {
            resource,
            entries: HashMap::new(),
            key: None,
            stale_after,
        }
    }

    /// Name used in logs
    #[must_use]
    pub const fn resource(&self) -> &'static str {
        self.resource
    }

    /// Current filter key; `None` means the query is disabled.
    #[must_use]
    pub const fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Switches the filter key. Returns `true` if it changed.
    pub fn set_key(&mut self, key: Option<K>) -> bool {
        if self.key == key {
            return false;
        }
        trace!(resource = self.resource, from = ?self.key, to = ?key, "Query key changed");
        self.key = key;
        true
    }

    fn current(&self) -> Option<&Entry<V>> {
        self.key.as_ref().and_then(|k| self.entries.get(k))
    }

    /// Data for the current key
    #[must_use]
    pub fn data(&self) -> Option<&V> {
        self.current().and_then(|e| e.data.as_deref())
    }

    /// First load of the current key in progress
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.current()
            .is_some_and(|e| e.pending.is_some() && e.data.is_none())
    }

    /// Any load of the current key in progress, including background refetches
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.current().is_some_and(|e| e.pending.is_some())
    }

    /// Last error for the current key
    #[must_use]
    pub fn error(&self) -> Option<&SharedError> {
        self.current().and_then(|e| e.error.as_ref())
    }

    /// Whether the last load of the current key failed
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error().is_some()
    }

    /// Whether the current key should be fetched: enabled, not already in flight, and
    /// either never loaded or older than the staleness window.
    #[must_use]
    pub fn needs_fetch(&self, now: Instant) -> bool {
        let Some(key) = &self.key else {
            return false;
        };
        self.entries.get(key).is_none_or(|e| {
            e.pending.is_none()
                && e
                    .fetched_at
                    .is_none_or(|at| now.duration_since(at) >= self.stale_after)
        })
    }

    /// Records that `request` now loads the current key and returns that key.
    /// A still-outstanding older request for the same key is superseded.
    pub fn begin(&mut self, request: RequestId) -> Option<K> {
        let key = self.key.clone()?;
        let entry = self.entries.entry(key.clone()).or_default();
        if let Some(previous) = entry.pending.replace(request) {
            debug!(resource = self.resource, ?key, ?previous, "Superseding in-flight request");
        }
        Some(key)
    }

    /// Stores a response if its entry still waits for `request`.
    pub fn settle(
        &mut self,
        key: &K,
        request: RequestId,
        result: Result<V, Error>,
        now: Instant,
    ) -> Settled {
        let Some(entry) = self
            .entries
            .get_mut(key)
            .filter(|e| e.pending == Some(request))
        else {
            debug!(resource = self.resource, ?key, ?request, "Discarding stale response");
            return Settled {
                request,
                applied: false,
                error: None,
            };
        };

        entry.pending = None;
        let error = match result {
            Ok(value) => {
                entry.data = Some(Arc::new(value));
                entry.error = None;
                entry.fetched_at = Some(now);
                None
            }
            Err(e) => {
                debug!(resource = self.resource, ?key, "Fetch failed: {}", e);
                let shared = Arc::new(e);
                entry.error = Some(Arc::clone(&shared));
                Some(shared)
            }
        };
        Settled {
            request,
            applied: true,
            error,
        }
    }

    /// Gives up on `request` after its task died without a response. The entry that
    /// waited on it records a fetch error and can be fetched again.
    pub fn abandon(&mut self, request: RequestId, reason: &str) -> Settled {
        let resource = self.resource;
        let Some((key, entry)) = self
            .entries
            .iter_mut()
            .find(|(_, e)| e.pending == Some(request))
        else {
            return Settled {
                request,
                applied: false,
                error: None,
            };
        };

        warn!(resource, ?key, ?request, "Fetch abandoned: {}", reason);
        entry.pending = None;
        let shared = Arc::new(Error::fetch(resource, reason));
        entry.error = Some(Arc::clone(&shared));
        Settled {
            request,
            applied: true,
            error: Some(shared),
        }
    }

    /// Drops every cached entry; in-flight responses for them will be discarded.
    pub fn invalidate_all(&mut self) {
        debug!(
            resource = self.resource,
            entries = self.entries.len(),
            "Invalidating cache"
        );
        self.entries.clear();
    }

    /// Every cached result, including keys other than the current one.
    pub fn cached(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .filter_map(|(k, e)| e.data.as_deref().map(|v| (k, v)))
    }
}
