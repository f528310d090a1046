//! Single-flight TTL cache for read requests
//!
//! Provides a `SingleFlightCache` that keeps successful results of a keyed
//! asynchronous operation for a bounded time and collapses concurrent calls for
//! the same key into one underlying operation.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::CacheKey;

/// Upper bound applied to a TTL whose deadline would overflow the clock
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

/// A cached successful result
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// An in-flight operation that every caller for the key awaits
struct PendingOperation<V, E> {
    /// Identifies this registration; a settling operation only touches the
    /// maps if its registration is still the current one
    id: u64,
    fetch: SharedFetch<V, E>,
}

pub(super) struct Inner<V, E> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    pending: HashMap<CacheKey, PendingOperation<V, E>>,
    next_id: u64,
}

impl<V, E> Inner<V, E> {
    pub(super) fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before - self.entries.len()
    }
}

/// Caches successful results per key and shares in-flight requests
///
/// The handle is cheap to clone; clones share the same maps. Both maps sit
/// behind one mutex that is held only while they are read or written, never
/// while a supplier runs, so requests for different keys never wait on each
/// other.
///
/// Failures are handed to every waiter unmodified and are never cached: the
/// next call after a failure always starts a fresh attempt.
pub struct SingleFlightCache<V, E> {
    pub(super) inner: Arc<Mutex<Inner<V, E>>>,
}

impl<V, E> Clone for SingleFlightCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> Default for SingleFlightCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> fmt::Debug for SingleFlightCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SingleFlightCache")
            .field("entries", &inner.entries.len())
            .field("pending", &inner.pending.len())
            .finish()
    }
}

impl<V, E> SingleFlightCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                pending: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Returns the value for `key`, fetching it with `supplier` when needed
    ///
    /// # Behavior
    /// - A fresh entry is returned without invoking `supplier`
    /// - If a request for `key` is already in flight, this call waits for it and
    ///   returns its outcome; `supplier` is not invoked
    /// - Otherwise `supplier` is invoked once; a success is cached for `ttl`
    ///   (a zero `ttl` caches nothing and only deduplicates in-flight calls)
    ///
    /// Each request is driven by its own tokio task, so it settles even if
    /// every waiter goes away: dropping the returned future never cancels the
    /// request, and an abandoned request still caches its result and clears
    /// its pending registration. Must be called within a tokio runtime.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, ttl: Duration, supplier: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (fetch, started) = {
            let mut inner = self.inner.lock();

            let now = Instant::now();
            if let Some(entry) = inner.entries.get(key).filter(|e| now < e.expires_at) {
                debug!(key = %key, "cache hit");
                return Ok(entry.value.clone());
            }
            // Lazy expiry
            inner.entries.remove(key);

            if let Some(pending) = inner.pending.get(key) {
                debug!(key = %key, "joining in-flight request");
                (pending.fetch.clone(), false)
            } else {
                let id = inner.next_id;
                inner.next_id += 1;
                debug!(key = %key, "starting request");

                let fetch = settle_into(Arc::downgrade(&self.inner), key.clone(), id, ttl, supplier);
                inner.pending.insert(
                    key.clone(),
                    PendingOperation {
                        id,
                        fetch: fetch.clone(),
                    },
                );
                (fetch, true)
            }
        };

        if started {
            // Drives the request to completion regardless of who is waiting
            tokio::spawn(fetch.clone());
        }

        fetch.await
    }

    /// Removes the cached entry for `key`
    ///
    /// A request for `key` that is already in flight is not affected and will
    /// store its result when it completes.
    ///
    /// # Returns
    /// `true` if an entry was removed
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.remove(key).is_some()
    }

    /// Removes every entry and forgets every in-flight request
    ///
    /// In-flight suppliers keep running and their original callers still get
    /// the result, but the result is not stored and new callers start afresh.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.pending.clear();
    }

    /// Drops entries whose TTL has elapsed and returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired(Instant::now())
    }

    /// Whether `key` has an entry that has not yet expired
    pub fn contains_fresh(&self, key: &CacheKey) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| Instant::now() < entry.expires_at)
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of requests currently in flight
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

/// Wraps `supplier` in a shared future that updates the maps when it settles
///
/// The supplier is invoked on first poll by the driver task or a waiter,
/// after the caller has released the lock. Only the registration identified by `id` may remove the pending entry
/// or store the value, so a request forgotten by `clear` leaves no trace.
fn settle_into<V, E, F, Fut>(
    inner: Weak<Mutex<Inner<V, E>>>,
    key: CacheKey,
    id: u64,
    ttl: Duration,
    supplier: F,
) -> SharedFetch<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    async move {
        let result = supplier().await;

        if let Some(inner) = inner.upgrade() {
            let mut inner = inner.lock();
            let is_current = inner.pending.get(&key).is_some_and(|p| p.id == id);
            if is_current {
                inner.pending.remove(&key);
                match &result {
                    Ok(value) if !ttl.is_zero() => {
                        let now = Instant::now();
                        let expires_at = now.checked_add(ttl).unwrap_or(now + MAX_TTL);
                        inner.entries.insert(
                            key.clone(),
                            CacheEntry {
                                value: value.clone(),
                                expires_at,
                            },
                        );
                    }
                    Ok(_) => {}
                    Err(_) => debug!(key = %key, "request failed, not caching"),
                }
            } else {
                debug!(key = %key, "discarding result of forgotten request");
            }
        }

        result
    }
    .boxed()
    .shared()
}
