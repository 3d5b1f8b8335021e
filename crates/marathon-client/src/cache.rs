//! Page cache shared by the aggregator and the mutation coordinator.
//!
//! Entries are keyed by `(channel, page, size)`. A page stays fresh for the
//! configured window; after that, or once its channel is invalidated and the
//! entry dropped, the next read goes back to the network. Concurrent misses on one key wait on a per-key gate so
//! only one request is in flight for it. There is no version stamping: the last
//! response to land wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use marathon_types::{Channel, Notification, PageEnvelope};

use crate::error::NotifyResult;
use crate::pagination::PageRequest;

pub type NotificationPage = PageEnvelope<Notification>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub channel: Channel,
    pub page: u32,
    pub size: u32,
}

impl CacheKey {
    pub fn new(channel: Channel, request: PageRequest) -> Self {
        Self {
            channel,
            page: request.page(),
            size: request.size(),
        }
    }
}

struct Entry {
    page: Arc<NotificationPage>,
    fetched_at: Instant,
}

impl Entry {
    fn is_fresh(&self, stale_after: Duration) -> bool {
        self.fetched_at.elapsed() < stale_after
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct QueryCache {
    stale_after: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
    /// One gate per key with a fetch in progress.
    in_flight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The cached page for `key` if it is still fresh.
    pub async fn get_fresh(&self, key: &CacheKey) -> Option<Arc<NotificationPage>> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.is_fresh(self.stale_after))
            .map(|e| e.page.clone())
    }

    /// Serve `key` from the cache, or run `fetch` and store its result.
    ///
    /// Errors are returned to the caller and leave the cache untouched.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> NotifyResult<Arc<NotificationPage>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = NotifyResult<NotificationPage>>,
    {
        if let Some(page) = self.get_fresh(&key).await {
            self.record_hit(&key);
            return Ok(page);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(key).or_default().clone()
        };
        let _guard = gate.lock().await;

        // Someone else may have filled the entry while we waited on the gate.
        if let Some(page) = self.get_fresh(&key).await {
            self.record_hit(&key);
            return Ok(page);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(channel = %key.channel, page = key.page, size = key.size, "cache miss");

        let result = match fetch().await {
            Ok(page) => Ok(self.insert(key, page).await),
            Err(e) => Err(e),
        };

        // Waiters still hold their clone of the gate and will find the fresh
        // entry once they get through it.
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.get(&key).is_some_and(|g| Arc::ptr_eq(g, &gate)) {
            in_flight.remove(&key);
        }

        result
    }

    /// Store `page` under `key`, replacing whatever was there.
    pub async fn insert(&self, key: CacheKey, page: NotificationPage) -> Arc<NotificationPage> {
        let page = Arc::new(page);
        self.entries.lock().await.insert(
            key,
            Entry {
                page: page.clone(),
                fetched_at: Instant::now(),
            },
        );
        page
    }

    /// Drop every cached page of `channel`. Returns how many were dropped.
    pub async fn invalidate_channel(&self, channel: Channel) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| key.channel != channel);
        let count = before - entries.len();
        debug!(%channel, count, "invalidated cached pages");
        count
    }

    pub async fn invalidate_all(&self) -> usize {
        let mut count = 0;
        for channel in Channel::ALL {
            count += self.invalidate_channel(channel).await;
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn record_hit(&self, key: &CacheKey) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(channel = %key.channel, page = key.page, size = key.size, "cache hit");
    }
}
