//! Keyed query cache with request de-duplication, stale-while-revalidate
//! and invalidation broadcast.
//!
//! Entries nobody is subscribed to are evicted once they have been idle for
//! [`QueryConfig::cache_time`].
//!
//! Values are stored type-erased behind `Arc`; callers recover the concrete
//! type through the generic accessors. Every fetch runs as a spawned,
//! shared future so that it completes (and lands in the cache) even if the
//! caller that started it goes away.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::QueryError;
use crate::key::{Invalidation, QueryKey};

/// Broadcast channel capacity for cache events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

type AnyData = Arc<dyn Any + Send + Sync>;
type FetchResult = Result<AnyData, QueryError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Cache-wide policy, set once at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long fetched data counts as fresh. Zero means always stale.
    pub stale_time: Duration,
    /// Extra attempts after a failed fetch before the error is surfaced.
    pub retry: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// How long an entry with no subscribers and no fetch in flight is kept.
    pub cache_time: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retry: 1,
            retry_delay: Duration::from_secs(1),
            cache_time: Duration::from_secs(300),
        }
    }
}

/// Events broadcast to mounted subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Matching entries were marked stale and should be refetched.
    Invalidated(Invalidation),
    /// A fetch for this key completed (successfully or not).
    Updated(QueryKey),
}

/// Snapshot of one entry as seen by a subscriber.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    /// Error of the most recent fetch; previous data is kept alongside it.
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    pub updated_at: Option<Instant>,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_fetching: false,
            updated_at: None,
        }
    }
}

struct Entry {
    data: Option<AnyData>,
    error: Option<QueryError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    /// Bumped by every invalidation. A fetch started under an older
    /// generation cannot clear the invalidated flag.
    generation: u64,
    in_flight: Option<(u64, SharedFetch)>,
    /// Mounted subscriptions on this key.
    subscribers: usize,
    /// Last fetch, completion or unsubscribe.
    touched_at: Instant,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            generation: 0,
            in_flight: None,
            subscribers: 0,
            touched_at: Instant::now(),
        }
    }
}

/// Outcome of a cache lookup.
pub(crate) enum Lookup {
    /// Cached data; a revalidation may have been started behind it.
    Hit(AnyData),
    /// Nothing cached; the fetch has already been started.
    Miss(SharedFetch),
}

impl Entry {
    fn is_stale(&self, stale_time: Duration) -> bool {
        self.invalidated
            || self
                .updated_at
                .is_none_or(|at| at.elapsed() >= stale_time)
    }

    fn is_idle(&self, cache_time: Duration) -> bool {
        self.subscribers == 0
            && self.in_flight.is_none()
            && self.touched_at.elapsed() >= cache_time
    }
}

struct Inner {
    config: QueryConfig,
    entries: Mutex<HashMap<QueryKey, Entry>>,
    events: broadcast::Sender<CacheEvent>,
    cancel: CancellationToken,
}

/// Shared handle to the cache. Clones are cheap and see the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: QueryConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                entries: Mutex::new(HashMap::new()),
                events,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> QueryConfig {
        self.inner.config
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Root token; every subscription task runs under a child of it.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Stop every subscription created from this cache.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Return cached data, or fetch it.
    ///
    /// Cached data is returned immediately; if it is stale a background
    /// revalidation is started. Without cached data the fetch is awaited,
    /// joining any identical fetch already in flight.
    pub async fn fetch<T, E, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        match self.lookup(key, Arc::new(fetcher)) {
            Lookup::Hit(data) => downcast(key, data),
            Lookup::Miss(fetch) => downcast(key, fetch.await?),
        }
    }

    /// Cached data without fetching.
    pub fn get<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let data = self.lock().get(key).and_then(|e| e.data.clone())?;
        data.downcast::<T>().ok()
    }

    /// Current state of an entry.
    pub fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let entries = self.lock();
        let Some(entry) = entries.get(key) else {
            return QueryState::default();
        };
        QueryState {
            data: entry.data.clone().and_then(|d| d.downcast::<T>().ok()),
            error: entry.error.clone(),
            is_fetching: entry.in_flight.is_some(),
            updated_at: entry.updated_at,
        }
    }

    /// Mark one entry stale and notify subscribers. Does not wait for the
    /// refetch.
    pub fn invalidate(&self, key: &QueryKey) {
        self.invalidate_matching(Invalidation::Key(key.clone()));
    }

    /// Mark every entry of an operation stale and notify subscribers.
    pub fn invalidate_operation(&self, operation: &str) {
        self.invalidate_matching(Invalidation::Operation(operation.to_string()));
    }

    /// Drop every idle entry; returns how many were evicted.
    pub fn collect_garbage(&self) -> usize {
        let cache_time = self.inner.config.cache_time;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_idle(cache_time));
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = entries.len(), "Evicted idle queries");
        }
        evicted
    }

    /// Number of keys currently held.
    pub fn entry_count(&self) -> usize {
        self.lock().len()
    }

    /// Register a mounted subscription; its entry is never evicted.
    pub(crate) fn subscribe_key(&self, key: &QueryKey) {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_default();
        entry.subscribers += 1;
        entry.touched_at = Instant::now();
    }

    /// Unregister a subscription. The last one out schedules a collection
    /// once the entry has had `cache_time` to go idle.
    pub(crate) fn unsubscribe_key(&self, key: &QueryKey) {
        let unused = {
            let mut entries = self.lock();
            match entries.get_mut(key) {
                Some(entry) => {
                    entry.subscribers = entry.subscribers.saturating_sub(1);
                    entry.touched_at = Instant::now();
                    entry.subscribers == 0
                }
                None => false,
            }
        };
        if !unused {
            return;
        }
        // Outside a runtime the next fetch sweeps instead.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let cache = self.clone();
        let delay = self.inner.config.cache_time;
        handle.spawn(async move {
            tokio::select! {
                _ = cache.inner.cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    cache.collect_garbage();
                }
            }
        });
    }

    fn invalidate_matching(&self, invalidation: Invalidation) {
        let mut count = 0usize;
        {
            let mut entries = self.lock();
            for (key, entry) in entries.iter_mut() {
                if invalidation.matches(key) {
                    entry.invalidated = true;
                    entry.generation += 1;
                    count += 1;
                }
            }
        }
        tracing::debug!(?invalidation, entries = count, "Invalidated queries");
        // No receivers simply means nothing is mounted.
        let _ = self.inner.events.send(CacheEvent::Invalidated(invalidation));
    }

    // ---- private helpers ----

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached data for `key`, or the already-started fetch for it.
    ///
    /// Stale data starts a background revalidation before returning.
    pub(crate) fn lookup<T, E, F, Fut>(&self, key: &QueryKey, fetcher: Arc<F>) -> Lookup
    where
        T: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let cached = {
            let mut entries = self.lock();
            entries.get_mut(key).and_then(|entry| {
                entry.touched_at = Instant::now();
                entry
                    .data
                    .clone()
                    .map(|data| (data, entry.is_stale(self.inner.config.stale_time)))
            })
        };
        match cached {
            Some((data, stale)) => {
                if stale {
                    tracing::debug!(key = %key, "Revalidating stale query in background");
                    let _ = self.start_fetch(key, fetcher);
                }
                Lookup::Hit(data)
            }
            None => Lookup::Miss(self.start_fetch(key, fetcher)),
        }
    }

    /// Join the current in-flight fetch for `key` or start a new one.
    ///
    /// The entry is marked fetching before this returns, even though the
    /// returned future has not been polled yet.
    pub(crate) fn start_fetch<T, E, F, Fut>(&self, key: &QueryKey, fetcher: Arc<F>) -> SharedFetch
    where
        T: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let cache_time = self.inner.config.cache_time;
        let mut entries = self.lock();
        entries.retain(|_, entry| !entry.is_idle(cache_time));
        let entry = entries.entry(key.clone()).or_default();
        entry.touched_at = Instant::now();
        if let Some((generation, fetch)) = &entry.in_flight {
            if *generation == entry.generation {
                return fetch.clone();
            }
        }

        let generation = entry.generation;
        let config = self.inner.config;
        let cache = self.clone();
        let owned_key = key.clone();
        let fetch = async move {
            let result = run_with_retry(&owned_key, fetcher.as_ref(), config).await;
            cache.complete(&owned_key, generation, &result);
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some((generation, fetch.clone()));
        drop(entries);

        tokio::spawn(fetch.clone());
        fetch
    }

    fn complete(&self, key: &QueryKey, generation: u64, result: &FetchResult) {
        {
            let mut entries = self.lock();
            let entry = entries.entry(key.clone()).or_default();
            entry.touched_at = Instant::now();
            match result {
                Ok(data) => {
                    entry.data = Some(data.clone());
                    entry.error = None;
                    entry.updated_at = Some(Instant::now());
                    if entry.generation == generation {
                        entry.invalidated = false;
                    }
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Query failed; keeping previous data");
                    entry.error = Some(err.clone());
                }
            }
            if entry
                .in_flight
                .as_ref()
                .is_some_and(|(g, _)| *g == generation)
            {
                entry.in_flight = None;
            }
        }
        let _ = self.inner.events.send(CacheEvent::Updated(key.clone()));
    }
}

async fn run_with_retry<T, E, F, Fut>(key: &QueryKey, fetcher: &F, config: QueryConfig) -> FetchResult
where
    T: Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(Arc::new(value) as AnyData),
            Err(e) if attempt < config.retry => {
                attempt += 1;
                tracing::debug!(key = %key, attempt, error = %e, "Query attempt failed; retrying");
                tokio::time::sleep(config.retry_delay).await;
            }
            Err(e) => return Err(QueryError::fetch(e)),
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: AnyData) -> Result<Arc<T>, QueryError> {
    data.downcast::<T>()
        .map_err(|_| QueryError::TypeMismatch(key.clone()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("backend down")]
    struct Down;

    fn counting(calls: Arc<AtomicUsize>) -> impl Fn() -> BoxFuture<'static, Result<u32, Down>> + Send + Sync + 'static {
        move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(n)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_call() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::bare("stats");

        let (a, b) = tokio::join!(
            cache.fetch(&key, counting(calls.clone())),
            cache.fetch(&key, counting(calls.clone())),
        );
        assert_eq!(*a.unwrap(), 0);
        assert_eq!(*b.unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_data_is_served_then_revalidated() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::bare("stats");

        assert_eq!(*cache.fetch(&key, counting(calls.clone())).await.unwrap(), 0);
        // stale_time is zero: cached value now, revalidation behind it
        assert_eq!(*cache.fetch(&key, counting(calls.clone())).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*cache.get::<u32>(&key).unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_data_is_not_refetched() {
        let cache = QueryCache::new(QueryConfig {
            stale_time: Duration::from_secs(60),
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::bare("stats");

        cache.fetch(&key, counting(calls.clone())).await.unwrap();
        cache.fetch(&key, counting(calls.clone())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate(&key);
        cache.fetch(&key, counting(calls.clone())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_retried_once_then_surfaced() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::bare("inbox");
        let counter = calls.clone();
        let result = cache
            .fetch(&key, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(Down) }
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(err.downcast_ref::<Down>().is_some());
        assert_eq!(err.to_string(), "backend down");
    }

    #[tokio::test(start_paused = true)]
    async fn error_keeps_previous_data() {
        let cache = QueryCache::new(QueryConfig {
            retry: 0,
            ..Default::default()
        });
        let key = QueryKey::bare("inbox");
        cache
            .fetch(&key, || async { Ok::<_, Down>(7u32) })
            .await
            .unwrap();
        let result = cache
            .start_fetch(&key, Arc::new(|| async { Err::<u32, _>(Down) }))
            .await;
        assert!(result.is_err());

        let state = cache.snapshot::<u32>(&key);
        assert_eq!(state.data.as_deref(), Some(&7));
        assert!(state.error.is_some());
        assert!(!state.is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_entries_are_evicted_after_cache_time() {
        let cache = QueryCache::new(QueryConfig {
            cache_time: Duration::from_secs(60),
            ..Default::default()
        });
        for page in 0..50u32 {
            let key = QueryKey::new("catalogs.data", &serde_json::json!({ "page": page }));
            cache
                .fetch(&key, || async { Ok::<_, Down>(1u32) })
                .await
                .unwrap();
        }
        assert_eq!(cache.entry_count(), 50);
        assert_eq!(cache.collect_garbage(), 0);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(cache.collect_garbage(), 50);
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn new_fetch_sweeps_idle_entries() {
        let cache = QueryCache::new(QueryConfig {
            cache_time: Duration::from_secs(1),
            ..Default::default()
        });
        for page in 0..10u32 {
            let key = QueryKey::new("assignments.pending", &page);
            cache
                .fetch(&key, move || async move { Ok::<_, Down>(page) })
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        let key = QueryKey::new("assignments.pending", &10u32);
        cache
            .fetch(&key, || async { Ok::<_, Down>(10u32) })
            .await
            .unwrap();
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(*cache.get::<u32>(&key).unwrap(), 10);
    }

    #[tokio::test]
    async fn invalidation_is_broadcast() {
        let cache = QueryCache::default();
        let mut events = cache.subscribe_events();
        cache.invalidate_operation("assignments.pending");
        assert_eq!(
            events.recv().await.unwrap(),
            CacheEvent::Invalidated(Invalidation::Operation("assignments.pending".into()))
        );
    }

    #[tokio::test]
    async fn type_mismatch_is_reported() {
        let cache = QueryCache::default();
        let key = QueryKey::bare("stats");
        cache
            .fetch(&key, || async { Ok::<_, Down>(1u32) })
            .await
            .unwrap();
        let err = cache
            .fetch(&key, || async { Ok::<_, Down>(String::new()) })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::TypeMismatch(_)));
    }
}
