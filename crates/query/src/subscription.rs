//! Mounted, self-refreshing views over one cache entry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheEvent, Lookup, QueryCache, QueryState};
use crate::key::QueryKey;

/// Why the subscription task woke up.
enum Wake {
    Refetch,
    Publish,
    Ignore,
    Stop,
}

/// A live view of one query.
///
/// Loads on creation, then refetches on every interval tick, on
/// invalidation of its key and on [`refresh`](Self::refresh). The backing
/// task is cancelled on [`stop`](Self::stop) or drop. While it exists the
/// entry is exempt from eviction.
pub struct QuerySubscription<T> {
    cache: QueryCache,
    key: QueryKey,
    state: watch::Receiver<QueryState<T>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<T> std::fmt::Debug for QuerySubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    /// Mount a subscription for `key`.
    ///
    /// `refetch_interval` of `None` disables polling; invalidation and
    /// manual refresh still apply.
    pub fn watch<T, E, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        refetch_interval: Option<Duration>,
    ) -> QuerySubscription<T>
    where
        T: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.subscribe_key(&key);
        let (state_tx, state_rx) = watch::channel(self.snapshot::<T>(&key));
        let refresh = Arc::new(Notify::new());
        let cancel = self.cancellation_token().child_token();

        let task = tokio::spawn(run(
            self.clone(),
            key.clone(),
            Arc::new(fetcher),
            refetch_interval,
            state_tx,
            refresh.clone(),
            cancel.clone(),
        ));

        QuerySubscription {
            cache: self.clone(),
            key,
            state: state_rx,
            refresh,
            cancel,
            task,
        }
    }
}

impl<T> QuerySubscription<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Latest published state.
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// A receiver for callers that want to `select!` on changes.
    pub fn receiver(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }

    /// Wait for the next published state. Returns `None` once stopped.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&QueryState<T>) -> bool,
    ) -> Option<QueryState<T>> {
        let state = self.state.wait_for(&mut predicate).await.ok()?;
        Some(state.clone())
    }

    /// Request an immediate refetch.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.task.is_finished()
    }
}

impl<T> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.cache.unsubscribe_key(&self.key);
    }
}

async fn run<T, E, F, Fut>(
    cache: QueryCache,
    key: QueryKey,
    fetcher: Arc<F>,
    refetch_interval: Option<Duration>,
    state_tx: watch::Sender<QueryState<T>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) where
    T: Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let mut events = cache.subscribe_events();
    let mut ticker = refetch_interval.map(|every| {
        let mut interval = tokio::time::interval_at(Instant::now() + every, every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    tracing::debug!(key = %key, ?refetch_interval, "Query subscription mounted");

    // Initial load: cached data right away, stale data revalidated behind it.
    // Either way the fetch is already running, so the first publish shows it.
    let initial = cache.lookup(&key, fetcher.clone());
    state_tx.send_replace(cache.snapshot(&key));
    if let Lookup::Miss(fetch) = initial {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = fetch => {}
        }
        state_tx.send_replace(cache.snapshot(&key));
    }

    'outer: loop {
        loop {
            let wake = tokio::select! {
                _ = cancel.cancelled() => Wake::Stop,
                _ = refresh.notified() => Wake::Refetch,
                _ = tick(&mut ticker) => Wake::Refetch,
                event = events.recv() => match event {
                    Ok(CacheEvent::Invalidated(inv)) if inv.matches(&key) => Wake::Refetch,
                    Ok(CacheEvent::Updated(updated)) if updated == key => Wake::Publish,
                    Ok(_) => Wake::Ignore,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(key = %key, skipped, "Subscription lagged; refetching");
                        Wake::Refetch
                    }
                    Err(broadcast::error::RecvError::Closed) => Wake::Stop,
                },
            };
            match wake {
                Wake::Stop => break 'outer,
                Wake::Refetch => break,
                Wake::Publish => {
                    state_tx.send_replace(cache.snapshot(&key));
                }
                Wake::Ignore => {}
            }
        }

        let refetch = cache.start_fetch(&key, fetcher.clone());
        state_tx.send_replace(cache.snapshot(&key));
        tokio::select! {
            _ = cancel.cancelled() => break 'outer,
            _ = refetch => {}
        }
        state_tx.send_replace(cache.snapshot(&key));
    }

    tracing::debug!(key = %key, "Query subscription stopped");
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::QueryConfig;

    #[derive(Debug, thiserror::Error)]
    #[error("offline")]
    struct Offline;

    fn counter_fetcher(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<usize, Offline>> + Send + Sync + 'static
    {
        use futures::FutureExt;
        move || {
            let calls = calls.clone();
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loads_on_mount_and_polls() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = cache.watch(
            QueryKey::bare("track"),
            counter_fetcher(calls.clone()),
            Some(Duration::from_secs(30)),
        );

        let state = sub.wait_for(|s| s.data.is_some()).await.unwrap();
        assert_eq!(*state.data.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        let state = sub.wait_for(|s| s.data.as_deref() == Some(&2)).await.unwrap();
        assert!(state.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_triggers_refetch() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("assignments.pending", &serde_json::json!({"page": 0}));
        let mut sub = cache.watch(key, counter_fetcher(calls.clone()), None);
        sub.wait_for(|s| s.data.is_some()).await.unwrap();

        cache.invalidate_operation("assignments.pending");
        sub.wait_for(|s| s.data.as_deref() == Some(&2)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_refetches() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = cache.watch(QueryKey::bare("inbox"), counter_fetcher(calls.clone()), None);
        sub.wait_for(|s| s.data.is_some()).await.unwrap();

        sub.refresh();
        sub.wait_for(|s| s.data.as_deref() == Some(&2)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_polling() {
        let cache = QueryCache::new(QueryConfig {
            retry: 0,
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = cache.watch(
            QueryKey::bare("track"),
            counter_fetcher(calls.clone()),
            Some(Duration::from_secs(1)),
        );
        sub.wait_for(|s| s.data.is_some()).await.unwrap();
        drop(sub);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn mount_publishes_fetching_before_data() {
        use futures::FutureExt;

        let cache = QueryCache::default();
        let mut sub = cache.watch(
            QueryKey::bare("track"),
            || {
                async {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok::<_, Offline>(7usize)
                }
                .boxed()
            },
            None,
        );

        let loading = tokio::time::timeout(Duration::from_millis(500), sub.wait_for(|s| s.is_fetching))
            .await
            .expect("mount load was never published as fetching")
            .unwrap();
        assert!(loading.data.is_none());

        let loaded = sub.wait_for(|s| s.data.is_some()).await.unwrap();
        assert!(!loaded.is_fetching);
    }

    #[tokio::test(start_paused = true)]
    async fn mounted_entry_outlives_cache_time_until_dropped() {
        let cache = QueryCache::new(QueryConfig {
            cache_time: Duration::from_secs(1),
            ..Default::default()
        });
        let key = QueryKey::bare("inbox");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = cache.watch(key.clone(), counter_fetcher(calls), None);
        sub.wait_for(|s| s.data.is_some()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cache.collect_garbage(), 0);
        assert!(cache.get::<usize>(&key).is_some());

        drop(sub);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(cache.get::<usize>(&key).is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_stream() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sub = cache.watch(QueryKey::bare("track"), counter_fetcher(calls), None);
        sub.wait_for(|s| s.data.is_some()).await.unwrap();
        sub.stop();
        // drain anything published before the stop landed
        while sub.changed().await.is_some() {}
        assert!(sub.is_stopped());
    }
}
