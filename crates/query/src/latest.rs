//! Supersede-and-cancel slot for requests where only the newest matters.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Runs at most one live request at a time.
///
/// Starting a request cancels the one before it. A request that finishes
/// after being superseded yields `None`, so its result is never applied.
#[derive(Debug, Default)]
pub struct LatestSlot {
    seq: AtomicU64,
    current: Mutex<Option<(u64, CancellationToken)>>,
}

impl LatestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F: Future>(&self, request: F) -> Option<F::Output> {
        let id = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some((previous, old)) = self.slot().replace((id, token.clone())) {
            tracing::debug!(superseded = previous, by = id, "Cancelling superseded request");
            old.cancel();
        }

        let output = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = request => Some(out),
        };

        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|(current, _)| *current == id) {
            *slot = None;
        }
        drop(slot);

        if token.is_cancelled() {
            None
        } else {
            output
        }
    }

    /// Cancel whatever request is live.
    pub fn cancel(&self) {
        if let Some((_, token)) = self.slot().take() {
            token.cancel();
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn newer_request_supersedes_older() {
        let slot = Arc::new(LatestSlot::new());

        let first = {
            let slot = slot.clone();
            tokio::spawn(async move {
                slot.run(async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "first"
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = slot
            .run(async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                "second"
            })
            .await;

        assert_eq!(second, Some("second"));
        assert_eq!(first.await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_live_request() {
        let slot = Arc::new(LatestSlot::new());
        let pending = {
            let slot = slot.clone();
            tokio::spawn(async move {
                slot.run(tokio::time::sleep(Duration::from_secs(5))).await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        slot.cancel();
        assert_eq!(pending.await.unwrap(), None);
    }
}
