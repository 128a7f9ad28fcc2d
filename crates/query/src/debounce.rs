//! Trailing-edge debouncing of rapidly changing values.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Default quiet period before a value is considered settled.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Emits a value once no newer value has arrived for the quiet period.
///
/// Only the last value of a burst is emitted. Dropping the debouncer stops
/// its task; a pending value is discarded.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn a debouncer; settled values arrive on the returned receiver.
    pub fn spawn(quiet: Duration, cancel: CancellationToken) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, mut incoming) = mpsc::unbounded_channel::<T>();
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            loop {
                let mut latest = tokio::select! {
                    _ = task_cancel.cancelled() => return,
                    next = incoming.recv() => match next {
                        Some(value) => value,
                        None => return,
                    },
                };
                loop {
                    tokio::select! {
                        _ = task_cancel.cancelled() => return,
                        _ = tokio::time::sleep(quiet) => break,
                        next = incoming.recv() => match next {
                            Some(value) => latest = value,
                            // Input closed mid-burst: the last value still settles.
                            None => break,
                        },
                    }
                }
                if settled_tx.send(latest).is_err() {
                    return;
                }
            }
        });

        (
            Self { input, cancel },
            settled_rx,
        )
    }

    /// Feed a new value, restarting the quiet period.
    pub fn push(&self, value: T) {
        // Only fails once the task is gone, which drop or cancel caused.
        let _ = self.input.send(value);
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_settles_to_last_value() {
        let (debouncer, mut settled) = Debouncer::spawn(DEFAULT_DEBOUNCE, CancellationToken::new());
        debouncer.push("m".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("mu".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("mun".to_string());

        assert_eq!(settled.recv().await.as_deref(), Some("mun"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(settled.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_emit_separately() {
        let (debouncer, mut settled) = Debouncer::spawn(DEFAULT_DEBOUNCE, CancellationToken::new());
        debouncer.push(1);
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.push(2);
        assert_eq!(settled.recv().await, Some(1));
        assert_eq!(settled.recv().await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_value() {
        let token = CancellationToken::new();
        let (debouncer, mut settled) = Debouncer::spawn(DEFAULT_DEBOUNCE, token.clone());
        debouncer.push(1);
        token.cancel();
        assert_eq!(settled.recv().await, None);
    }
}
