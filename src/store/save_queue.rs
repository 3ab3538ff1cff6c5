//! Background writer that mirrors store snapshots into the key-value store.
//!
//! Writes are applied one at a time in the order they were enqueued, so the
//! last snapshot enqueued for a key is the one that ends up on disk. Each
//! enqueue hands back a [`SaveTicket`] that resolves once the write has
//! succeeded or exhausted its retries; callers that do not care drop it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::db::KeyValueStore;

/// How persistently a failed write is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("saving '{key}' failed after {attempts} attempt(s): {message}")]
    Failed {
        key: String,
        attempts: u32,
        message: String,
    },

    #[error("save queue is not running")]
    Closed,
}

struct SaveJob {
    key: String,
    value: String,
    done: oneshot::Sender<Result<(), SaveError>>,
}

/// Completion handle for one enqueued write.
#[derive(Debug)]
pub struct SaveTicket {
    key: String,
    rx: oneshot::Receiver<Result<(), SaveError>>,
}

impl SaveTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn wait(self) -> Result<(), SaveError> {
        self.rx.await.unwrap_or(Err(SaveError::Closed))
    }
}

#[derive(Debug, Clone)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<SaveJob>,
}

impl SaveQueue {
    /// Start the writer task on the current tokio runtime.
    pub fn spawn(kv: Arc<dyn KeyValueStore>, policy: RetryPolicy) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(kv, policy, rx));
        (Self { tx }, handle)
    }

    /// A queue with no writer. Every ticket resolves to [`SaveError::Closed`].
    ///
    /// Used for purely in-memory stores.
    pub fn disconnected() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn enqueue(&self, key: &str, value: String) -> SaveTicket {
        let (done, rx) = oneshot::channel();
        let job = SaveJob {
            key: key.to_string(),
            value,
            done,
        };
        if self.tx.send(job).is_err() {
            tracing::debug!(key, "save queue closed, dropping write");
        }
        SaveTicket {
            key: key.to_string(),
            rx,
        }
    }
}

async fn run_worker(
    kv: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
    mut rx: mpsc::UnboundedReceiver<SaveJob>,
) {
    while let Some(SaveJob { key, value, done }) = rx.recv().await {
        let result = write_with_retry(&kv, &policy, &key, value).await;
        let _ = done.send(result);
    }
    tracing::debug!("Save queue drained, writer stopping");
}

async fn write_with_retry(
    kv: &Arc<dyn KeyValueStore>,
    policy: &RetryPolicy,
    key: &str,
    value: String,
) -> Result<(), SaveError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;
        let store = kv.clone();
        let k = key.to_string();
        let v = value.clone();
        let outcome = tokio::task::spawn_blocking(move || store.set(&k, &v))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r);

        match outcome {
            Ok(()) => {
                tracing::debug!(key, attempt, bytes = value.len(), "Saved");
                return Ok(());
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(key, attempt, "Save failed, retrying in {:?}: {}", backoff, e);
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                tracing::error!(key, attempt, "Save failed, giving up: {}", e);
                return Err(SaveError::Failed {
                    key: key.to_string(),
                    attempts: attempt,
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` writes, then delegates to an in-memory db.
    struct Flaky {
        inner: Database,
        failures: AtomicU32,
    }

    impl KeyValueStore for Flaky {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                anyhow::bail!("disk full");
            }
            self.inner.set(key, value)
        }
    }

    fn memory_db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn writes_land_in_order() {
        let db = memory_db();
        let (queue, _worker) = SaveQueue::spawn(Arc::new(db.clone()), RetryPolicy::default());

        queue.enqueue("coins", "1".to_string());
        let last = queue.enqueue("coins", "2".to_string());
        last.wait().await.unwrap();

        assert_eq!(db.get("coins").unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let db = memory_db();
        let flaky = Flaky {
            inner: db.clone(),
            failures: AtomicU32::new(2),
        };
        let (queue, _worker) = SaveQueue::spawn(Arc::new(flaky), fast_policy(3));

        queue
            .enqueue("tasks", "[]".to_string())
            .wait()
            .await
            .unwrap();

        assert_eq!(db.get("tasks").unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn persistent_failure_is_reported() {
        let flaky = Flaky {
            inner: memory_db(),
            failures: AtomicU32::new(10),
        };
        let (queue, _worker) = SaveQueue::spawn(Arc::new(flaky), fast_policy(2));

        let err = queue
            .enqueue("animals", "[]".to_string())
            .wait()
            .await
            .unwrap_err();

        assert!(matches!(err, SaveError::Failed { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn disconnected_queue_resolves_closed() {
        let queue = SaveQueue::disconnected();
        let ticket = queue.enqueue("coins", "5".to_string());
        assert_eq!(ticket.key(), "coins");
        assert_eq!(ticket.wait().await, Err(SaveError::Closed));
    }
}
