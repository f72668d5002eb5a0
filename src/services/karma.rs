/// Background karma propagation.
///
/// Vote deltas owe the content's author a matching reputation change,
/// but karma is a soft signal: it must never block or fail a vote.
/// Adjustments go through a bounded queue drained by a fixed pool of
/// worker tasks. A full queue drops the adjustment with a warning;
/// worker-side store failures are logged and dropped, never retried
/// and never propagated.
use crate::metrics::VoteMetrics;
use crate::repository::KarmaStore;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A pending reputation change for a content author.
#[derive(Debug, Clone, Copy)]
pub struct KarmaAdjustment {
    pub author_id: Uuid,
    pub delta: i64,
}

/// Fire-and-forget karma queue with a fixed worker pool.
pub struct KarmaService {
    tx: Mutex<Option<mpsc::Sender<KarmaAdjustment>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    metrics: VoteMetrics,
}

impl KarmaService {
    /// Spawn `workers` tasks draining a queue of `capacity` entries.
    pub fn spawn(
        store: Arc<dyn KarmaStore>,
        capacity: usize,
        workers: usize,
        metrics: VoteMetrics,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<KarmaAdjustment>(capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let store = Arc::clone(&store);
                let metrics = metrics.clone();
                tokio::spawn(async move {
                    loop {
                        // Hold the receiver lock only while waiting for
                        // the next item; the store write runs unlocked
                        // so workers apply adjustments in parallel.
                        let adjustment = { rx.lock().await.recv().await };
                        let Some(adjustment) = adjustment else {
                            debug!(worker_id, "Karma worker stopped (queue closed)");
                            break;
                        };

                        match store.adjust(adjustment.author_id, adjustment.delta).await {
                            Ok(()) => {
                                metrics.karma_applied.inc();
                                debug!(
                                    author_id = %adjustment.author_id,
                                    delta = adjustment.delta,
                                    "Applied karma adjustment"
                                );
                            }
                            Err(e) => {
                                metrics.karma_dropped.inc();
                                error!(
                                    author_id = %adjustment.author_id,
                                    delta = adjustment.delta,
                                    "Failed to apply karma adjustment, dropping: {}",
                                    e
                                );
                            }
                        }
                    }
                })
            })
            .collect();

        Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
            metrics,
        }
    }

    /// Enqueue an adjustment without blocking. Returns false if the
    /// adjustment was dropped (full or closed queue).
    pub fn submit(&self, adjustment: KarmaAdjustment) -> bool {
        let tx = self.tx.lock().expect("karma sender lock poisoned");
        let Some(tx) = tx.as_ref() else {
            warn!(
                author_id = %adjustment.author_id,
                "Karma queue already shut down, dropping adjustment"
            );
            self.metrics.karma_dropped.inc();
            return false;
        };

        match tx.try_send(adjustment) {
            Ok(()) => true,
            Err(e) => {
                self.metrics.karma_dropped.inc();
                warn!(
                    author_id = %adjustment.author_id,
                    delta = adjustment.delta,
                    "Dropping karma adjustment: {}",
                    e
                );
                false
            }
        }
    }

    /// Close the queue and wait for workers to drain what was accepted.
    pub async fn shutdown(&self) {
        drop(self.tx.lock().expect("karma sender lock poisoned").take());

        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.workers.lock().expect("karma worker lock poisoned"),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Karma worker panicked during shutdown: {}", e);
            }
        }
        info!("Karma queue drained and workers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct RecordingKarmaStore {
        applied: Mutex<HashMap<Uuid, i64>>,
        fail: bool,
    }

    impl RecordingKarmaStore {
        fn new(fail: bool) -> Self {
            Self {
                applied: Mutex::new(HashMap::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl KarmaStore for RecordingKarmaStore {
        async fn adjust(&self, author_id: Uuid, delta: i64) -> Result<()> {
            if self.fail {
                anyhow::bail!("store down");
            }
            *self
                .applied
                .lock()
                .unwrap()
                .entry(author_id)
                .or_insert(0) += delta;
            Ok(())
        }
    }

    #[tokio::test]
    async fn adjustments_are_applied_and_summed() {
        let store = Arc::new(RecordingKarmaStore::new(false));
        let service = KarmaService::spawn(store.clone(), 16, 2, VoteMetrics::new("test"));

        let author = Uuid::new_v4();
        assert!(service.submit(KarmaAdjustment {
            author_id: author,
            delta: 1
        }));
        assert!(service.submit(KarmaAdjustment {
            author_id: author,
            delta: -2
        }));
        service.shutdown().await;

        assert_eq!(store.applied.lock().unwrap().get(&author), Some(&-1));
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let store = Arc::new(RecordingKarmaStore::new(true));
        let service = KarmaService::spawn(store.clone(), 16, 1, VoteMetrics::new("test"));

        assert!(service.submit(KarmaAdjustment {
            author_id: Uuid::new_v4(),
            delta: 1
        }));
        // Shutdown must complete cleanly even though every write fails.
        service.shutdown().await;
        assert!(store.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_dropped() {
        let store = Arc::new(RecordingKarmaStore::new(false));
        let service = KarmaService::spawn(store, 16, 1, VoteMetrics::new("test"));
        service.shutdown().await;

        assert!(!service.submit(KarmaAdjustment {
            author_id: Uuid::new_v4(),
            delta: 1
        }));
    }
}
