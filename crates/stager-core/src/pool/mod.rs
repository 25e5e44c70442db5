//! Fixed set of dispatch workers fed from a bounded queue.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use stager_model::CompletedTask;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio_util::task::TaskTracker;
use tracing::trace;

use crate::dispatch::Dispatcher;

#[derive(Debug, Error)]
#[error("worker pool is closed")]
pub struct PoolClosed;

/// Bounded dispatch pool.
///
/// `submit` waits for queue space, which is the backpressure applied to the subscription.
/// `drain` closes the queue and returns once every queued and running dispatch finished.
pub struct WorkerPool {
    tx: mpsc::Sender<CompletedTask>,
    tracker: TaskTracker,
    pending: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn spawn(workers: usize, capacity: usize, dispatcher: Dispatcher) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let pending = Arc::new(AtomicUsize::new(0));
        let tracker = TaskTracker::new();

        for worker in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let pending = Arc::clone(&pending);
            let dispatcher = dispatcher.clone();

            tracker.spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(task) = next else { break };

                    dispatcher.handle(task).await;
                    pending.fetch_sub(1, Ordering::SeqCst);
                }
                trace!(target: "stager.pool", worker, "worker stopped");
            });
        }
        tracker.close();

        Self {
            tx,
            tracker,
            pending,
        }
    }

    pub async fn submit(&self, task: CompletedTask) -> Result<(), PoolClosed> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(task).await.is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(PoolClosed);
        }
        Ok(())
    }

    /// Queued plus running dispatches.
    pub fn in_flight(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub async fn drain(self) {
        let Self { tx, tracker, .. } = self;
        drop(tx);
        tracker.wait().await;
    }
}
