//! Long-lived subscription to the fleet's completed-task stream.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    dispatch::Dispatcher,
    pool::{PoolClosed, WorkerPool},
    ports::{CompletionWatch, FleetCoordinator},
};

pub const DEFAULT_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Pause between a failed subscription and the next one.
    pub resubscribe_delay: Duration,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            resubscribe_delay: DEFAULT_RESUBSCRIBE_DELAY,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    PoolClosed(#[from] PoolClosed),
}

enum Step {
    Resubscribe,
    Shutdown,
}

/// Feeds completed tasks into a dispatch pool until shut down.
pub struct CompletionWatcher {
    coordinator: Arc<dyn FleetCoordinator>,
    dispatcher: Dispatcher,
    config: WatcherConfig,
}

impl CompletionWatcher {
    pub fn new(
        coordinator: Arc<dyn FleetCoordinator>,
        dispatcher: Dispatcher,
        config: WatcherConfig,
    ) -> Self {
        Self {
            coordinator,
            dispatcher,
            config,
        }
    }

    /// Run until `shutdown` fires, then wait for every accepted dispatch to finish.
    ///
    /// Stream failures are logged and followed by a resubscription; they never end the loop.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), WatchError> {
        let pool = WorkerPool::spawn(
            self.config.workers,
            self.config.queue_capacity,
            self.dispatcher.clone(),
        );
        info!(
            workers = self.config.workers,
            queue = self.config.queue_capacity,
            "completion watcher started"
        );

        let res = self.watch(&pool, &shutdown).await;

        debug!(in_flight = pool.in_flight(), "draining dispatches");
        pool.drain().await;
        info!("completion watcher stopped");
        res
    }

    async fn watch(&self, pool: &WorkerPool, shutdown: &CancellationToken) -> Result<(), WatchError> {
        loop {
            let mut sub = self.coordinator.watch_completed_tasks().await;
            debug!("subscribed to completed tasks");

            let step = self.pump(&mut sub, pool, shutdown).await;
            sub.stop.cancel();
            drop(sub);

            match step? {
                Step::Shutdown => return Ok(()),
                Step::Resubscribe => {
                    tokio::select! {
                        _ = shutdown.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(self.config.resubscribe_delay) => {}
                    }
                    debug!(delay = ?self.config.resubscribe_delay, "resubscribing");
                }
            }
        }
    }

    async fn pump(
        &self,
        sub: &mut CompletionWatch,
        pool: &WorkerPool,
        shutdown: &CancellationToken,
    ) -> Result<Step, WatchError> {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => return Ok(Step::Shutdown),

                next = sub.tasks.recv() => {
                    let Some(task) = next else {
                        match sub.errors.try_recv() {
                            Ok(e) => error!(error = %e, "completion stream failed"),
                            Err(_) => warn!("completion stream closed"),
                        }
                        return Ok(Step::Resubscribe);
                    };
                    let guid = task.task_guid.clone();
                    trace!(%guid, domain = %task.domain, "completed task received");

                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => {
                            debug!(%guid, "shutdown while queue full, task not accepted");
                            return Ok(Step::Shutdown);
                        }
                        res = pool.submit(task) => res?,
                    }
                }

                err = sub.errors.recv() => {
                    match err {
                        Some(e) => error!(error = %e, "completion stream failed"),
                        None => warn!("completion error stream closed"),
                    }
                    return Ok(Step::Resubscribe);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::time::Instant;

    use crate::{
        BackendRouter, BuildpackBackend, MemoryCoordinator,
        ports::{ControlPlaneClient, DeliveryError},
        testing::{RecordingClient, RecordingMetrics},
    };
    use stager_model::{BUILDPACK_TASK_DOMAIN, LogConfig, TaskEnvelope, TaskGuid, TaskState};

    struct SlowClient {
        inner: RecordingClient,
        delay: Duration,
    }

    #[async_trait]
    impl ControlPlaneClient for SlowClient {
        async fn deliver(&self, guid: &TaskGuid, payload: Vec<u8>) -> Result<(), DeliveryError> {
            tokio::time::sleep(self.delay).await;
            self.inner.deliver(guid, payload).await
        }
    }

    struct Fixture {
        coordinator: Arc<MemoryCoordinator>,
        client: Arc<SlowClient>,
        metrics: Arc<RecordingMetrics>,
        shutdown: CancellationToken,
        handle: tokio::task::JoinHandle<Result<(), WatchError>>,
    }

    fn start(delivery_delay: Duration) -> Fixture {
        start_with(
            delivery_delay,
            WatcherConfig {
                workers: 4,
                queue_capacity: 8,
                ..WatcherConfig::default()
            },
        )
    }

    fn start_with(delivery_delay: Duration, config: WatcherConfig) -> Fixture {
        let coordinator = Arc::new(MemoryCoordinator::new());
        let client = Arc::new(SlowClient {
            inner: RecordingClient::new(),
            delay: delivery_delay,
        });
        let metrics = Arc::new(RecordingMetrics::new());
        let router = BackendRouter::new()
            .with(Arc::new(BuildpackBackend::default()))
            .unwrap();
        let dispatcher = Dispatcher::new(coordinator.clone(), client.clone(), Arc::new(router))
            .with_metrics(metrics.clone());

        let watcher = CompletionWatcher::new(coordinator.clone(), dispatcher, config);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(watcher.run(shutdown.clone()));

        Fixture {
            coordinator,
            client,
            metrics,
            shutdown,
            handle,
        }
    }

    async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
        for _ in 0..2_000 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {what}");
    }

    async fn complete(c: &MemoryCoordinator, guid: &str) -> TaskGuid {
        let guid = TaskGuid::from(guid);
        c.submit_task(TaskEnvelope {
            guid: guid.clone(),
            domain: BUILDPACK_TASK_DOMAIN.into(),
            stack: "cflinuxfs4".into(),
            reply_to: None,
            memory_mb: 0,
            disk_mb: 0,
            file_descriptors: 0,
            actions: Vec::new(),
            log: LogConfig {
                guid: "app".into(),
                source_name: "STG".into(),
            },
            annotation: r#"{"lifecycle":"buildpack","app_id":"app","task_id":"t"}"#.into(),
        })
        .await
        .unwrap();
        c.start_task(&guid).unwrap();
        c.succeed_task(&guid, r#"{"buildpack_key":"bp1"}"#).unwrap();
        guid
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_streamed_tasks() {
        let f = start(Duration::ZERO);
        eventually("subscription", || f.coordinator.watcher_count() == 1).await;

        let a = complete(&f.coordinator, "a").await;
        let b = complete(&f.coordinator, "b").await;
        eventually("resolution", || {
            f.coordinator.list_by_state(TaskState::Resolved) == vec![a.clone(), b.clone()]
        })
        .await;
        assert_eq!(f.metrics.succeeded_count(), 2);

        f.shutdown.cancel();
        f.handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribes_after_stream_error() {
        let f = start(Duration::ZERO);
        eventually("subscription", || f.coordinator.watcher_count() == 1).await;

        let interrupted = Instant::now();
        f.coordinator.interrupt_watches("connection reset");
        assert_eq!(f.coordinator.watcher_count(), 0);

        eventually("resubscription", || f.coordinator.watcher_count() == 1).await;
        assert!(interrupted.elapsed() >= DEFAULT_RESUBSCRIBE_DELAY);

        let guid = complete(&f.coordinator, "after").await;
        eventually("resolution", || {
            f.coordinator.state(&guid) == Some(TaskState::Resolved)
        })
        .await;
        assert!(!f.handle.is_finished());

        f.shutdown.cancel();
        f.handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_deliveries_resolve_once() {
        let f = start(Duration::ZERO);
        eventually("subscription", || f.coordinator.watcher_count() == 1).await;

        let guid = complete(&f.coordinator, "dup").await;
        f.coordinator.redeliver(&guid).unwrap();
        f.coordinator.redeliver(&guid).unwrap();

        eventually("resolution", || {
            f.coordinator.state(&guid) == Some(TaskState::Resolved)
        })
        .await;
        f.shutdown.cancel();
        f.handle.await.unwrap().unwrap();

        assert_eq!(f.client.inner.call_count(), 1);
        assert_eq!(f.metrics.failed_to_resolve_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_in_flight_dispatch() {
        let f = start(Duration::from_secs(30));
        eventually("subscription", || f.coordinator.watcher_count() == 1).await;

        let guid = complete(&f.coordinator, "slow").await;
        eventually("claim", || {
            f.coordinator.state(&guid) == Some(TaskState::Resolving)
        })
        .await;

        f.shutdown.cancel();
        f.handle.await.unwrap().unwrap();

        assert_eq!(f.client.inner.call_count(), 1);
        assert_eq!(f.coordinator.state(&guid), Some(TaskState::Resolved));
        assert_eq!(f.coordinator.watcher_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_rejects_task_waiting_for_queue_space() {
        let f = start_with(
            Duration::from_secs(30),
            WatcherConfig {
                workers: 1,
                queue_capacity: 1,
                ..WatcherConfig::default()
            },
        );
        eventually("subscription", || f.coordinator.watcher_count() == 1).await;

        let running = complete(&f.coordinator, "running").await;
        eventually("claim", || {
            f.coordinator.state(&running) == Some(TaskState::Resolving)
        })
        .await;
        let queued = complete(&f.coordinator, "queued").await;
        let blocked = complete(&f.coordinator, "blocked").await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        f.shutdown.cancel();
        f.handle.await.unwrap().unwrap();

        assert_eq!(f.coordinator.state(&running), Some(TaskState::Resolved));
        assert_eq!(f.coordinator.state(&queued), Some(TaskState::Resolved));
        assert_eq!(f.coordinator.state(&blocked), Some(TaskState::Completed));
        assert_eq!(f.client.inner.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_backoff_returns_promptly() {
        let f = start(Duration::ZERO);
        eventually("subscription", || f.coordinator.watcher_count() == 1).await;

        f.coordinator.interrupt_watches("gone");
        tokio::time::sleep(Duration::from_millis(100)).await;
        let cancelled = Instant::now();
        f.shutdown.cancel();
        f.handle.await.unwrap().unwrap();

        assert!(cancelled.elapsed() < DEFAULT_RESUBSCRIBE_DELAY);
        assert_eq!(f.coordinator.watcher_count(), 0);
    }
}
