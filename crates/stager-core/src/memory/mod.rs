//! In-process fleet coordinator.
//!
//! Keeps the task table in memory and fans completions out to every live subscription.
//! Nothing survives a restart and there is no real fleet behind it, so this is a development
//! and test coordinator. Resolved records are kept only up to a fixed retention.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use stager_model::{CompletedTask, TaskEnvelope, TaskGuid, TaskState, UnixNanos};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::ports::{Clock, CompletionWatch, CoordinatorError, FleetCoordinator, SystemClock};

/// Per-subscription channel capacity.
pub const WATCH_BUFFER: usize = 1024;

/// Resolved records kept before the oldest are forgotten.
pub const DEFAULT_RESOLVED_RETENTION: usize = 1024;

#[derive(Clone)]
pub struct MemoryCoordinator {
    inner: Arc<RwLock<Inner>>,
    clock: Arc<dyn Clock>,
}

struct Inner {
    tasks: HashMap<TaskGuid, TaskRecord>,
    watchers: Vec<Watcher>,
    artifact_servers: Vec<String>,
    resolved: VecDeque<TaskGuid>,
    resolved_retention: usize,
}

struct TaskRecord {
    envelope: TaskEnvelope,
    state: TaskState,
    created_at: UnixNanos,
    completed: Option<CompletedTask>,
}

struct Watcher {
    tasks: mpsc::Sender<CompletedTask>,
    errors: mpsc::Sender<CoordinatorError>,
    stop: CancellationToken,
}

impl Watcher {
    fn is_live(&self) -> bool {
        !self.stop.is_cancelled() && !self.tasks.is_closed()
    }
}

impl Default for MemoryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Coordinator stamping `created_at` from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                tasks: HashMap::new(),
                watchers: Vec::new(),
                artifact_servers: Vec::new(),
                resolved: VecDeque::new(),
                resolved_retention: DEFAULT_RESOLVED_RETENTION,
            })),
            clock,
        }
    }

    /// Keep at most `retention` resolved records; older ones are dropped from the table.
    pub fn with_resolved_retention(self, retention: usize) -> Self {
        self.write().resolved_retention = retention;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_artifact_server(&self, url: impl Into<String>) {
        self.write().artifact_servers.push(url.into());
    }

    /// A worker picked the task up.
    pub fn start_task(&self, guid: &TaskGuid) -> Result<(), CoordinatorError> {
        let mut inner = self.write();
        transition(&mut inner, guid, TaskState::Running)
    }

    /// The task finished successfully with `result` (JSON text of the result descriptor).
    pub fn succeed_task(&self, guid: &TaskGuid, result: impl Into<String>) -> Result<(), CoordinatorError> {
        self.complete(guid, false, String::new(), result.into())
    }

    /// The task failed on the fleet.
    pub fn fail_task(&self, guid: &TaskGuid, reason: impl Into<String>) -> Result<(), CoordinatorError> {
        self.complete(guid, true, reason.into(), String::new())
    }

    fn complete(
        &self,
        guid: &TaskGuid,
        failed: bool,
        failure_reason: String,
        result: String,
    ) -> Result<(), CoordinatorError> {
        let mut inner = self.write();
        transition(&mut inner, guid, TaskState::Completed)?;

        let Some(record) = inner.tasks.get_mut(guid) else {
            return Err(CoordinatorError::NotFound(guid.clone()));
        };
        let completed = CompletedTask {
            task_guid: guid.clone(),
            domain: record.envelope.domain.clone(),
            created_at: record.created_at,
            failed,
            failure_reason,
            result,
            annotation: record.envelope.annotation.clone(),
        };
        record.completed = Some(completed.clone());

        broadcast(&mut inner, completed);
        Ok(())
    }

    /// Emit the completion of `guid` again, as a coordinator does after a lost acknowledgement.
    pub fn redeliver(&self, guid: &TaskGuid) -> Result<(), CoordinatorError> {
        let mut inner = self.write();
        let completed = inner
            .tasks
            .get(guid)
            .ok_or_else(|| CoordinatorError::NotFound(guid.clone()))?
            .completed
            .clone()
            .ok_or_else(|| CoordinatorError::InvalidTransition {
                guid: guid.clone(),
                from: TaskState::Pending,
                to: TaskState::Completed,
            })?;
        broadcast(&mut inner, completed);
        Ok(())
    }

    /// Fail every live subscription with a stream error and drop it.
    pub fn interrupt_watches(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut inner = self.write();
        for w in inner.watchers.drain(..) {
            let _ = w.errors.try_send(CoordinatorError::Stream(reason.clone()));
        }
        debug!(%reason, "completion watches interrupted");
    }

    pub fn state(&self, guid: &TaskGuid) -> Option<TaskState> {
        self.read().tasks.get(guid).map(|r| r.state)
    }

    pub fn envelope(&self, guid: &TaskGuid) -> Option<TaskEnvelope> {
        self.read().tasks.get(guid).map(|r| r.envelope.clone())
    }

    /// Completion record of a finished task.
    pub fn completed(&self, guid: &TaskGuid) -> Option<CompletedTask> {
        self.read().tasks.get(guid).and_then(|r| r.completed.clone())
    }

    pub fn list_by_state(&self, state: TaskState) -> Vec<TaskGuid> {
        let mut out: Vec<_> = self
            .read()
            .tasks
            .iter()
            .filter(|(_, r)| r.state == state)
            .map(|(g, _)| g.clone())
            .collect();
        out.sort();
        out
    }

    /// Subscriptions that are still attached.
    pub fn watcher_count(&self) -> usize {
        let mut inner = self.write();
        inner.watchers.retain(Watcher::is_live);
        inner.watchers.len()
    }
}

fn transition(inner: &mut Inner, guid: &TaskGuid, to: TaskState) -> Result<(), CoordinatorError> {
    let record = inner
        .tasks
        .get_mut(guid)
        .ok_or_else(|| CoordinatorError::NotFound(guid.clone()))?;

    let from = record.state;
    record.state = from
        .transition(to)
        .map_err(|_| CoordinatorError::InvalidTransition {
            guid: guid.clone(),
            from,
            to,
        })?;
    trace!(%guid, state = %to, "task transitioned");
    Ok(())
}

fn broadcast(inner: &mut Inner, completed: CompletedTask) {
    inner.watchers.retain(|w| {
        if !w.is_live() {
            return false;
        }
        match w.tasks.try_send(completed.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(guid = %completed.task_guid, "watcher buffer full, completion dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    });
}

#[async_trait]
impl FleetCoordinator for MemoryCoordinator {
    async fn submit_task(&self, envelope: TaskEnvelope) -> Result<(), CoordinatorError> {
        let created_at = self.clock.now_unix_nanos();
        let mut inner = self.write();
        if inner.tasks.contains_key(&envelope.guid) {
            return Err(CoordinatorError::AlreadyExists(envelope.guid));
        }

        debug!(guid = %envelope.guid, domain = %envelope.domain, "task desired");
        inner.tasks.insert(
            envelope.guid.clone(),
            TaskRecord {
                envelope,
                state: TaskState::Pending,
                created_at,
                completed: None,
            },
        );
        Ok(())
    }

    async fn watch_completed_tasks(&self) -> CompletionWatch {
        let (task_tx, task_rx) = mpsc::channel(WATCH_BUFFER);
        let (err_tx, err_rx) = mpsc::channel(WATCH_BUFFER);
        let stop = CancellationToken::new();

        let mut inner = self.write();
        inner.watchers.retain(Watcher::is_live);
        inner.watchers.push(Watcher {
            tasks: task_tx,
            errors: err_tx,
            stop: stop.clone(),
        });

        CompletionWatch {
            tasks: task_rx,
            errors: err_rx,
            stop,
        }
    }

    async fn mark_resolving(&self, guid: &TaskGuid) -> Result<(), CoordinatorError> {
        transition(&mut self.write(), guid, TaskState::Resolving)
    }

    async fn mark_resolved(&self, guid: &TaskGuid) -> Result<(), CoordinatorError> {
        let mut inner = self.write();
        transition(&mut inner, guid, TaskState::Resolved)?;

        inner.resolved.push_back(guid.clone());
        while inner.resolved.len() > inner.resolved_retention {
            if let Some(old) = inner.resolved.pop_front() {
                inner.tasks.remove(&old);
                trace!(guid = %old, "resolved task forgotten");
            }
        }
        Ok(())
    }

    async fn available_artifact_server(&self) -> Result<String, CoordinatorError> {
        self.read()
            .artifact_servers
            .first()
            .cloned()
            .ok_or(CoordinatorError::NoArtifactServer)
    }
}

impl std::fmt::Debug for MemoryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("MemoryCoordinator")
            .field("tasks", &inner.tasks.len())
            .field("watchers", &inner.watchers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedClock;
    use stager_model::{BUILDPACK_TASK_DOMAIN, LogConfig};

    fn envelope(guid: &str) -> TaskEnvelope {
        TaskEnvelope {
            guid: TaskGuid::from(guid),
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
        }
    }

    #[tokio::test]
    async fn submit_rejects_duplicates() {
        let c = MemoryCoordinator::new();
        c.submit_task(envelope("a")).await.unwrap();
        assert_eq!(
            c.submit_task(envelope("a")).await.unwrap_err(),
            CoordinatorError::AlreadyExists(TaskGuid::from("a"))
        );
        assert_eq!(c.state(&TaskGuid::from("a")), Some(TaskState::Pending));
    }

    #[tokio::test]
    async fn completion_reaches_watchers_with_creation_time() {
        let c = MemoryCoordinator::with_clock(Arc::new(FixedClock::new(42)));
        let guid = TaskGuid::from("a");
        c.submit_task(envelope("a")).await.unwrap();

        let mut w1 = c.watch_completed_tasks().await;
        let mut w2 = c.watch_completed_tasks().await;
        c.start_task(&guid).unwrap();
        c.succeed_task(&guid, "{}").unwrap();

        for w in [&mut w1, &mut w2] {
            let got = w.tasks.recv().await.unwrap();
            assert_eq!(got.task_guid, guid);
            assert_eq!(got.created_at, 42);
            assert_eq!(got.domain, BUILDPACK_TASK_DOMAIN);
            assert!(!got.failed);
        }
    }

    #[tokio::test]
    async fn mark_resolving_is_exclusive() {
        let c = MemoryCoordinator::new();
        let guid = TaskGuid::from("a");
        c.submit_task(envelope("a")).await.unwrap();

        assert!(matches!(
            c.mark_resolving(&guid).await,
            Err(CoordinatorError::InvalidTransition { from: TaskState::Pending, .. })
        ));

        c.fail_task(&guid, "boom").unwrap();
        c.mark_resolving(&guid).await.unwrap();
        assert!(c.mark_resolving(&guid).await.is_err());

        c.mark_resolved(&guid).await.unwrap();
        assert_eq!(c.state(&guid), Some(TaskState::Resolved));
        assert_eq!(
            c.mark_resolving(&TaskGuid::from("missing")).await.unwrap_err(),
            CoordinatorError::NotFound(TaskGuid::from("missing"))
        );
    }

    #[tokio::test]
    async fn resolved_records_are_bounded() {
        let c = MemoryCoordinator::new().with_resolved_retention(2);
        let guids: Vec<_> = ["a", "b", "c"].into_iter().map(TaskGuid::from).collect();

        for guid in &guids {
            c.submit_task(envelope(guid.as_str())).await.unwrap();
            c.fail_task(guid, "boom").unwrap();
            c.mark_resolving(guid).await.unwrap();
            c.mark_resolved(guid).await.unwrap();
        }

        assert_eq!(c.state(&guids[0]), None);
        assert_eq!(c.list_by_state(TaskState::Resolved), guids[1..].to_vec());

        c.submit_task(envelope("pending")).await.unwrap();
        assert_eq!(c.state(&TaskGuid::from("pending")), Some(TaskState::Pending));
    }

    #[tokio::test]
    async fn interrupt_sends_stream_error_and_detaches() {
        let c = MemoryCoordinator::new();
        let mut w = c.watch_completed_tasks().await;
        assert_eq!(c.watcher_count(), 1);

        c.interrupt_watches("connection reset");
        assert_eq!(
            w.errors.recv().await,
            Some(CoordinatorError::Stream("connection reset".into()))
        );
        assert_eq!(c.watcher_count(), 0);
        assert!(w.tasks.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancelled_watch_is_pruned() {
        let c = MemoryCoordinator::new();
        let w = c.watch_completed_tasks().await;
        w.stop.cancel();
        assert_eq!(c.watcher_count(), 0);
    }

    #[tokio::test]
    async fn artifact_server_listing() {
        let c = MemoryCoordinator::new();
        assert_eq!(
            c.available_artifact_server().await.unwrap_err(),
            CoordinatorError::NoArtifactServer
        );
        c.register_artifact_server("http://fs:8080");
        assert_eq!(c.available_artifact_server().await.unwrap(), "http://fs:8080");
    }

    #[tokio::test]
    async fn redeliver_requires_completion() {
        let c = MemoryCoordinator::new();
        let guid = TaskGuid::from("a");
        c.submit_task(envelope("a")).await.unwrap();
        assert!(c.redeliver(&guid).is_err());

        let mut w = c.watch_completed_tasks().await;
        c.succeed_task(&guid, "{}").unwrap();
        c.redeliver(&guid).unwrap();
        assert_eq!(w.tasks.recv().await.unwrap().task_guid, guid);
        assert_eq!(w.tasks.recv().await.unwrap().task_guid, guid);
        assert_eq!(c.list_by_state(TaskState::Completed), vec![guid]);
    }
}
