use async_trait::async_trait;
use stager_model::{CompletedTask, TaskEnvelope, TaskGuid, TaskState};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("task not found: {0}")]
    NotFound(TaskGuid),

    #[error("task already exists: {0}")]
    AlreadyExists(TaskGuid),

    #[error("task {guid}: cannot move from {from} to {to}")]
    InvalidTransition {
        guid: TaskGuid,
        from: TaskState,
        to: TaskState,
    },

    #[error("no artifact server available")]
    NoArtifactServer,

    #[error("completion stream failed: {0}")]
    Stream(String),

    #[error("coordinator unavailable: {0}")]
    Unavailable(String),
}

/// One subscription to the completed-task stream.
///
/// Both receivers belong to the same subscription. Cancelling `stop` (or dropping the
/// receivers) unsubscribes; the coordinator then closes both channels.
pub struct CompletionWatch {
    pub tasks: mpsc::Receiver<CompletedTask>,
    pub errors: mpsc::Receiver<CoordinatorError>,
    pub stop: CancellationToken,
}

/// Fleet coordinator API consumed by the stager.
///
/// `mark_resolving` must be exclusive per task: for any task guid at most one caller ever
/// succeeds, across processes and duplicate stream deliveries.
#[async_trait]
pub trait FleetCoordinator: Send + Sync + 'static {
    /// Desire a new task.
    async fn submit_task(&self, envelope: TaskEnvelope) -> Result<(), CoordinatorError>;

    /// Subscribe to tasks as they complete.
    async fn watch_completed_tasks(&self) -> CompletionWatch;

    /// Claim a completed task (`Completed -> Resolving`).
    async fn mark_resolving(&self, guid: &TaskGuid) -> Result<(), CoordinatorError>;

    /// Acknowledge a claimed task (`Resolving -> Resolved`).
    async fn mark_resolved(&self, guid: &TaskGuid) -> Result<(), CoordinatorError>;

    /// Base URL of a fleet-hosted artifact (file) server.
    async fn available_artifact_server(&self) -> Result<String, CoordinatorError>;
}
