use async_trait::async_trait;
use stager_model::{CompletedTask, StagingRequest, TaskGuid};

use crate::error::ApiError;

/// Staging API handler.
///
/// Transports call into this trait; `StagerApiAdapter` is the stock implementation.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Accept a staging request for the staging task `task_id`.
    async fn stage(&self, task_id: &str, request: StagingRequest) -> Result<TaskGuid, ApiError>;

    /// Resolve a task the fleet reports directly.
    async fn staging_completed(&self, guid: &TaskGuid, task: CompletedTask) -> Result<(), ApiError>;
}
