use async_trait::async_trait;
use stager_core::{CompletionService, Stager};
use stager_model::{CompletedTask, StagingRequest, TaskGuid};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that bridges `Stager` and `CompletionService` to `ApiHandler`.
pub struct StagerApiAdapter {
    stager: Stager,
    completion: CompletionService,
}

impl StagerApiAdapter {
    pub fn new(stager: Stager, completion: CompletionService) -> Self {
        Self { stager, completion }
    }
}

#[async_trait]
impl ApiHandler for StagerApiAdapter {
    async fn stage(&self, task_id: &str, mut request: StagingRequest) -> Result<TaskGuid, ApiError> {
        if request.task_id.is_empty() {
            request.task_id = task_id.to_string();
        } else if request.task_id != task_id {
            return Err(ApiError::InvalidRequest(format!(
                "task id {:?} does not match path {task_id:?}",
                request.task_id
            )));
        }
        self.stager.stage(&request).await.map_err(ApiError::from)
    }

    async fn staging_completed(&self, guid: &TaskGuid, task: CompletedTask) -> Result<(), ApiError> {
        self.completion
            .complete(guid, task)
            .await
            .map_err(ApiError::from)
    }
}
