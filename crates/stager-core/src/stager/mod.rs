//! Staging intake: turn a request into a desired task on the fleet.

use std::sync::Arc;

use stager_model::{StagingRequest, TaskGuid};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    builder::{BuildError, FileServerResolver, TaskBuilder},
    ports::{CoordinatorError, FleetCoordinator},
};

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("submit task: {0}")]
    Submit(#[source] CoordinatorError),
}

#[derive(Clone)]
pub struct Stager {
    coordinator: Arc<dyn FleetCoordinator>,
    builder: TaskBuilder,
}

impl Stager {
    pub fn new(coordinator: Arc<dyn FleetCoordinator>, builder: TaskBuilder) -> Self {
        Self {
            coordinator,
            builder,
        }
    }

    /// Build the staging task for `request` and desire it on the fleet.
    ///
    /// Checks run in order: app identity, artifact server, compiler for the stack.
    #[instrument(level = "debug", skip_all, fields(app_id = %request.app_id, task_id = %request.task_id))]
    pub async fn stage(&self, request: &StagingRequest) -> Result<TaskGuid, StageError> {
        request
            .validate()
            .map_err(|_| BuildError::MissingIdentity)?;

        let server = self
            .coordinator
            .available_artifact_server()
            .await
            .map_err(|e| BuildError::ArtifactLocationUnavailable(e.to_string()))?;
        let resolver = FileServerResolver::new(&server).map_err(BuildError::from)?;

        let envelope = self.builder.build(request, &resolver)?;
        let guid = envelope.guid.clone();
        let actions = envelope.actions.len();

        self.coordinator
            .submit_task(envelope)
            .await
            .map_err(StageError::Submit)?;

        info!(%guid, stack = %request.stack, actions, "staging task desired");
        Ok(guid)
    }
}

impl std::fmt::Debug for Stager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stager")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
