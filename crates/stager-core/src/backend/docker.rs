use stager_model::{
    CompletedTask, DOCKER_TASK_DOMAIN, DockerStagingResult, Lifecycle, StagingOutcome,
    StagingResponse,
};

use super::{Backend, TranslateError, identities};

/// Container-image lifecycle. The result carries no buildpack fields.
#[derive(Debug, Clone)]
pub struct DockerBackend {
    domain: String,
}

impl DockerBackend {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl Default for DockerBackend {
    fn default() -> Self {
        Self::new(DOCKER_TASK_DOMAIN)
    }
}

impl Backend for DockerBackend {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::Docker
    }

    fn task_domain(&self) -> &str {
        &self.domain
    }

    fn build_response(&self, task: &CompletedTask) -> Result<StagingResponse, TranslateError> {
        let (app_id, task_id) = identities(&task.annotation)?;

        if task.failed {
            return Ok(StagingResponse::failed(app_id, task_id, &task.failure_reason));
        }

        let result: DockerStagingResult = serde_json::from_str(&task.result)
            .map_err(|e| TranslateError::InvalidResult(e.to_string()))?;

        Ok(StagingResponse {
            app_id,
            task_id,
            outcome: StagingOutcome::Docker {
                execution_metadata: result.execution_metadata,
                detected_start_command: result.detected_start_command,
            },
        })
    }
}
