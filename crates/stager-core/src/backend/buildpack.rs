use stager_model::{
    BUILDPACK_TASK_DOMAIN, CompletedTask, Lifecycle, StagingOutcome, StagingResponse,
    StagingResult,
};

use super::{Backend, TranslateError, identities};

#[derive(Debug, Clone)]
pub struct BuildpackBackend {
    domain: String,
}

impl BuildpackBackend {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl Default for BuildpackBackend {
    fn default() -> Self {
        Self::new(BUILDPACK_TASK_DOMAIN)
    }
}

impl Backend for BuildpackBackend {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::Buildpack
    }

    fn task_domain(&self) -> &str {
        &self.domain
    }

    fn build_response(&self, task: &CompletedTask) -> Result<StagingResponse, TranslateError> {
        let (app_id, task_id) = identities(&task.annotation)?;

        if task.failed {
            return Ok(StagingResponse::failed(app_id, task_id, &task.failure_reason));
        }

        let result: StagingResult = serde_json::from_str(&task.result)
            .map_err(|e| TranslateError::InvalidResult(e.to_string()))?;

        Ok(StagingResponse {
            app_id,
            task_id,
            outcome: StagingOutcome::Buildpack {
                buildpack_key: result.buildpack_key,
                detected_buildpack: result.detected_buildpack,
                execution_metadata: result.execution_metadata,
                detected_start_command: result.detected_start_command,
            },
        })
    }
}
