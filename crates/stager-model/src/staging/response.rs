use serde::{Deserialize, Serialize};

use crate::StartCommands;

/// Normalized staging result delivered to the control plane.
///
/// Serialized flat: identities next to either `error` or the lifecycle-specific success fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingResponse {
    pub app_id: String,
    pub task_id: String,
    #[serde(flatten)]
    pub outcome: StagingOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StagingOutcome {
    /// Staging failed on the fleet; the reason is passed through verbatim.
    Failed { error: String },
    Buildpack {
        buildpack_key: String,
        detected_buildpack: String,
        execution_metadata: String,
        detected_start_command: StartCommands,
    },
    Docker {
        execution_metadata: String,
        detected_start_command: StartCommands,
    },
}

impl StagingResponse {
    pub fn failed(
        app_id: impl Into<String>,
        task_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            task_id: task_id.into(),
            outcome: StagingOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, StagingOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            StagingOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
