use serde::{Deserialize, Serialize};

use crate::{ModelError, Stack, TaskEnv};

/// Buildpack to download into the staging container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buildpack {
    /// Stable key identifying the buildpack on the control plane.
    pub key: String,
    /// Where the buildpack archive can be downloaded from.
    pub url: String,
}

/// "Stage this application" request as sent by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingRequest {
    /// Application identity; must be non-empty.
    pub app_id: String,
    /// Identity of this staging attempt.
    #[serde(default)]
    pub task_id: String,
    /// Opaque routing token echoed back with the completed task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub stack: Stack,
    /// Buildpacks in detection order.
    #[serde(default)]
    pub buildpacks: Vec<Buildpack>,
    pub app_bits_download_uri: String,
    #[serde(default)]
    pub memory_mb: u32,
    #[serde(default)]
    pub disk_mb: u32,
    #[serde(default)]
    pub file_descriptors: u32,
    #[serde(default)]
    pub environment: TaskEnv,
}

impl StagingRequest {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.app_id.is_empty() {
            return Err(ModelError::MissingAppId);
        }
        Ok(())
    }

    /// Buildpack keys in request order.
    pub fn buildpack_order(&self) -> Vec<&str> {
        self.buildpacks.iter().map(|bp| bp.key.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_app_id_is_rejected() {
        let req = StagingRequest::default();
        assert_eq!(req.validate(), Err(ModelError::MissingAppId));
    }

    #[test]
    fn decodes_control_plane_payload() {
        let req: StagingRequest = serde_json::from_str(
            r#"{
                "app_id": "my-app",
                "task_id": "stage-1",
                "stack": "cflinuxfs4",
                "buildpacks": [{"key": "ruby", "url": "http://bp/ruby.zip"}],
                "app_bits_download_uri": "http://bits/my-app",
                "memory_mb": 1024,
                "environment": [{"key": "FOO", "value": "bar"}]
            }"#,
        )
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.buildpack_order(), vec!["ruby"]);
        assert_eq!(req.memory_mb, 1024);
        assert_eq!(req.disk_mb, 0);
        assert_eq!(req.environment.get("FOO"), Some("bar"));
        assert!(req.reply_to.is_none());
    }
}
