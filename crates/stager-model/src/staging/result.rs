use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Process type to start command, as detected during staging (e.g. `{"web": "bundle exec rackup"}`).
pub type StartCommands = BTreeMap<String, String>;

/// Result descriptor written by the buildpack compiler.
///
/// Missing fields decode as empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingResult {
    pub buildpack_key: String,
    pub detected_buildpack: String,
    pub execution_metadata: String,
    pub detected_start_command: StartCommands,
}

/// Result descriptor written by the container-image builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerStagingResult {
    pub execution_metadata: String,
    pub detected_start_command: StartCommands,
}
