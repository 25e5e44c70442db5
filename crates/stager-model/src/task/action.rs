use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::TaskEnv;

/// One step of a staging task.
///
/// The fleet executes actions serially in envelope order and aborts on the first failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Fetch an archive into the container.
    Download {
        from: String,
        to: String,
        /// Unpack the archive at `to` after download.
        #[serde(default)]
        extract: bool,
    },
    /// Execute a script inside the container.
    Run {
        script: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "TaskEnv::is_empty")]
        env: TaskEnv,
        /// Upper bound on script runtime, in milliseconds on the wire.
        #[serde(with = "super::duration_ms")]
        timeout: Duration,
    },
    /// Send a file out of the container.
    Upload { from: String, to: String },
    /// Read a small file from the container into the task result.
    FetchResult { file: String },
}

impl Action {
    /// Short symbolic name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Download { .. } => "download",
            Action::Run { .. } => "run",
            Action::Upload { .. } => "upload",
            Action::FetchResult { .. } => "fetch_result",
        }
    }
}
