use serde::{Deserialize, Serialize};

use crate::{Action, LogConfig, Stack, TaskGuid};

/// Complete work order for one staging task, handed to the fleet coordinator.
///
/// Built once and then only moved; the coordinator owns it after submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub guid: TaskGuid,
    /// Partition tag selecting the staging lifecycle on completion.
    pub domain: String,
    pub stack: Stack,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub memory_mb: u32,
    pub disk_mb: u32,
    pub file_descriptors: u32,
    pub actions: Vec<Action>,
    pub log: LogConfig,
    /// JSON text round-tripped unchanged to the completed task.
    pub annotation: String,
}
