use serde::{Deserialize, Serialize};

use crate::{TaskGuid, UnixNanos};

/// Task as reported by the fleet once it has finished.
///
/// `result` and `annotation` are opaque JSON text; their schema depends on the task domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub task_guid: TaskGuid,
    #[serde(default)]
    pub domain: String,
    /// Creation time of the desired task, unix nanoseconds.
    #[serde(default)]
    pub created_at: UnixNanos,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub failure_reason: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub annotation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let task: CompletedTask =
            serde_json::from_str(r#"{"task_guid": "abc", "failed": true}"#).unwrap();

        assert_eq!(task.task_guid, TaskGuid::from("abc"));
        assert!(task.failed);
        assert!(task.domain.is_empty());
        assert!(task.annotation.is_empty());
        assert_eq!(task.created_at, 0);
    }

    #[test]
    fn task_guid_is_required() {
        let res: Result<CompletedTask, _> = serde_json::from_str(r#"{"domain": "d"}"#);
        assert!(res.is_err());
    }
}
