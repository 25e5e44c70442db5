use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Lifecycle of a task as tracked by the fleet coordinator.
///
/// Transitions only move forward:
/// `Pending -> Running -> Completed -> Resolving -> Resolved`.
/// A task may also complete straight from `Pending` when the fleet rejects it before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    /// Desired, waiting for a worker.
    Pending,
    /// Executing on a worker.
    Running,
    /// Finished on the fleet, waiting for a consumer.
    Completed,
    /// Claimed by exactly one consumer.
    Resolving,
    /// Result delivered and acknowledged.
    Resolved,
}

impl TaskState {
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Completed)
                | (Running, Completed)
                | (Completed, Resolving)
                | (Resolving, Resolved)
        )
    }

    /// Checked transition.
    pub fn transition(self, next: TaskState) -> Result<TaskState, ModelError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Resolved)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Resolving => "resolving",
            TaskState::Resolved => "resolved",
        };
        f.write_str(s)
    }
}
