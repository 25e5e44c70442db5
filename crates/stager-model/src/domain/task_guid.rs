use std::fmt;

use serde::{Deserialize, Serialize};

/// Fleet-wide identity of a staging task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskGuid(String);

impl TaskGuid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskGuid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskGuid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for TaskGuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
