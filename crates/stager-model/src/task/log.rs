use serde::{Deserialize, Serialize};

/// Where the fleet should route task output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log stream identity; the application id for staging tasks.
    pub guid: String,
    pub source_name: String,
}
