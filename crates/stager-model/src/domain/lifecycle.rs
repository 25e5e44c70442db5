use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Staging lifecycle a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Application bits compiled with buildpacks into a droplet.
    Buildpack,
    /// Container image inspected for its start command and metadata.
    Docker,
}

impl Lifecycle {
    /// Tag stored in the task annotation.
    pub fn tag(self) -> &'static str {
        match self {
            Lifecycle::Buildpack => "buildpack",
            Lifecycle::Docker => "docker",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Lifecycle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buildpack" => Ok(Lifecycle::Buildpack),
            "docker" => Ok(Lifecycle::Docker),
            other => Err(ModelError::UnknownLifecycle(other.to_string())),
        }
    }
}
