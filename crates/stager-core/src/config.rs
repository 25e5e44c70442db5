use std::{sync::Arc, time::Duration};

use stager_model::{BUILDPACK_TASK_DOMAIN, DOCKER_TASK_DOMAIN};
use thiserror::Error;

use crate::{
    backend::{BackendRouter, BuildpackBackend, DockerBackend, RouterError},
    builder::{BuildOptions, CompilerTable, DEFAULT_BUILD_TIMEOUT, TaskBuilder},
    watch::{DEFAULT_QUEUE_CAPACITY, DEFAULT_RESUBSCRIBE_DELAY, DEFAULT_WORKERS, WatcherConfig},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid compiler entry {0:?}, expected stack=path")]
    InvalidCompiler(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("task domain must not be empty")]
    EmptyDomain,

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Everything the staging core needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct StagerConfig {
    pub compilers: CompilerTable,
    pub buildpack_domain: String,
    pub docker_domain: String,
    /// Upper bound for the build script run.
    pub build_timeout: Duration,
    pub resubscribe_delay: Duration,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for StagerConfig {
    fn default() -> Self {
        Self {
            compilers: CompilerTable::new(),
            buildpack_domain: BUILDPACK_TASK_DOMAIN.to_string(),
            docker_domain: DOCKER_TASK_DOMAIN.to_string(),
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            resubscribe_delay: DEFAULT_RESUBSCRIBE_DELAY,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl StagerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buildpack_domain.is_empty() || self.docker_domain.is_empty() {
            return Err(ConfigError::EmptyDomain);
        }
        if self.build_timeout.is_zero() {
            return Err(ConfigError::Zero("build timeout"));
        }
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Zero("queue capacity"));
        }
        self.backend_router()?;
        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            domain: self.buildpack_domain.clone(),
            build_timeout: self.build_timeout,
        }
    }

    pub fn task_builder(&self) -> TaskBuilder {
        TaskBuilder::new(self.compilers.clone(), self.build_options())
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            resubscribe_delay: self.resubscribe_delay,
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }

    /// Buildpack and container-image backends under the configured domains.
    pub fn backend_router(&self) -> Result<BackendRouter, ConfigError> {
        let router = BackendRouter::new()
            .with(Arc::new(BuildpackBackend::new(&self.buildpack_domain)))?
            .with(Arc::new(DockerBackend::new(&self.docker_domain)))?;
        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = StagerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.build_timeout, Duration::from_secs(900));
        assert_eq!(cfg.watcher_config().resubscribe_delay, Duration::from_secs(3));
        assert_eq!(cfg.backend_router().unwrap().len(), 2);
    }

    #[test]
    fn rejects_zero_and_clashing_values() {
        let cfg = StagerConfig {
            workers: 0,
            ..StagerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::Zero("workers")));

        let cfg = StagerConfig {
            docker_domain: BUILDPACK_TASK_DOMAIN.into(),
            ..StagerConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Router(RouterError::DuplicateDomain(
                BUILDPACK_TASK_DOMAIN.into()
            )))
        );
    }
}
