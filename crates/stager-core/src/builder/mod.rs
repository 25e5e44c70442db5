//! Compiles a staging request into a task envelope for the fleet.

pub mod layout;

mod resolver;
pub use resolver::{ArtifactResolver, FileServerResolver, ResolveError};

mod compilers;
pub use compilers::CompilerTable;

use std::time::Duration;

use stager_model::{
    Action, BUILDPACK_TASK_DOMAIN, Lifecycle, LogConfig, STAGING_LOG_SOURCE, StagingRequest,
    StagingTaskAnnotation, TaskEnvelope, TaskGuid,
};
use thiserror::Error;
use tracing::{instrument, trace};
use uuid::Uuid;

/// Upper bound on the build script runtime unless configured otherwise.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(15 * 60);

const STAGING_GUID_NAMESPACE: Uuid = Uuid::from_u128(0x6c1d_1a7e_53a9_4d0b_9f0e_2b8f_4c65_a1d3);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing app id")]
    MissingIdentity,

    #[error("no compiler defined for stack {0:?}")]
    NoCompilerForStack(String),

    #[error("artifact location unavailable: {0}")]
    ArtifactLocationUnavailable(String),
}

impl From<ResolveError> for BuildError {
    fn from(e: ResolveError) -> Self {
        BuildError::ArtifactLocationUnavailable(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Task domain stamped on every envelope.
    pub domain: String,
    pub build_timeout: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            domain: BUILDPACK_TASK_DOMAIN.to_string(),
            build_timeout: DEFAULT_BUILD_TIMEOUT,
        }
    }
}

/// Builds buildpack staging envelopes.
///
/// Pure: the only outside input is the [`ArtifactResolver`] passed to [`TaskBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    compilers: CompilerTable,
    options: BuildOptions,
}

impl TaskBuilder {
    pub fn new(compilers: CompilerTable, options: BuildOptions) -> Self {
        Self { compilers, options }
    }

    pub fn compilers(&self) -> &CompilerTable {
        &self.compilers
    }

    /// Request checks that need no artifact server: identity and compiler for the stack.
    ///
    /// Returns the compiler archive path for the request's stack.
    pub fn preflight<'a>(&'a self, request: &StagingRequest) -> Result<&'a str, BuildError> {
        request
            .validate()
            .map_err(|_| BuildError::MissingIdentity)?;
        self.compilers
            .get(&request.stack)
            .ok_or_else(|| BuildError::NoCompilerForStack(request.stack.clone()))
    }

    /// Build the envelope.
    ///
    /// Actions, in order: compiler, app bits, each buildpack (request order), build script,
    /// droplet upload, result descriptor. Later actions rely on files extracted by earlier ones.
    #[instrument(level = "debug", skip_all, fields(app_id = %request.app_id, stack = %request.stack))]
    pub fn build(
        &self,
        request: &StagingRequest,
        resolver: &dyn ArtifactResolver,
    ) -> Result<TaskEnvelope, BuildError> {
        let compiler_path = self.preflight(request)?;
        let compiler_url = resolver.compiler_download_url(compiler_path)?;
        let upload_url = resolver.droplet_upload_url(&request.app_id)?;

        let buildpack_order = request.buildpack_order();
        let mut actions = Vec::with_capacity(request.buildpacks.len() + 5);

        actions.push(Action::Download {
            from: compiler_url,
            to: layout::COMPILER_DIR.to_string(),
            extract: true,
        });
        actions.push(Action::Download {
            from: request.app_bits_download_uri.clone(),
            to: layout::APP_DIR.to_string(),
            extract: true,
        });
        for bp in &request.buildpacks {
            actions.push(Action::Download {
                from: bp.url.clone(),
                to: layout::buildpack_path(&bp.key),
                extract: true,
            });
        }
        actions.push(Action::Run {
            script: layout::script(),
            args: layout::script_args(&buildpack_order),
            env: request.environment.clone(),
            timeout: self.options.build_timeout,
        });
        actions.push(Action::Upload {
            from: layout::droplet_archive_path(),
            to: upload_url,
        });
        actions.push(Action::FetchResult {
            file: layout::result_json_path(),
        });

        let guid = staging_task_guid(&request.app_id, &request.task_id);
        trace!(%guid, actions = actions.len(), "staging envelope built");

        Ok(TaskEnvelope {
            guid,
            domain: self.options.domain.clone(),
            stack: request.stack.clone(),
            reply_to: request.reply_to.clone(),
            memory_mb: request.memory_mb,
            disk_mb: request.disk_mb,
            file_descriptors: request.file_descriptors,
            actions,
            log: LogConfig {
                guid: request.app_id.clone(),
                source_name: STAGING_LOG_SOURCE.to_string(),
            },
            annotation: StagingTaskAnnotation::new(
                Lifecycle::Buildpack,
                &request.app_id,
                &request.task_id,
            )
            .to_json(),
        })
    }
}

/// Deterministic task guid for an `(app_id, task_id)` pair.
///
/// The app id is length-prefixed before hashing so distinct pairs never share an input.
pub fn staging_task_guid(app_id: &str, task_id: &str) -> TaskGuid {
    let mut name = Vec::with_capacity(8 + app_id.len() + task_id.len());
    name.extend_from_slice(&(app_id.len() as u64).to_be_bytes());
    name.extend_from_slice(app_id.as_bytes());
    name.extend_from_slice(task_id.as_bytes());
    TaskGuid::from(Uuid::new_v5(&STAGING_GUID_NAMESPACE, &name).to_string())
}
