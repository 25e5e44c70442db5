mod kv;
pub use kv::KeyValue;

mod task_env;
pub use task_env::TaskEnv;

mod task_guid;
pub use task_guid::TaskGuid;

mod task_state;
pub use task_state::TaskState;

mod lifecycle;
pub use lifecycle::Lifecycle;

mod constants;
pub use constants::{BUILDPACK_TASK_DOMAIN, DOCKER_TASK_DOMAIN, STAGING_LOG_SOURCE};

/// Name of a root filesystem the fleet can run tasks on (e.g. `"cflinuxfs4"`).
pub type Stack = String;

/// Unix timestamp in nanoseconds, as reported by the fleet coordinator.
pub type UnixNanos = i64;
