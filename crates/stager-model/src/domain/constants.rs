/// Default task domain for buildpack staging tasks.
pub const BUILDPACK_TASK_DOMAIN: &str = "cf-app-staging";

/// Default task domain for container-image staging tasks.
pub const DOCKER_TASK_DOMAIN: &str = "cf-app-docker-staging";

/// Log source name attached to every staging task.
pub const STAGING_LOG_SOURCE: &str = "STG";
