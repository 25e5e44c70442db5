use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use stager_client::CcClientConfig;
use stager_core::{CompilerTable, StagerConfig};
use stager_observe::{LoggerConfig, LoggerFormat};

/// Staging daemon: builds staging tasks for the fleet and reports their results.
///
/// Tasks are tracked by the in-process coordinator, which keeps no state across restarts.
/// Use it for development and testing.
#[derive(Debug, Parser)]
#[command(name = "stagerd", version)]
pub struct Args {
    /// Address the HTTP API listens on.
    #[arg(long, env = "STAGER_LISTEN", default_value = "0.0.0.0:8888")]
    pub listen: SocketAddr,

    /// Cloud controller internal API base URL.
    #[arg(long, env = "STAGER_CC_URL", default_value = "http://127.0.0.1:9022")]
    pub cc_url: String,

    #[arg(long, env = "STAGER_CC_USERNAME")]
    pub cc_username: Option<String>,

    #[arg(long, env = "STAGER_CC_PASSWORD", hide_env_values = true)]
    pub cc_password: Option<String>,

    #[arg(long, env = "STAGER_CC_TIMEOUT_SECS", default_value_t = 30)]
    pub cc_timeout_secs: u64,

    /// Compiler archive per stack, as `stack=path[,stack=path...]`.
    #[arg(long, env = "STAGER_COMPILERS", default_value = "")]
    pub compilers: CompilerTable,

    /// Artifact (file) server base URL offered by the in-process coordinator. Repeatable.
    #[arg(long = "artifact-server", env = "STAGER_ARTIFACT_SERVERS", value_delimiter = ',')]
    pub artifact_servers: Vec<String>,

    #[arg(long, env = "STAGER_BUILDPACK_DOMAIN", default_value = stager_model::BUILDPACK_TASK_DOMAIN)]
    pub buildpack_domain: String,

    #[arg(long, env = "STAGER_DOCKER_DOMAIN", default_value = stager_model::DOCKER_TASK_DOMAIN)]
    pub docker_domain: String,

    #[arg(long, env = "STAGER_BUILD_TIMEOUT_SECS", default_value_t = 900)]
    pub build_timeout_secs: u64,

    #[arg(long, env = "STAGER_RESUBSCRIBE_DELAY_SECS", default_value_t = 3)]
    pub resubscribe_delay_secs: u64,

    /// Concurrent completion dispatches.
    #[arg(long, env = "STAGER_WORKERS", default_value_t = 16)]
    pub workers: usize,

    /// Completed tasks buffered ahead of the workers.
    #[arg(long, env = "STAGER_QUEUE_CAPACITY", default_value_t = 256)]
    pub queue_capacity: usize,

    /// text | json | journald
    #[arg(long, env = "STAGER_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    #[arg(long, env = "STAGER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn logger_config(&self) -> anyhow::Result<LoggerConfig> {
        let format: LoggerFormat = self.log_format.parse()?;
        Ok(LoggerConfig {
            format,
            level: self.log_level.clone(),
            ..LoggerConfig::default()
        })
    }

    pub fn stager_config(&self) -> StagerConfig {
        StagerConfig {
            compilers: self.compilers.clone(),
            buildpack_domain: self.buildpack_domain.clone(),
            docker_domain: self.docker_domain.clone(),
            build_timeout: Duration::from_secs(self.build_timeout_secs),
            resubscribe_delay: Duration::from_secs(self.resubscribe_delay_secs),
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn cc_config(&self) -> CcClientConfig {
        CcClientConfig {
            base_url: self.cc_url.clone(),
            username: self.cc_username.clone(),
            password: self.cc_password.clone(),
            timeout: Duration::from_secs(self.cc_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core_defaults() {
        let args = Args::try_parse_from(["stagerd"]).unwrap();
        let cfg = args.stager_config();
        let defaults = StagerConfig::default();

        assert_eq!(cfg.build_timeout, defaults.build_timeout);
        assert_eq!(cfg.resubscribe_delay, defaults.resubscribe_delay);
        assert_eq!(cfg.workers, defaults.workers);
        assert_eq!(cfg.queue_capacity, defaults.queue_capacity);
        assert_eq!(cfg.buildpack_domain, defaults.buildpack_domain);
        assert_eq!(cfg.docker_domain, defaults.docker_domain);
        assert!(cfg.compilers.is_empty());
        assert!(args.cc_config().validate().is_ok());
    }

    #[test]
    fn parses_compilers_and_servers() {
        let args = Args::try_parse_from([
            "stagerd",
            "--compilers",
            "cflinuxfs4=compilers/fs4.tgz",
            "--artifact-server",
            "http://fs-a:8080,http://fs-b:8080",
            "--workers",
            "4",
        ])
        .unwrap();

        assert_eq!(args.compilers.get("cflinuxfs4"), Some("compilers/fs4.tgz"));
        assert_eq!(args.artifact_servers.len(), 2);
        assert_eq!(args.stager_config().workers, 4);
    }

    #[test]
    fn rejects_malformed_compilers() {
        assert!(Args::try_parse_from(["stagerd", "--compilers", "cflinuxfs4"]).is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let args = Args::try_parse_from(["stagerd", "--log-format", "xml"]).unwrap();
        assert!(args.logger_config().is_err());
    }
}
