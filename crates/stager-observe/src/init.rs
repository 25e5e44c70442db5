use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::time::OffsetTime, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global `tracing` subscriber described by `cfg`.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = mk_filter(&cfg.level)?;
    let output: BoxedLayer = match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .boxed(),
        LoggerFormat::Journald => mk_journald()?,
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn mk_journald() -> Result<BoxedLayer, LoggerError> {
    tracing_journald::layer()
        .map(|layer| layer.boxed())
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn mk_journald() -> Result<BoxedLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_level() {
        assert!(matches!(
            mk_filter("stager_core=verbose"),
            Err(LoggerError::InvalidLogLevel(_))
        ));
        assert!(mk_filter("warn,stager_core=debug").is_ok());
    }

    #[test]
    fn bad_level_fails_before_install() {
        let cfg = LoggerConfig {
            level: "stager=loud".into(),
            ..LoggerConfig::default()
        };
        assert!(matches!(logger_init(&cfg), Err(LoggerError::InvalidLogLevel(_))));
    }

    #[test]
    fn second_init_is_rejected() {
        let cfg = LoggerConfig {
            use_color: false,
            ..LoggerConfig::default()
        };
        logger_init(&cfg).unwrap();
        assert!(matches!(logger_init(&cfg), Err(LoggerError::AlreadyInitialized)));
    }
}
