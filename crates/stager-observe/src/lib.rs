//! Logging bootstrap for stager binaries.
//!
//! ```rust,ignore
//! let cfg = LoggerConfig {
//!     format: "json".parse()?,
//!     level: "info,stager_core=debug".into(),
//!     ..LoggerConfig::default()
//! };
//! stager_observe::logger_init(&cfg)?;
//! ```

mod config;
pub use config::LoggerConfig;

mod error;
pub use error::LoggerError;

mod format;
pub use format::LoggerFormat;

mod init;
pub use init::logger_init;
