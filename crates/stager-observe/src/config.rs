use std::io::IsTerminal;

use crate::format::LoggerFormat;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directives, e.g. `info` or `warn,stager_core=debug`.
    pub level: String,
    pub with_targets: bool,
    /// ANSI colors; only honored by the text format.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}
