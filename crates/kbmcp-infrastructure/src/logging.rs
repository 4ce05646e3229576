//! Structured logging with `tracing`.
//!
//! Everything here writes to stderr (optionally mirrored to a rolling file)
//! and never to stdout: stdout is reserved for the `stdio` MCP transport's
//! JSON-RPC framing, and a stray log line on stdout would corrupt it.

use kbmcp_domain::error::{Error, Result};
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration, independent of the transport/backend settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// A `tracing_subscriber::EnvFilter`-compatible level or directive string.
    pub level: String,
    /// Emit structured JSON log lines instead of the human-readable format.
    pub json_format: bool,
    /// If set, also mirror logs to a daily-rotating file at this path.
    pub file_output: Option<std::path::PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json_format: false, file_output: None }
    }
}

/// Initialize the global `tracing` subscriber. Must be called exactly once,
/// before any other logging.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter = create_log_filter(&config.level);
    let file_appender = create_file_appender(&config.file_output);

    if config.json_format {
        init_json_logging(filter, file_appender)?;
    } else {
        init_text_logging(filter, file_appender)?;
    }

    info!("logging initialized at level {level}");
    Ok(())
}

fn create_log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env("KBMCP_LOG").unwrap_or_else(|_| EnvFilter::new(level))
}

fn create_file_appender(
    file_output: &Option<std::path::PathBuf>,
) -> Option<tracing_appender::rolling::RollingFileAppender> {
    file_output.as_ref().map(|path| {
        tracing_appender::rolling::daily(
            path.parent().unwrap_or_else(|| std::path::Path::new(".")),
            path.file_stem().unwrap_or_else(|| std::ffi::OsStr::new("kbmcp")),
        )
    })
}

fn init_json_logging(
    filter: EnvFilter,
    file_appender: Option<tracing_appender::rolling::RollingFileAppender>,
) -> Result<()> {
    let stderr = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let registry = Registry::default().with(filter);
    if let Some(appender) = file_appender {
        let file = fmt::layer().json().with_writer(appender).with_ansi(false).with_target(true);
        registry.with(stderr).with(file).init();
    } else {
        registry.with(stderr).init();
    }
    Ok(())
}

fn init_text_logging(
    filter: EnvFilter,
    file_appender: Option<tracing_appender::rolling::RollingFileAppender>,
) -> Result<()> {
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let registry = Registry::default().with(filter);
    if let Some(appender) = file_appender {
        let file = fmt::layer().with_writer(appender).with_ansi(false).with_target(true);
        registry.with(stderr).with(file).init();
    } else {
        registry.with(stderr).init();
    }
    Ok(())
}

/// Parse a level string into a `tracing::Level`.
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::generic(format!(
            "invalid log level '{level}': use trace, debug, info, warn, or error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_level_accepts_known_levels() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
    }

    #[test]
    fn parse_log_level_rejects_unknown_level() {
        assert!(parse_log_level("verbose").is_err());
    }
}
