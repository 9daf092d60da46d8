//! Structured logging setup.
//!
//! Everything in the crate logs through `tracing` with structured fields.
//! This module installs the global subscriber once at startup:
//!
//! - an `EnvFilter` from `RUST_LOG`, falling back to the configured level;
//! - a JSON or pretty `fmt` layer;
//! - a non-blocking writer to stdout, or to a daily-rotating file
//!   `<log_dir>/<project>.YYYY-MM-DD` when a log directory is set.
//!
//! [`init_logging`] returns a [`LogService`] that owns the writer's guard.
//! Keep it alive for the life of the process; dropping it flushes pending
//! lines and stops the writer thread.
//!
//! Settings come from the environment (`XIA_LOG_LEVEL`, `XIA_LOG_FORMAT`,
//! `XIA_LOG_DIR`, `XIA_LOG_PROJECT`, `XIA_LOG_INCLUDE_LOCATION`) or from the
//! `[project]` section of the INI file (`level`, `format`, `logpath`,
//! `project`).

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::IniConfig;

pub const DEFAULT_PROJECT: &str = "xia";

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Directory for daily log files; stdout when `None`
    pub log_dir: Option<PathBuf>,
    /// File name prefix for log files
    pub project: String,
    /// Include file:line location
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::default_prod()
    }
}

impl LogConfig {
    /// Production defaults overridden by `XIA_LOG_*` variables.
    #[must_use]
    pub fn from_env() -> Self {
        let base = Self::default_prod();
        Self {
            log_level: env::var("XIA_LOG_LEVEL").unwrap_or(base.log_level),
            format: env::var("XIA_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(base.format),
            log_dir: env::var("XIA_LOG_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            project: env::var("XIA_LOG_PROJECT").unwrap_or(base.project),
            include_location: env::var("XIA_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(base.include_location),
        }
    }

    /// Settings from the `[project]` section; absent keys keep the
    /// environment-derived value.
    #[must_use]
    pub fn from_config(cfg: &IniConfig) -> Self {
        let mut config = Self::from_env();
        if let Some(level) = cfg.get("project", "level") {
            config.log_level = level.to_string();
        }
        if let Some(format) = cfg.get("project", "format") {
            config.format = LogFormat::parse(format);
        }
        if let Some(dir) = cfg.get("project", "logpath").filter(|s| !s.is_empty()) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(project) = cfg.get("project", "project").filter(|s| !s.is_empty()) {
            config.project = project.to_string();
        }
        config
    }

    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
            project: DEFAULT_PROJECT.to_string(),
            include_location: true,
        }
    }

    #[must_use]
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            log_dir: None,
            project: DEFAULT_PROJECT.to_string(),
            include_location: false,
        }
    }

    /// Filter directive for the configured level; unknown levels mean `info`.
    fn level_directive(&self) -> &'static str {
        match self.log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        }
    }
}

/// Handle on the installed logging pipeline.
///
/// Dropping it flushes buffered lines.
#[must_use = "dropping the LogService stops the log writer"]
pub struct LogService {
    _guard: WorkerGuard,
    log_file: Option<PathBuf>,
}

impl LogService {
    /// Directory and file prefix of the rolling log, if logging to files.
    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Flush and stop the writer.
    pub fn shutdown(self) {}
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when the log directory cannot be created or a subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> Result<LogService> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level_directive()))
        .context("Invalid log filter")?
        .add_directive(
            "may_minihttp=warn"
                .parse()
                .context("Invalid may_minihttp directive")?,
        );

    let (writer, guard, log_file) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &config.project);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (writer, guard, Some(dir.join(&config.project)))
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            (writer, guard, None)
        }
    };
    let to_file = log_file.is_some();

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(!to_file)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    tracing::info!(
        level = config.level_directive(),
        format = ?config.format,
        file = ?log_file,
        "Logging initialized"
    );

    Ok(LogService {
        _guard: guard,
        log_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default_dev() {
        let config = LogConfig::default_dev();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.log_dir.is_none());
        assert!(config.include_location);
    }

    #[test]
    fn test_log_config_default_prod() {
        let config = LogConfig::default_prod();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.project, DEFAULT_PROJECT);
        assert!(!config.include_location);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Json);
    }

    #[test]
    fn test_from_config_project_section() {
        let cfg = IniConfig::parse_str(
            "[project]\nlogpath = /tmp/xia-logs\nproject = shop\nlevel = debug\nformat = pretty\n",
        )
        .unwrap();
        let config = LogConfig::from_config(&cfg);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/xia-logs")));
        assert_eq!(config.project, "shop");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_level_directive_falls_back_to_info() {
        let mut config = LogConfig::default_prod();
        config.log_level = "WARN".to_string();
        assert_eq!(config.level_directive(), "warn");
        config.log_level = "chatty".to_string();
        assert_eq!(config.level_directive(), "info");
    }
}
