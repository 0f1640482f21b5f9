//! Structured logging setup.
//!
//! `tracing`-based, configured from [`LoggingConfig`] with environment
//! overrides. The model core itself only emits load- and import-time
//! events; per-operation failures are returned, never logged.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
        }
    }
}

/// Resolve the log file path with precedence: `PARAMTREE_LOG_FILE` env,
/// config file value, platform state directory default.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, Error> {
    if let Ok(env_path) = std::env::var("PARAMTREE_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    let project_dirs = directories::ProjectDirs::from("", "paramtree", "paramtree")
        .ok_or_else(|| {
            Error::Config("could not determine platform state directory for log file".to_string())
        })?;
    let state_dir = project_dirs
        .state_dir()
        .ok_or_else(|| {
            Error::Config("platform state directory not available for log file".to_string())
        })?
        .to_path_buf();
    Ok(state_dir.join("paramtree.log"))
}

/// Initialize the logging system.
///
/// Priority order (highest to lowest): `PARAMTREE_LOG*` environment
/// variables, the supplied configuration, defaults. Call once per process.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), Error> {
    let disabled = config.map(|c| !c.enabled).unwrap_or(false);
    if disabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(|| std::io::sink()))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config);
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true);

    let base = Registry::default().with(filter);
    match (format.as_str(), output) {
        ("json", Output::Stdout) => base
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stdout))
            .init(),
        ("json", Output::Stderr) => base
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init(),
        ("json", Output::File) => {
            let writer = open_log_file(config)?;
            base.with(fmt::layer().json().with_target(true).with_writer(writer))
                .init()
        }
        (_, Output::Stdout) => base
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(use_color)
                    .with_writer(std::io::stdout),
            )
            .init(),
        (_, Output::Stderr) => base
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(use_color)
                    .with_writer(std::io::stderr),
            )
            .init(),
        (_, Output::File) => {
            let writer = open_log_file(config)?;
            base.with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init()
        }
    }

    Ok(())
}

fn open_log_file(config: Option<&LoggingConfig>) -> Result<std::fs::File, Error> {
    let path = resolve_log_file_path(config.and_then(|c| c.file.clone()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| Error::Config(format!("failed to open log file {:?}: {}", path, e)))
}

/// Build the environment filter from `PARAMTREE_LOG` or the config level.
fn build_env_filter(config: Option<&LoggingConfig>) -> EnvFilter {
    match EnvFilter::try_from_env("PARAMTREE_LOG") {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(config.map(|c| c.level.as_str()).unwrap_or("info")),
    }
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, Error> {
    if let Ok(format) = std::env::var("PARAMTREE_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }
    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(Error::Config(format!(
            "invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File,
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<Output, Error> {
    let output = match std::env::var("PARAMTREE_LOG_OUTPUT") {
        Ok(v) => v,
        Err(_) => config
            .map(|c| c.output.clone())
            .unwrap_or_else(default_output),
    };
    match output.as_str() {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => Ok(Output::File),
        other => Err(Error::Config(format!(
            "invalid log output: {} (must be 'stdout', 'stderr', or 'file')",
            other
        ))),
    }
}
