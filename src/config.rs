//! Instrumentation configuration.
//!
//! Resolved once at startup and shared read-only (`Arc`) by every
//! interceptor. Environment loading never fails: missing or invalid values
//! fall back to defaults. An explicitly requested TOML file does report errors.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `CALLTRACE_ENABLED` | true | Master switch; `false` makes interception a pass-through |
//! | `CALLTRACE_LOG_ARGS_ON_FAILURE` | true | Include sanitized arguments in duration records of failed calls |
//! | `CALLTRACE_RESULT_MODE` | suppressed | `suppressed`, `type_tag`, `literal` or `serialized` |
//! | `CALLTRACE_LOG_LEVEL` | info | `tracing-subscriber` filter directive |
//! | `CALLTRACE_LOG_FORMAT` | json | `json` or `pretty` |

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instrument::RenderMode;
use crate::telemetry::{LogConfig, LogFormat};

/// Immutable instrumentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    pub enabled: bool,
    pub log_arguments_on_failure: bool,
    #[serde(rename = "result_mode")]
    pub render_mode: RenderMode,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_arguments_on_failure: true,
            render_mode: RenderMode::Suppressed,
        }
    }
}

impl InstrumentationConfig {
    /// Configuration with instrumentation switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Everything loaded from the environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub instrumentation: InstrumentationConfig,
    pub logging: LogConfig,
}

/// Errors from loading an explicit configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("Invalid config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Parse a boolean env var, returning `default` on missing or invalid.
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Parse a `FromStr` env var, returning `default` on missing or invalid.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Load instrumentation settings from environment.
fn load_instrumentation() -> InstrumentationConfig {
    let defaults = InstrumentationConfig::default();
    InstrumentationConfig {
        enabled: parse_bool("CALLTRACE_ENABLED", defaults.enabled),
        log_arguments_on_failure: parse_bool(
            "CALLTRACE_LOG_ARGS_ON_FAILURE",
            defaults.log_arguments_on_failure,
        ),
        render_mode: parse_or("CALLTRACE_RESULT_MODE", defaults.render_mode),
    }
}

/// Load subscriber settings from environment.
fn load_logging() -> LogConfig {
    let defaults = LogConfig::default();
    let level = std::env::var("CALLTRACE_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(defaults.level);
    LogConfig {
        format: parse_or::<LogFormat>("CALLTRACE_LOG_FORMAT", defaults.format),
        level,
        output_path: None,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    EnvConfig {
        instrumentation: load_instrumentation(),
        logging: load_logging(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    calltrace: InstrumentationConfig,
}

/// Parse instrumentation settings from TOML text with a `[calltrace]` table.
///
/// Keys absent from the table keep their defaults.
pub fn from_toml_str(text: &str) -> Result<InstrumentationConfig, toml::de::Error> {
    toml::from_str::<ConfigFile>(text).map(|file| file.calltrace)
}

/// Load instrumentation settings from a TOML file.
pub fn load_file(path: impl AsRef<Path>) -> Result<InstrumentationConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    from_toml_str(&text).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
