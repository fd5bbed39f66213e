//! Server configuration loading from file and environment variables.

use callmeter_collector::MetricsConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics collection and storage settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "callmeter_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    1236
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[metrics]` section or a `METRICS_*` variable is invalid.
    #[error("invalid metrics configuration: {0}")]
    Metrics(#[from] callmeter_collector::ConfigError),
}

/// Loads configuration from a TOML file, falling back to defaults, with
/// overrides from the process environment.
///
/// Environment variable overrides:
/// - `CALLMETER_HOST` overrides `server.host`
/// - `CALLMETER_PORT` overrides `server.port`
/// - `CALLMETER_LOG_LEVEL` overrides `logging.level`
/// - `CALLMETER_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `METRICS_*` override the `[metrics]` section
///   (see [`MetricsConfig::apply_overrides`])
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if the resulting metrics settings are invalid.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |var| std::env::var(var).ok())
}

/// [`load_config`] with an explicit variable lookup.
pub fn load_config_with<F>(path: Option<&str>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(host) = lookup("CALLMETER_HOST") {
        match host.parse() {
            Ok(parsed) => config.server.host = parsed,
            Err(_) => tracing::warn!(value = %host, "ignoring unparseable CALLMETER_HOST"),
        }
    }
    if let Some(port) = lookup("CALLMETER_PORT") {
        match port.parse() {
            Ok(parsed) => config.server.port = parsed,
            Err(_) => tracing::warn!(value = %port, "ignoring unparseable CALLMETER_PORT"),
        }
    }
    if let Some(level) = lookup("CALLMETER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("CALLMETER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    config.metrics.apply_overrides(&lookup)?;
    config.metrics.validate()?;

    Ok(config)
}
