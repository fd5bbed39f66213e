//! Metrics collection settings.

use callmeter_store::{RedisSettings, StorageSettings};
use callmeter_types::MetricKind;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Which storage backend the collector persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Memory,
    File,
    Redis,
}

impl std::str::FromStr for StorageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "redis" => Ok(Self::Redis),
            other => Err(ConfigError::UnknownStorageType(other.to_string())),
        }
    }
}

/// Collection switches, sampling and backend connection parameters.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Master switch. When off, nothing is recorded and the query service
    /// reports collection as unavailable.
    pub enabled: bool,
    pub storage_type: StorageType,

    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: i64,
    pub redis_password: Option<String>,

    /// JSONL file used by the `file` backend.
    pub file_path: PathBuf,

    pub collect_llm_metrics: bool,
    pub collect_tts_metrics: bool,
    pub collect_asr_metrics: bool,
    pub collect_eou_metrics: bool,

    /// Probability in `[0, 1]` that an eligible event is persisted.
    pub sample_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let redis = RedisSettings::default();
        Self {
            enabled: true,
            storage_type: StorageType::Memory,
            redis_host: redis.host,
            redis_port: redis.port,
            redis_db: redis.db,
            redis_password: None,
            file_path: PathBuf::from("./metrics.jsonl"),
            collect_llm_metrics: true,
            collect_tts_metrics: true,
            collect_asr_metrics: true,
            collect_eou_metrics: true,
            sample_rate: 1.0,
        }
    }
}

impl std::fmt::Debug for MetricsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsConfig")
            .field("enabled", &self.enabled)
            .field("storage_type", &self.storage_type)
            .field("redis_host", &self.redis_host)
            .field("redis_port", &self.redis_port)
            .field("redis_db", &self.redis_db)
            .field(
                "redis_password",
                &self.redis_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("file_path", &self.file_path)
            .field("collect_llm_metrics", &self.collect_llm_metrics)
            .field("collect_tts_metrics", &self.collect_tts_metrics)
            .field("collect_asr_metrics", &self.collect_asr_metrics)
            .field("collect_eou_metrics", &self.collect_eou_metrics)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Errors raised while loading or validating metrics settings. All of
/// them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("unknown metrics storage type: {0:?} (expected memory, file or redis)")]
    UnknownStorageType(String),

    #[error("sample rate must be within [0, 1], got {0}")]
    SampleRate(f64),
}

impl MetricsConfig {
    /// Applies overrides looked up by variable name.
    ///
    /// Recognised variables: `METRICS_ENABLED`, `METRICS_STORAGE_TYPE`,
    /// `METRICS_REDIS_HOST`, `METRICS_REDIS_PORT`, `METRICS_REDIS_DB`,
    /// `METRICS_REDIS_PASSWORD`, `METRICS_FILE_PATH`,
    /// `METRICS_COLLECT_LLM`, `METRICS_COLLECT_TTS`, `METRICS_COLLECT_ASR`,
    /// `METRICS_COLLECT_EOU`, `METRICS_SAMPLE_RATE`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("METRICS_ENABLED") {
            self.enabled = parse_bool("METRICS_ENABLED", &v)?;
        }
        if let Some(v) = lookup("METRICS_STORAGE_TYPE") {
            self.storage_type = v.parse()?;
        }
        if let Some(v) = lookup("METRICS_REDIS_HOST") {
            self.redis_host = v;
        }
        if let Some(v) = lookup("METRICS_REDIS_PORT") {
            self.redis_port = parse_num("METRICS_REDIS_PORT", &v)?;
        }
        if let Some(v) = lookup("METRICS_REDIS_DB") {
            self.redis_db = parse_num("METRICS_REDIS_DB", &v)?;
        }
        if let Some(v) = lookup("METRICS_REDIS_PASSWORD") {
            self.redis_password = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("METRICS_FILE_PATH") {
            self.file_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("METRICS_COLLECT_LLM") {
            self.collect_llm_metrics = parse_bool("METRICS_COLLECT_LLM", &v)?;
        }
        if let Some(v) = lookup("METRICS_COLLECT_TTS") {
            self.collect_tts_metrics = parse_bool("METRICS_COLLECT_TTS", &v)?;
        }
        if let Some(v) = lookup("METRICS_COLLECT_ASR") {
            self.collect_asr_metrics = parse_bool("METRICS_COLLECT_ASR", &v)?;
        }
        if let Some(v) = lookup("METRICS_COLLECT_EOU") {
            self.collect_eou_metrics = parse_bool("METRICS_COLLECT_EOU", &v)?;
        }
        if let Some(v) = lookup("METRICS_SAMPLE_RATE") {
            self.sample_rate = parse_num("METRICS_SAMPLE_RATE", &v)?;
        }
        Ok(())
    }

    /// Checks invariants that deserialisation cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// Whether records of `kind` are collected at all.
    pub fn collects(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Llm => self.collect_llm_metrics,
            MetricKind::Tts => self.collect_tts_metrics,
            MetricKind::Asr => self.collect_asr_metrics,
            MetricKind::Eou => self.collect_eou_metrics,
        }
    }

    /// Backend selection with its connection parameters.
    pub fn storage_settings(&self) -> StorageSettings {
        match self.storage_type {
            StorageType::Memory => StorageSettings::Memory,
            StorageType::File => StorageSettings::File {
                path: self.file_path.clone(),
            },
            StorageType::Redis => StorageSettings::Redis(RedisSettings {
                host: self.redis_host.clone(),
                port: self.redis_port,
                db: self.redis_db,
                password: self.redis_password.clone(),
            }),
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected true or false",
        }),
    }
}

fn parse_num<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: "expected a number",
    })
}
