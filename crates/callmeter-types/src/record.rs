//! Record structs for each metric kind.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::MetricKind;

/// Call id attached to records produced outside any call context.
pub const UNKNOWN_CALL_ID: &str = "unknown";

/// Returns the current wall-clock time as float seconds since the Unix epoch.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Language model generation timing.
///
/// `tokens_per_second` is serialised but never read back: deserialising
/// recomputes it from `output_tokens` and `total_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLlmMetric")]
pub struct LlmMetric {
    /// Seconds since the Unix epoch when the record was built.
    pub timestamp: f64,
    /// The call this generation belongs to.
    pub call_id: String,
    /// Time to first token, in seconds.
    pub ttft: f64,
    /// Estimated prompt tokens.
    pub input_tokens: u64,
    /// Estimated completion tokens.
    pub output_tokens: u64,
    /// Model identifier reported by the client.
    pub model: String,
    /// Wall time from request start to the end of the response, in seconds.
    pub total_time: f64,
    tokens_per_second: f64,
}

impl LlmMetric {
    /// Builds a record, deriving `tokens_per_second` from the output tokens
    /// and total time. A zero total time yields a rate of exactly 0.
    pub fn new(
        timestamp: f64,
        call_id: impl Into<String>,
        ttft: f64,
        input_tokens: u64,
        output_tokens: u64,
        model: impl Into<String>,
        total_time: f64,
    ) -> Self {
        let tokens_per_second = if total_time > 0.0 {
            output_tokens as f64 / total_time
        } else {
            0.0
        };

        Self {
            timestamp,
            call_id: call_id.into(),
            ttft,
            input_tokens,
            output_tokens,
            model: model.into(),
            total_time,
            tokens_per_second,
        }
    }

    /// Output throughput in tokens per second.
    pub fn tokens_per_second(&self) -> f64 {
        self.tokens_per_second
    }
}

/// Stored shape of an [`LlmMetric`], minus the derived rate.
#[derive(Deserialize)]
struct RawLlmMetric {
    timestamp: f64,
    call_id: String,
    ttft: f64,
    input_tokens: u64,
    output_tokens: u64,
    model: String,
    total_time: f64,
}

impl From<RawLlmMetric> for LlmMetric {
    fn from(raw: RawLlmMetric) -> Self {
        LlmMetric::new(
            raw.timestamp,
            raw.call_id,
            raw.ttft,
            raw.input_tokens,
            raw.output_tokens,
            raw.model,
            raw.total_time,
        )
    }
}

/// Speech synthesis timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsMetric {
    pub timestamp: f64,
    pub call_id: String,
    /// Time to first audio byte, in seconds.
    pub ttfb: f64,
    /// Estimated duration of the synthesized audio, in seconds.
    pub audio_duration: f64,
    /// Length of the synthesized text, in characters.
    pub text_length: u64,
    pub model: String,
    pub voice_id: String,
}

/// Speech recognition timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrMetric {
    pub timestamp: f64,
    pub call_id: String,
    /// Estimated duration of the recognized audio, in seconds.
    pub audio_duration: f64,
    /// Time until the first transcript arrived, in seconds.
    pub processing_time: f64,
    /// Length of the transcript, in characters.
    pub text_length: u64,
    pub model: String,
    pub language: String,
}

/// End-of-utterance detection timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EouMetric {
    pub timestamp: f64,
    pub call_id: String,
    /// Delay between the end of speech and the turn boundary, in seconds.
    pub eou_delay: f64,
    /// Detector confidence in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

/// A stored metric of any kind.
///
/// Serialised as the inner record's fields plus a `metric_type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric_type", rename_all = "lowercase")]
pub enum MetricRecord {
    Llm(LlmMetric),
    Tts(TtsMetric),
    Asr(AsrMetric),
    Eou(EouMetric),
}

impl MetricRecord {
    /// Returns the kind tag for this record.
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Llm(_) => MetricKind::Llm,
            Self::Tts(_) => MetricKind::Tts,
            Self::Asr(_) => MetricKind::Asr,
            Self::Eou(_) => MetricKind::Eou,
        }
    }

    /// Returns the call this record belongs to.
    pub fn call_id(&self) -> &str {
        match self {
            Self::Llm(m) => &m.call_id,
            Self::Tts(m) => &m.call_id,
            Self::Asr(m) => &m.call_id,
            Self::Eou(m) => &m.call_id,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            Self::Llm(m) => m.timestamp,
            Self::Tts(m) => m.timestamp,
            Self::Asr(m) => m.timestamp,
            Self::Eou(m) => m.timestamp,
        }
    }
}

impl From<LlmMetric> for MetricRecord {
    fn from(metric: LlmMetric) -> Self {
        Self::Llm(metric)
    }
}

impl From<TtsMetric> for MetricRecord {
    fn from(metric: TtsMetric) -> Self {
        Self::Tts(metric)
    }
}

impl From<AsrMetric> for MetricRecord {
    fn from(metric: AsrMetric) -> Self {
        Self::Asr(metric)
    }
}

impl From<EouMetric> for MetricRecord {
    fn from(metric: EouMetric) -> Self {
        Self::Eou(metric)
    }
}
