//! Shared metric record types for the callmeter workspace.
//!
//! Every timed vendor operation in a call produces exactly one immutable
//! record of one of four kinds:
//!
//! | Kind | Record | Primary latency |
//! |------|--------|-----------------|
//! | `llm` | [`LlmMetric`] | `ttft` |
//! | `tts` | [`TtsMetric`] | `ttfb` |
//! | `asr` | [`AsrMetric`] | `processing_time` |
//! | `eou` | [`EouMetric`] | `eou_delay` |
//!
//! Records are wrapped in [`MetricRecord`] when they cross a storage
//! boundary. Its serde form is a flat JSON object carrying the record's own
//! fields plus a `metric_type` tag, which is the line format of the JSONL
//! file backend and the value format of the Redis backend.

mod record;

pub use record::{
    unix_timestamp, AsrMetric, EouMetric, LlmMetric, MetricRecord, TtsMetric, UNKNOWN_CALL_ID,
};

use serde::{Deserialize, Serialize};

/// The four metric categories a call can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Language model generation.
    Llm,
    /// Speech synthesis.
    Tts,
    /// Speech recognition.
    Asr,
    /// End-of-utterance detection.
    Eou,
}

impl MetricKind {
    /// All kinds in canonical order.
    pub const ALL: [MetricKind; 4] = [Self::Llm, Self::Tts, Self::Asr, Self::Eou];

    /// Returns the canonical string label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Tts => "tts",
            Self::Asr => "asr",
            Self::Eou => "eou",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = ParseMetricKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "llm" => Ok(Self::Llm),
            "tts" => Ok(Self::Tts),
            "asr" => Ok(Self::Asr),
            "eou" => Ok(Self::Eou),
            _ => Err(ParseMetricKindError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown metric kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMetricKindError(pub String);

impl std::fmt::Display for ParseMetricKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid metric type: {}. Expected one of: llm, tts, asr, eou",
            self.0
        )
    }
}

impl std::error::Error for ParseMetricKindError {}
