//! Per-call record sets and their summaries.

use callmeter_types::{AsrMetric, EouMetric, LlmMetric, MetricRecord, TtsMetric};
use serde::{Serialize, Serializer};

use crate::analytics::LatencyStats;

/// Every record of a call (or of the whole store), grouped by kind.
///
/// Serialises as `{"llm": [...], "tts": [...], "asr": [...], "eou": [...]}`
/// where each element carries its `metric_type` tag, the same shape the
/// storage backends persist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallMetrics {
    #[serde(serialize_with = "tagged")]
    pub llm: Vec<LlmMetric>,
    #[serde(serialize_with = "tagged")]
    pub tts: Vec<TtsMetric>,
    #[serde(serialize_with = "tagged")]
    pub asr: Vec<AsrMetric>,
    #[serde(serialize_with = "tagged")]
    pub eou: Vec<EouMetric>,
}

fn tagged<S, T>(records: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Clone + Into<MetricRecord>,
{
    serializer.collect_seq(records.iter().cloned().map(Into::into))
}

impl CallMetrics {
    /// Groups a mixed record list by kind, preserving order within a kind.
    pub fn from_records(records: impl IntoIterator<Item = MetricRecord>) -> Self {
        let mut grouped = Self::default();
        for record in records {
            match record {
                MetricRecord::Llm(m) => grouped.llm.push(m),
                MetricRecord::Tts(m) => grouped.tts.push(m),
                MetricRecord::Asr(m) => grouped.asr.push(m),
                MetricRecord::Eou(m) => grouped.eou.push(m),
            }
        }
        grouped
    }

    pub fn len(&self) -> usize {
        self.llm.len() + self.tts.len() + self.asr.len() + self.eou.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Record counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub llm_requests: usize,
    pub tts_requests: usize,
    pub asr_requests: usize,
    pub eou_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmSummary {
    pub avg_ttft: f64,
    pub max_ttft: f64,
    pub min_ttft: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtsSummary {
    pub avg_ttfb: f64,
    pub max_ttfb: f64,
    pub min_ttfb: f64,
    pub total_audio_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsrSummary {
    pub avg_processing_time: f64,
    pub max_processing_time: f64,
    pub min_processing_time: f64,
    pub total_audio_processed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EouSummary {
    pub avg_delay: f64,
    pub max_delay: f64,
    pub min_delay: f64,
}

/// Aggregated view of one call.
///
/// A kind with no records has no block at all rather than a block of
/// zeroes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSummary {
    pub call_id: Option<String>,
    /// ISO 8601 time at which the summary was computed.
    pub timestamp: String,
    pub counts: SummaryCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr: Option<AsrSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eou: Option<EouSummary>,
}

impl CallSummary {
    pub fn compute(call_id: Option<String>, metrics: &CallMetrics) -> Self {
        let counts = SummaryCounts {
            llm_requests: metrics.llm.len(),
            tts_requests: metrics.tts.len(),
            asr_requests: metrics.asr.len(),
            eou_events: metrics.eou.len(),
        };

        let llm = LatencyStats::from_values(metrics.llm.iter().map(|m| m.ttft)).map(|s| {
            LlmSummary {
                avg_ttft: s.avg,
                max_ttft: s.max,
                min_ttft: s.min,
                total_input_tokens: metrics.llm.iter().map(|m| m.input_tokens).sum(),
                total_output_tokens: metrics.llm.iter().map(|m| m.output_tokens).sum(),
            }
        });

        let tts = LatencyStats::from_values(metrics.tts.iter().map(|m| m.ttfb)).map(|s| {
            TtsSummary {
                avg_ttfb: s.avg,
                max_ttfb: s.max,
                min_ttfb: s.min,
                total_audio_duration: metrics.tts.iter().map(|m| m.audio_duration).sum(),
            }
        });

        let asr = LatencyStats::from_values(metrics.asr.iter().map(|m| m.processing_time)).map(
            |s| AsrSummary {
                avg_processing_time: s.avg,
                max_processing_time: s.max,
                min_processing_time: s.min,
                total_audio_processed: metrics.asr.iter().map(|m| m.audio_duration).sum(),
            },
        );

        let eou =
            LatencyStats::from_values(metrics.eou.iter().map(|m| m.eou_delay)).map(|s| EouSummary {
                avg_delay: s.avg,
                max_delay: s.max,
                min_delay: s.min,
            });

        Self {
            call_id,
            timestamp: chrono::Local::now().to_rfc3339(),
            counts,
            llm,
            tts,
            asr,
            eou,
        }
    }
}
