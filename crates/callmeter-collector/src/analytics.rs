//! Latency statistics and cross-call performance analytics.

use callmeter_types::MetricKind;
use serde::Serialize;

use crate::report::CallMetrics;

/// Average, minimum and maximum of a non-empty sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LatencyStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl LatencyStats {
    /// Returns `None` for an empty sample.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Self {
            avg: sum / count as f64,
            min,
            max,
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Nearest-rank 95th percentile: the element at `floor(0.95 * n)` of the
/// ascending sort, clamped to the last index. Not interpolated.
///
/// Sorts a copy on every call. Returns `None` for an empty sample.
pub fn p95_nearest_rank(values: &[f64]) -> Option<f64> {
    match values.len() {
        0 => None,
        1 => Some(values[0]),
        n => {
            let mut sorted = values.to_vec();
            sorted.sort_by(f64::total_cmp);
            let idx = ((n as f64 * 0.95).floor() as usize).min(n - 1);
            Some(sorted[idx])
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmAnalytics {
    pub count: usize,
    pub avg_ttft: f64,
    pub p95_ttft: f64,
    pub avg_total_time: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtsAnalytics {
    pub count: usize,
    pub avg_ttfb: f64,
    pub p95_ttfb: f64,
    pub total_audio_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsrAnalytics {
    pub count: usize,
    pub avg_processing_time: f64,
    pub p95_processing_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EouAnalytics {
    pub count: usize,
    pub avg_delay: f64,
    pub p95_delay: f64,
}

/// Performance aggregates per kind. Kinds with no records, or excluded by
/// the kind filter, are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceAnalytics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmAnalytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsAnalytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr: Option<AsrAnalytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eou: Option<EouAnalytics>,
}

impl PerformanceAnalytics {
    pub fn compute(metrics: &CallMetrics, kind: Option<MetricKind>) -> Self {
        let wants = |k: MetricKind| kind.map_or(true, |only| only == k);
        let mut analytics = Self::default();

        if wants(MetricKind::Llm) && !metrics.llm.is_empty() {
            let ttfts: Vec<f64> = metrics.llm.iter().map(|m| m.ttft).collect();
            let totals: Vec<f64> = metrics.llm.iter().map(|m| m.total_time).collect();
            analytics.llm = p95_nearest_rank(&ttfts).map(|p95| LlmAnalytics {
                count: ttfts.len(),
                avg_ttft: mean(&ttfts),
                p95_ttft: p95,
                avg_total_time: mean(&totals),
                total_input_tokens: metrics.llm.iter().map(|m| m.input_tokens).sum(),
                total_output_tokens: metrics.llm.iter().map(|m| m.output_tokens).sum(),
            });
        }

        if wants(MetricKind::Tts) && !metrics.tts.is_empty() {
            let ttfbs: Vec<f64> = metrics.tts.iter().map(|m| m.ttfb).collect();
            analytics.tts = p95_nearest_rank(&ttfbs).map(|p95| TtsAnalytics {
                count: ttfbs.len(),
                avg_ttfb: mean(&ttfbs),
                p95_ttfb: p95,
                total_audio_duration: metrics.tts.iter().map(|m| m.audio_duration).sum(),
            });
        }

        if wants(MetricKind::Asr) && !metrics.asr.is_empty() {
            let times: Vec<f64> = metrics.asr.iter().map(|m| m.processing_time).collect();
            analytics.asr = p95_nearest_rank(&times).map(|p95| AsrAnalytics {
                count: times.len(),
                avg_processing_time: mean(&times),
                p95_processing_time: p95,
            });
        }

        if wants(MetricKind::Eou) && !metrics.eou.is_empty() {
            let delays: Vec<f64> = metrics.eou.iter().map(|m| m.eou_delay).collect();
            analytics.eou = p95_nearest_rank(&delays).map(|p95| EouAnalytics {
                count: delays.len(),
                avg_delay: mean(&delays),
                p95_delay: p95,
            });
        }

        analytics
    }

    pub fn is_empty(&self) -> bool {
        self.llm.is_none() && self.tts.is_none() && self.asr.is_none() && self.eou.is_none()
    }
}
