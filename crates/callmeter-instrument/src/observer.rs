//! Per-request timing observers.
//!
//! An observer is created for exactly one vendor request. The adapter calls
//! [`MetricObserver::start_timer`] before issuing the request, then feeds it
//! the first successful chunk and the accumulated text at the end of the
//! response. Each observer records at most one metric.

use callmeter_collector::MetricsCollector;
use std::sync::Arc;
use tokio::time::Instant;

use crate::estimate::Estimators;

/// The narrow interface between a response stream and a metric kind.
pub trait MetricObserver: Send {
    fn start_timer(&mut self);

    /// Called once, with the text of the first successful chunk.
    fn observe_first_chunk(&mut self, text: Option<&str>);

    /// Called once when the response ends successfully, with all chunk text
    /// concatenated.
    fn observe_completion(&mut self, text: &str);

    /// Called when the response fails. Nothing is recorded afterwards.
    fn observe_error(&mut self) {}
}

/// Seconds since `started`, or zero if the timer never started.
fn elapsed(started: Option<Instant>) -> f64 {
    started.map_or(0.0, |s| s.elapsed().as_secs_f64())
}

/// Language model generation: ttft at first chunk, token counts from the
/// prompt and the full response, recorded at completion.
pub struct LlmObserver {
    collector: Arc<MetricsCollector>,
    estimators: Estimators,
    model: String,
    input_tokens: u64,
    started: Option<Instant>,
    ttft: Option<f64>,
    done: bool,
}

impl LlmObserver {
    pub fn new(
        collector: Arc<MetricsCollector>,
        estimators: Estimators,
        model: impl Into<String>,
        prompt_text: &str,
    ) -> Self {
        Self {
            collector,
            input_tokens: (estimators.tokens)(prompt_text),
            estimators,
            model: model.into(),
            started: None,
            ttft: None,
            done: false,
        }
    }
}

impl MetricObserver for LlmObserver {
    fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    fn observe_first_chunk(&mut self, _text: Option<&str>) {
        if self.ttft.is_none() {
            let ttft = elapsed(self.started);
            tracing::debug!(model = %self.model, ttft, "llm first token");
            self.ttft = Some(ttft);
        }
    }

    fn observe_completion(&mut self, text: &str) {
        if self.done {
            return;
        }
        self.done = true;
        let total_time = elapsed(self.started);
        let ttft = self.ttft.unwrap_or(total_time);
        let output_tokens = (self.estimators.tokens)(text);
        self.collector.record_llm_metric(
            ttft,
            self.input_tokens,
            output_tokens,
            &self.model,
            total_time,
        );
    }

    fn observe_error(&mut self) {
        self.done = true;
    }
}

/// Speech synthesis: recorded as soon as the first audio chunk arrives.
pub struct TtsObserver {
    collector: Arc<MetricsCollector>,
    estimators: Estimators,
    model: String,
    voice_id: String,
    text_length: usize,
    started: Option<Instant>,
    done: bool,
}

impl TtsObserver {
    pub fn new(
        collector: Arc<MetricsCollector>,
        estimators: Estimators,
        model: impl Into<String>,
        voice_id: impl Into<String>,
        text: &str,
    ) -> Self {
        Self {
            collector,
            estimators,
            model: model.into(),
            voice_id: voice_id.into(),
            text_length: text.chars().count(),
            started: None,
            done: false,
        }
    }

    fn record(&mut self, ttfb: f64) {
        if self.done {
            return;
        }
        self.done = true;
        let audio_duration = (self.estimators.tts_audio)(self.text_length);
        self.collector.record_tts_metric(
            ttfb,
            audio_duration,
            self.text_length as u64,
            &self.model,
            &self.voice_id,
        );
    }
}

impl MetricObserver for TtsObserver {
    fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    fn observe_first_chunk(&mut self, _text: Option<&str>) {
        let ttfb = elapsed(self.started);
        tracing::debug!(model = %self.model, ttfb, "tts first audio");
        self.record(ttfb);
    }

    // Only reached with `done` unset when the stream produced no audio.
    fn observe_completion(&mut self, _text: &str) {
        let total = elapsed(self.started);
        self.record(total);
    }

    fn observe_error(&mut self) {
        self.done = true;
    }
}

/// Speech recognition: recorded at the first transcript chunk.
pub struct AsrObserver {
    collector: Arc<MetricsCollector>,
    estimators: Estimators,
    model: String,
    language: String,
    started: Option<Instant>,
    done: bool,
}

impl AsrObserver {
    pub fn new(
        collector: Arc<MetricsCollector>,
        estimators: Estimators,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            collector,
            estimators,
            model: model.into(),
            language: language.into(),
            started: None,
            done: false,
        }
    }

    fn record(&mut self, processing_time: f64, text: Option<&str>) {
        if self.done {
            return;
        }
        self.done = true;
        let text_length = text.map_or(0, |t| t.chars().count()) as u64;
        let audio_duration = (self.estimators.asr_audio)(processing_time);
        self.collector.record_asr_metric(
            audio_duration,
            processing_time,
            text_length,
            &self.model,
            &self.language,
        );
    }
}

impl MetricObserver for AsrObserver {
    fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    fn observe_first_chunk(&mut self, text: Option<&str>) {
        let processing_time = elapsed(self.started);
        tracing::debug!(model = %self.model, processing_time, "asr first transcript");
        self.record(processing_time, text);
    }

    fn observe_completion(&mut self, _text: &str) {
        let total = elapsed(self.started);
        self.record(total, None);
    }

    fn observe_error(&mut self) {
        self.done = true;
    }
}

/// Measures end-of-utterance delay: start it when the user stops speaking,
/// finish it when the turn detector commits.
#[derive(Debug)]
pub struct EouTimer {
    collector: Arc<MetricsCollector>,
    started: Instant,
}

impl EouTimer {
    pub fn start(collector: Arc<MetricsCollector>) -> Self {
        Self {
            collector,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Records the delay. Returns whether a write was scheduled.
    pub fn finish(self, confidence: f64) -> bool {
        let delay = self.elapsed();
        self.collector.record_eou_metric(delay, confidence)
    }
}
