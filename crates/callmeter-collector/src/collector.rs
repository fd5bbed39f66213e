use callmeter_store::{open_storage, MemoryStorage, MetricFilter, MetricsStorage, StoreError};
use callmeter_types::{
    unix_timestamp, AsrMetric, EouMetric, LlmMetric, MetricKind, MetricRecord, TtsMetric,
    UNKNOWN_CALL_ID,
};
use rand::Rng;
use std::sync::{Arc, RwLock};
use tokio_util::task::TaskTracker;

use crate::analytics::PerformanceAnalytics;
use crate::config::{ConfigError, MetricsConfig};
use crate::report::{CallMetrics, CallSummary};

/// Owns the storage backend and the current call context, gates every
/// observation through the enable flags and the sampling rate, and answers
/// per-call and cross-call queries.
///
/// Constructed once at process start and shared as `Arc<MetricsCollector>`
/// with every component that records or queries metrics. Call
/// [`cleanup`](Self::cleanup) on the shutdown path.
pub struct MetricsCollector {
    config: MetricsConfig,
    storage: Arc<dyn MetricsStorage>,
    call_id: RwLock<Option<String>>,
    writes: TaskTracker,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("config", &self.config)
            .field("storage", &self.storage.name())
            .field("call_id", &self.call_id())
            .finish_non_exhaustive()
    }
}

impl MetricsCollector {
    /// Validates `config` and opens its storage backend.
    ///
    /// A disabled configuration always gets an inert in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn new(config: MetricsConfig) -> Result<Self, ConfigError> {
        let storage: Arc<dyn MetricsStorage> = if config.enabled {
            open_storage(&config.storage_settings())
        } else {
            Arc::new(MemoryStorage::new())
        };
        Self::with_storage(config, storage)
    }

    /// Uses a caller-supplied backend instead of the configured one.
    pub fn with_storage(
        config: MetricsConfig,
        storage: Arc<dyn MetricsStorage>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            enabled = config.enabled,
            storage = storage.name(),
            sample_rate = config.sample_rate,
            "metrics collector initialised"
        );
        Ok(Self {
            config,
            storage,
            call_id: RwLock::new(None),
            writes: TaskTracker::new(),
        })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether records of `kind` can be recorded at all (ignoring sampling).
    pub fn collects(&self, kind: MetricKind) -> bool {
        self.config.enabled && self.config.collects(kind)
    }

    /// Label of the active storage backend.
    pub fn storage_name(&self) -> &'static str {
        self.storage.name()
    }

    /// The shared storage backend.
    pub fn storage(&self) -> &Arc<dyn MetricsStorage> {
        &self.storage
    }

    /// Sets the call that subsequent records belong to.
    pub fn set_call_id(&self, call_id: impl Into<String>) {
        let call_id = call_id.into();
        tracing::debug!(call_id = %call_id, "metrics call context set");
        *self.call_id.write().unwrap_or_else(|e| e.into_inner()) = Some(call_id);
    }

    pub fn call_id(&self) -> Option<String> {
        self.call_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn current_call_id(&self) -> String {
        self.call_id().unwrap_or_else(|| UNKNOWN_CALL_ID.to_string())
    }

    /// Enable flags first, then one independent Bernoulli draw.
    fn should_collect(&self, kind: MetricKind) -> bool {
        self.collects(kind) && rand::thread_rng().gen::<f64>() < self.config.sample_rate
    }

    /// Hands `record` to a background write. Failures are logged and
    /// dropped; they never reach the recording call site.
    fn schedule(&self, record: MetricRecord) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                metric_type = record.kind().as_str(),
                "no async runtime available, dropping metric"
            );
            return false;
        };

        let storage = self.storage.clone();
        self.writes.spawn_on(
            async move {
                let kind = record.kind();
                let call_id = record.call_id().to_string();
                if let Err(e) = storage.store_metric(record).await {
                    tracing::warn!(
                        metric_type = kind.as_str(),
                        call_id = %call_id,
                        storage = storage.name(),
                        "failed to store metric: {}",
                        e
                    );
                }
            },
            &handle,
        );
        true
    }

    /// Records one language model generation. Returns whether a write was
    /// scheduled.
    pub fn record_llm_metric(
        &self,
        ttft: f64,
        input_tokens: u64,
        output_tokens: u64,
        model: &str,
        total_time: f64,
    ) -> bool {
        if !self.should_collect(MetricKind::Llm) {
            return false;
        }
        let metric = LlmMetric::new(
            unix_timestamp(),
            self.current_call_id(),
            ttft,
            input_tokens,
            output_tokens,
            model,
            total_time,
        );
        tracing::debug!(
            ttft,
            input_tokens,
            output_tokens,
            "llm metric recorded"
        );
        self.schedule(metric.into())
    }

    /// Records one speech synthesis request.
    pub fn record_tts_metric(
        &self,
        ttfb: f64,
        audio_duration: f64,
        text_length: u64,
        model: &str,
        voice_id: &str,
    ) -> bool {
        if !self.should_collect(MetricKind::Tts) {
            return false;
        }
        let metric = TtsMetric {
            timestamp: unix_timestamp(),
            call_id: self.current_call_id(),
            ttfb,
            audio_duration,
            text_length,
            model: model.to_string(),
            voice_id: voice_id.to_string(),
        };
        tracing::debug!(ttfb, audio_duration, "tts metric recorded");
        self.schedule(metric.into())
    }

    /// Records one speech recognition result.
    pub fn record_asr_metric(
        &self,
        audio_duration: f64,
        processing_time: f64,
        text_length: u64,
        model: &str,
        language: &str,
    ) -> bool {
        if !self.should_collect(MetricKind::Asr) {
            return false;
        }
        let metric = AsrMetric {
            timestamp: unix_timestamp(),
            call_id: self.current_call_id(),
            audio_duration,
            processing_time,
            text_length,
            model: model.to_string(),
            language: language.to_string(),
        };
        tracing::debug!(processing_time, text_length, "asr metric recorded");
        self.schedule(metric.into())
    }

    /// Records one end-of-utterance detection. Pass `1.0` as `confidence`
    /// when the detector reports none.
    pub fn record_eou_metric(&self, eou_delay: f64, confidence: f64) -> bool {
        if !self.should_collect(MetricKind::Eou) {
            return false;
        }
        let metric = EouMetric {
            timestamp: unix_timestamp(),
            call_id: self.current_call_id(),
            eou_delay,
            confidence,
        };
        tracing::debug!(eou_delay, "eou metric recorded");
        self.schedule(metric.into())
    }

    /// Waits until every scheduled write has finished.
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// All records of one call grouped by kind.
    ///
    /// `None` falls back to the current call id; if that is unset too, no
    /// call filter is applied.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub async fn get_call_metrics(
        &self,
        call_id: Option<&str>,
    ) -> Result<CallMetrics, StoreError> {
        let filter = MetricFilter {
            call_id: call_id.map(str::to_string).or_else(|| self.call_id()),
            kind: None,
        };
        let records = self.storage.get_metrics(&filter).await?;
        Ok(CallMetrics::from_records(records))
    }

    /// Every stored record grouped by kind. Cost is linear in the total
    /// number of stored records.
    pub async fn all_metrics(&self) -> Result<CallMetrics, StoreError> {
        let records = self.storage.get_metrics(&MetricFilter::default()).await?;
        Ok(CallMetrics::from_records(records))
    }

    /// Counts and latency aggregates for one call.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub async fn get_call_summary(&self, call_id: Option<&str>) -> Result<CallSummary, StoreError> {
        let metrics = self.get_call_metrics(call_id).await?;
        let call_id = call_id.map(str::to_string).or_else(|| self.call_id());
        Ok(CallSummary::compute(call_id, &metrics))
    }

    /// Average and p95 latency per kind, for one call or across all calls.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub async fn performance_analytics(
        &self,
        call_id: Option<&str>,
        kind: Option<MetricKind>,
    ) -> Result<PerformanceAnalytics, StoreError> {
        let metrics = match call_id {
            Some(call_id) => self.get_call_metrics(Some(call_id)).await?,
            None => self.all_metrics().await?,
        };
        Ok(PerformanceAnalytics::compute(&metrics, kind))
    }

    /// Drains pending writes, then releases the backend.
    pub async fn cleanup(&self) {
        self.flush().await;
        match self.storage.cleanup().await {
            Ok(()) => tracing::info!(storage = self.storage.name(), "metrics storage released"),
            Err(e) => tracing::warn!(
                storage = self.storage.name(),
                "failed to release metrics storage: {}",
                e
            ),
        }
    }
}
