//! Metrics collection and analytics for voice-agent calls.
//!
//! [`MetricsCollector`] is the single writer of metric records. Producers
//! (instrumentation adapters, the conversational session) call its
//! `record_*` methods, which are synchronous and cheap: the enable flags and
//! the sampling draw are evaluated inline, and only accepted records are
//! handed to a background task that writes them to the configured
//! [`MetricsStorage`](callmeter_store::MetricsStorage). A slow or failing
//! backend therefore never adds latency to a conversational turn.
//!
//! Consumers (the query service, dashboards) read through
//! [`MetricsCollector::get_call_metrics`], [`MetricsCollector::get_call_summary`]
//! and [`MetricsCollector::performance_analytics`].
//!
//! Writes are not ordered with respect to queries: a query issued right
//! after a `record_*` call may miss that record unless
//! [`MetricsCollector::flush`] is awaited first.

mod analytics;
mod collector;
mod config;
mod report;

pub use analytics::{
    p95_nearest_rank, AsrAnalytics, EouAnalytics, LlmAnalytics, PerformanceAnalytics,
    TtsAnalytics,
};
pub use collector::MetricsCollector;
pub use config::{ConfigError, MetricsConfig, StorageType};
pub use report::{
    AsrSummary, CallMetrics, CallSummary, EouSummary, LlmSummary, SummaryCounts, TtsSummary,
};
