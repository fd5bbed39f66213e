//! Metrics query API handlers.
//!
//! Provides:
//! - `GET /metrics/calls/{call_id}`: every record of a call, grouped by kind
//! - `GET /metrics/calls/{call_id}/summary`: counts and latency aggregates
//! - `GET /metrics/calls/{call_id}/{metric_type}`: one kind, optionally limited
//! - `GET /metrics/analytics/performance`: averages and p95 latencies
//! - `POST /metrics/test`: writes one synthetic record per kind
//!
//! Every handler answers `503` when metrics collection is not running.

use crate::AppState;
use callmeter_collector::{CallMetrics, CallSummary, MetricsCollector, PerformanceAnalytics};
use callmeter_store::{MetricFilter, StoreError};
use callmeter_types::{MetricKind, MetricRecord};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Call id the smoke-test endpoint writes under.
pub const TEST_CALL_ID: &str = "test_call_123";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("metrics storage query failed: {}", e);
        ApiError::InternalServerError(e.to_string())
    }
}

fn collector(state: &AppState) -> Result<&Arc<MetricsCollector>, ApiError> {
    state
        .collector
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Metrics collection not available".into()))
}

fn parse_kind(value: &str) -> Result<MetricKind, ApiError> {
    value
        .parse()
        .map_err(|e: callmeter_types::ParseMetricKindError| ApiError::BadRequest(e.to_string()))
}

/// Handler for `GET /metrics/calls/{call_id}`.
pub async fn get_call_metrics_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Result<Json<CallMetrics>, ApiError> {
    let collector = collector(&state)?;
    let metrics = collector.get_call_metrics(Some(&call_id)).await?;
    Ok(Json(metrics))
}

/// Handler for `GET /metrics/calls/{call_id}/summary`.
pub async fn get_call_summary_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Result<Json<CallSummary>, ApiError> {
    let collector = collector(&state)?;
    let summary = collector.get_call_summary(Some(&call_id)).await?;
    Ok(Json(summary))
}

/// Query parameters for `GET /metrics/calls/{call_id}/{metric_type}`.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    /// Maximum number of records to return. Zero or absent returns all.
    pub limit: Option<String>,
}

/// Response body for a single-kind record listing.
#[derive(Debug, Serialize)]
pub struct MetricsListResponse {
    pub metrics: Vec<MetricRecord>,
    pub count: usize,
}

/// Handler for `GET /metrics/calls/{call_id}/{metric_type}`.
pub async fn get_call_metrics_by_type_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((call_id, metric_type)): Path<(String, String)>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<MetricsListResponse>, ApiError> {
    let collector = collector(&state)?;
    let kind = parse_kind(&metric_type)?;

    let limit = match params.limit.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest(format!("invalid limit: {}", raw)))?,
    };

    let mut metrics = collector
        .storage()
        .get_metrics(&MetricFilter::for_call(call_id, Some(kind)))
        .await?;
    if limit > 0 {
        metrics.truncate(limit);
    }

    Ok(Json(MetricsListResponse {
        count: metrics.len(),
        metrics,
    }))
}

/// Query parameters for `GET /metrics/analytics/performance`.
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// Restrict to one call. Absent means every stored call.
    pub call_id: Option<String>,
    /// Restrict to one kind (`llm`, `tts`, `asr`, `eou`).
    pub metric_type: Option<String>,
}

/// Handler for `GET /metrics/analytics/performance`.
///
/// Without `call_id` this reads the whole store.
pub async fn get_performance_analytics_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<PerformanceAnalytics>, ApiError> {
    let collector = collector(&state)?;

    let kind = match params.metric_type.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_kind(raw)?),
        None => None,
    };
    let call_id = params.call_id.as_deref().filter(|s| !s.is_empty());

    let analytics = collector.performance_analytics(call_id, kind).await?;
    Ok(Json(analytics))
}

/// Response body for `POST /metrics/test`.
#[derive(Debug, Serialize)]
pub struct TestMetricsResponse {
    pub message: String,
    pub call_id: String,
    /// Records that passed the kind flags and sampling.
    pub records_written: usize,
}

/// Handler for `POST /metrics/test`.
///
/// Switches the collector's call context to [`TEST_CALL_ID`], records one
/// sample per kind and waits for the writes to land. Kinds that are
/// disabled or sampled out are left out of `records_written`.
pub async fn create_test_metrics_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<TestMetricsResponse>, ApiError> {
    let collector = collector(&state)?;

    collector.set_call_id(TEST_CALL_ID);
    let written = [
        collector.record_llm_metric(0.245, 50, 25, "gpt-4o", 1.2),
        collector.record_tts_metric(0.150, 2.5, 25, "eleven_turbo_v2_5", "Rachel"),
        collector.record_asr_metric(3.0, 0.5, 50, "nova-2", "en"),
        collector.record_eou_metric(0.3, 0.95),
    ]
    .into_iter()
    .filter(|scheduled| *scheduled)
    .count();
    collector.flush().await;

    tracing::info!(
        call_id = TEST_CALL_ID,
        records_written = written,
        "test metrics created"
    );

    Ok(Json(TestMetricsResponse {
        message: "Test metrics created".to_string(),
        call_id: TEST_CALL_ID.to_string(),
        records_written: written,
    }))
}
