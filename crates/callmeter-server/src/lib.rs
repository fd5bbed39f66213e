//! Callmeter query service library logic.

pub mod api_metrics;
pub mod config;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use callmeter_collector::MetricsCollector;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone, Default)]
pub struct AppState {
    /// The metrics collector, absent when collection is disabled.
    pub collector: Option<Arc<MetricsCollector>>,
}

impl AppState {
    pub fn new(collector: Option<Arc<MetricsCollector>>) -> Self {
        Self { collector }
    }
}

/// Health check handler.
///
/// Returns `200 OK` with liveness, whether metrics collection is active and
/// which storage backend it writes to.
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "metrics_enabled": state.collector.is_some(),
        "storage": state.collector.as_ref().map(|c| c.storage_name()),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/metrics/calls/{call_id}",
            get(api_metrics::get_call_metrics_handler),
        )
        .route(
            "/metrics/calls/{call_id}/summary",
            get(api_metrics::get_call_summary_handler),
        )
        .route(
            "/metrics/calls/{call_id}/{metric_type}",
            get(api_metrics::get_call_metrics_by_type_handler),
        )
        .route(
            "/metrics/analytics/performance",
            get(api_metrics::get_performance_analytics_handler),
        )
        .route(
            "/metrics/test",
            post(api_metrics::create_test_metrics_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
