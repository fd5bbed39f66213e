//! Integration tests driving the metrics query API through the router.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use callmeter_collector::{MetricsCollector, MetricsConfig, StorageType};
use callmeter_server::{api_metrics::TEST_CALL_ID, app, AppState};
use callmeter_store::MemoryStorage;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

fn memory_collector() -> Arc<MetricsCollector> {
    Arc::new(
        MetricsCollector::with_storage(MetricsConfig::default(), Arc::new(MemoryStorage::new()))
            .unwrap(),
    )
}

fn enabled_app() -> (Router, Arc<MetricsCollector>) {
    let collector = memory_collector();
    (app(AppState::new(Some(collector.clone()))), collector)
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri).await
}

/// Records `ttft` values for one call and waits for them to land.
async fn seed_llm(collector: &MetricsCollector, call_id: &str, ttfts: &[f64]) {
    collector.set_call_id(call_id);
    for ttft in ttfts {
        collector.record_llm_metric(*ttft, 10, 5, "gpt-4o", ttft * 4.0);
    }
    collector.flush().await;
}

// ── Health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_collector_state() {
    let (router, _collector) = enabled_app();
    let (status, json) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["metrics_enabled"], true);
    assert_eq!(json["storage"], "memory");
    assert!(json["version"].is_string());

    let disabled = app(AppState::default());
    let (status, json) = get(&disabled, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics_enabled"], false);
    assert!(json["storage"].is_null());
}

// ── Collector unavailable ───────────────────────────────────────────

#[tokio::test]
async fn metrics_endpoints_unavailable_without_collector() {
    let app = app(AppState::default());
    for uri in [
        "/metrics/calls/call-1",
        "/metrics/calls/call-1/summary",
        "/metrics/calls/call-1/llm",
        "/metrics/analytics/performance",
    ] {
        let (status, json) = get(&app, uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(json["error"], "Metrics collection not available");
    }

    let (status, _) = send(&app, "POST", "/metrics/test").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ── Smoke test endpoint ─────────────────────────────────────────────

#[tokio::test]
async fn test_endpoint_then_summary_counts_one_of_each() {
    let (app, collector) = enabled_app();

    let (status, json) = send(&app, "POST", "/metrics/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Test metrics created");
    assert_eq!(json["call_id"], TEST_CALL_ID);
    assert_eq!(json["records_written"], 4);
    assert_eq!(collector.call_id().as_deref(), Some(TEST_CALL_ID));

    let (status, summary) = get(&app, "/metrics/calls/test_call_123/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["call_id"], TEST_CALL_ID);
    assert_eq!(summary["counts"]["llm_requests"], 1);
    assert_eq!(summary["counts"]["tts_requests"], 1);
    assert_eq!(summary["counts"]["asr_requests"], 1);
    assert_eq!(summary["counts"]["eou_events"], 1);
    assert_eq!(summary["llm"]["avg_ttft"], 0.245);
    assert_eq!(summary["llm"]["total_input_tokens"], 50);
    assert_eq!(summary["tts"]["total_audio_duration"], 2.5);
    assert_eq!(summary["asr"]["total_audio_processed"], 3.0);
    assert_eq!(summary["eou"]["max_delay"], 0.3);

    let (status, metrics) = get(&app, "/metrics/calls/test_call_123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["llm"][0]["metric_type"], "llm");
    assert_eq!(metrics["llm"][0]["tokens_per_second"].as_f64().unwrap().round(), 21.0);
    assert_eq!(metrics["tts"][0]["voice_id"], "Rachel");
    assert_eq!(metrics["asr"][0]["model"], "nova-2");
    assert_eq!(metrics["eou"][0]["confidence"], 0.95);
}

#[tokio::test]
async fn test_endpoint_counts_only_records_written() {
    let config = MetricsConfig {
        collect_tts_metrics: false,
        ..MetricsConfig::default()
    };
    let collector = Arc::new(
        MetricsCollector::with_storage(config, Arc::new(MemoryStorage::new())).unwrap(),
    );
    let router = app(AppState::new(Some(collector)));

    let (status, json) = send(&router, "POST", "/metrics/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["records_written"], 3);

    let (_, summary) = get(&router, "/metrics/calls/test_call_123/summary").await;
    assert_eq!(summary["counts"]["tts_requests"], 0);
    assert_eq!(summary["counts"]["llm_requests"], 1);

    let sampled_out = MetricsConfig {
        sample_rate: 0.0,
        ..MetricsConfig::default()
    };
    let collector = Arc::new(
        MetricsCollector::with_storage(sampled_out, Arc::new(MemoryStorage::new())).unwrap(),
    );
    let router = app(AppState::new(Some(collector)));
    let (_, json) = send(&router, "POST", "/metrics/test").await;
    assert_eq!(json["records_written"], 0);
}

// ── Per-call listings ───────────────────────────────────────────────

#[tokio::test]
async fn unknown_call_returns_empty_lists() {
    let (app, _collector) = enabled_app();
    let (status, json) = get(&app, "/metrics/calls/nobody").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({"llm": [], "tts": [], "asr": [], "eou": []})
    );

    let (status, summary) = get(&app, "/metrics/calls/nobody/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["counts"]["llm_requests"], 0);
    assert!(summary.get("llm").is_none());
    assert!(summary.get("eou").is_none());
}

#[tokio::test]
async fn metric_type_listing_with_limit() {
    let (app, collector) = enabled_app();
    seed_llm(&collector, "call-7", &[0.1, 0.2, 0.3]).await;

    let (status, json) = get(&app, "/metrics/calls/call-7/llm").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    assert_eq!(json["metrics"][0]["ttft"], 0.1);

    let (_, json) = get(&app, "/metrics/calls/call-7/llm?limit=2").await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["metrics"].as_array().unwrap().len(), 2);

    let (_, json) = get(&app, "/metrics/calls/call-7/llm?limit=0").await;
    assert_eq!(json["count"], 3);

    let (_, json) = get(&app, "/metrics/calls/call-7/tts").await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn bad_metric_type_is_rejected() {
    let (app, _collector) = enabled_app();
    let (status, json) = get(&app, "/metrics/calls/call-1/latency").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("invalid metric type: latency"));

    let (status, json) = get(&app, "/metrics/calls/call-1/llm?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid limit: lots");

    let (status, _) = get(&app, "/metrics/analytics/performance?metric_type=video").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Analytics ───────────────────────────────────────────────────────

#[tokio::test]
async fn performance_analytics_p95() {
    let (app, collector) = enabled_app();
    seed_llm(&collector, "call-a", &[0.1, 0.2, 0.3]).await;
    seed_llm(&collector, "call-b", &[0.4, 0.5]).await;

    let (status, json) = get(&app, "/metrics/analytics/performance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["llm"]["count"], 5);
    assert_eq!(json["llm"]["p95_ttft"], 0.5);
    assert_eq!(json["llm"]["total_input_tokens"], 50);
    assert!(json.get("tts").is_none());

    let (_, json) = get(&app, "/metrics/analytics/performance?call_id=call-a").await;
    assert_eq!(json["llm"]["count"], 3);
    assert_eq!(json["llm"]["p95_ttft"], 0.3);

    let (_, json) = get(&app, "/metrics/analytics/performance?metric_type=eou").await;
    assert_eq!(json, serde_json::json!({}));
}

#[tokio::test]
async fn file_backed_service_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = MetricsConfig {
        storage_type: StorageType::File,
        file_path: dir.path().join("metrics.jsonl"),
        ..MetricsConfig::default()
    };
    let collector = Arc::new(MetricsCollector::new(config).unwrap());
    let app = app(AppState::new(Some(collector.clone())));

    let (status, _) = send(&app, "POST", "/metrics/test").await;
    assert_eq!(status, StatusCode::OK);

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["storage"], "file");

    let (_, json) = get(&app, "/metrics/calls/test_call_123/eou").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["metrics"][0]["eou_delay"], 0.3);
    collector.cleanup().await;
}
