//! Unit tests for the storage backends.

use callmeter_types::{AsrMetric, EouMetric, LlmMetric, MetricKind, MetricRecord, TtsMetric};

use crate::{
    call_key, open_storage, FileStorage, MemoryStorage, MetricFilter, MetricsStorage,
    RedisSettings, RedisStorage, StorageSettings, StoreError,
};

fn llm(call_id: &str, ttft: f64) -> MetricRecord {
    LlmMetric::new(1_700_000_000.0, call_id, ttft, 50, 25, "gpt-4o", 1.2).into()
}

fn tts(call_id: &str, ttfb: f64) -> MetricRecord {
    TtsMetric {
        timestamp: 1_700_000_001.0,
        call_id: call_id.to_string(),
        ttfb,
        audio_duration: 2.5,
        text_length: 25,
        model: "eleven_turbo_v2_5".to_string(),
        voice_id: "Rachel".to_string(),
    }
    .into()
}

fn asr(call_id: &str) -> MetricRecord {
    AsrMetric {
        timestamp: 1_700_000_002.0,
        call_id: call_id.to_string(),
        audio_duration: 3.0,
        processing_time: 0.5,
        text_length: 50,
        model: "nova-2".to_string(),
        language: "en".to_string(),
    }
    .into()
}

fn eou(call_id: &str) -> MetricRecord {
    EouMetric {
        timestamp: 1_700_000_003.0,
        call_id: call_id.to_string(),
        eou_delay: 0.3,
        confidence: 0.95,
    }
    .into()
}

/// Stores a fixed mix of records across two calls.
async fn seed(storage: &dyn MetricsStorage) -> Vec<MetricRecord> {
    let records = vec![
        llm("call-a", 0.2),
        tts("call-a", 0.1),
        llm("call-b", 0.4),
        asr("call-a"),
        eou("call-b"),
    ];
    for record in &records {
        storage
            .store_metric(record.clone())
            .await
            .expect("store should succeed");
    }
    records
}

// ── MetricFilter ─────────────────────────────────────────────────────

#[test]
fn default_filter_matches_everything() {
    let filter = MetricFilter::default();
    assert!(filter.matches(&llm("x", 0.1)));
    assert!(filter.matches(&eou("y")));
}

#[test]
fn filter_is_conjunctive() {
    let filter = MetricFilter::for_call("call-a", Some(MetricKind::Llm));
    assert!(filter.matches(&llm("call-a", 0.1)));
    assert!(!filter.matches(&llm("call-b", 0.1)));
    assert!(!filter.matches(&tts("call-a", 0.1)));
}

// ── MemoryStorage ────────────────────────────────────────────────────

#[tokio::test]
async fn memory_returns_all_records_without_filter() {
    let storage = MemoryStorage::new();
    let records = seed(&storage).await;

    let all = storage
        .get_metrics(&MetricFilter::default())
        .await
        .expect("query should succeed");
    assert_eq!(all, records);
    assert_eq!(storage.len(), 5);
}

#[tokio::test]
async fn memory_filters_by_call_and_kind() {
    let storage = MemoryStorage::new();
    seed(&storage).await;

    let a_llm = storage
        .get_metrics(&MetricFilter::for_call("call-a", Some(MetricKind::Llm)))
        .await
        .unwrap();
    assert_eq!(a_llm, vec![llm("call-a", 0.2)]);

    let a_all = storage
        .get_metrics(&MetricFilter::for_call("call-a", None))
        .await
        .unwrap();
    assert_eq!(a_all.len(), 3);

    let all_llm = storage
        .get_metrics(&MetricFilter {
            call_id: None,
            kind: Some(MetricKind::Llm),
        })
        .await
        .unwrap();
    assert_eq!(all_llm.len(), 2);
}

#[tokio::test]
async fn memory_unknown_call_is_empty() {
    let storage = MemoryStorage::new();
    seed(&storage).await;

    let none = storage
        .get_metrics(&MetricFilter::for_call("nope", None))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn memory_tolerates_concurrent_appends() {
    let storage = std::sync::Arc::new(MemoryStorage::new());
    let mut handles = Vec::new();
    for i in 0..32 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage
                .store_metric(llm(&format!("call-{}", i % 4), 0.1))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(storage.len(), 32);
}

// ── FileStorage ──────────────────────────────────────────────────────

#[tokio::test]
async fn file_round_trips_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("metrics.jsonl"));
    let records = seed(&storage).await;

    let reloaded = storage
        .get_metrics(&MetricFilter::default())
        .await
        .expect("reload should succeed");
    assert_eq!(reloaded, records);
}

#[tokio::test]
async fn file_writes_one_tagged_json_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.jsonl");
    let storage = FileStorage::new(&path);
    seed(&storage).await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 5);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["metric_type"], "llm");
    assert_eq!(first["call_id"], "call-a");
    assert_eq!(first["input_tokens"], 50);
}

#[tokio::test]
async fn file_missing_is_empty_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("never-written.jsonl"));

    let records = storage.get_metrics(&MetricFilter::default()).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn file_skips_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.jsonl");
    let line = serde_json::to_string(&eou("call-z")).unwrap();
    std::fs::write(&path, format!("\n{line}\n\n{line}\n")).unwrap();

    let storage = FileStorage::new(&path);
    let records = storage.get_metrics(&MetricFilter::default()).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn file_malformed_line_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.jsonl");
    std::fs::write(&path, "{not json}\n").unwrap();

    let storage = FileStorage::new(&path);
    let err = storage
        .get_metrics(&MetricFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test]
async fn file_unreadable_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be read as a file.
    let storage = FileStorage::new(dir.path());

    let err = storage
        .get_metrics(&MetricFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}

#[tokio::test]
async fn file_and_memory_agree_on_filtered_queries() {
    let dir = tempfile::tempdir().unwrap();
    let file = FileStorage::new(dir.path().join("metrics.jsonl"));
    let memory = MemoryStorage::new();
    seed(&file).await;
    seed(&memory).await;

    let filter = MetricFilter::for_call("call-b", None);
    assert_eq!(
        file.get_metrics(&filter).await.unwrap(),
        memory.get_metrics(&filter).await.unwrap()
    );
}

// ── RedisStorage ─────────────────────────────────────────────────────

#[test]
fn redis_key_is_prefixed_call_id() {
    assert_eq!(call_key("call-42"), "metrics:call-42");
}

#[test]
fn redis_settings_debug_redacts_password() {
    let settings = RedisSettings {
        password: Some("hunter2".to_string()),
        ..RedisSettings::default()
    };
    let debug = format!("{settings:?}");
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("[REDACTED]"));
}

#[tokio::test]
#[ignore = "requires a redis server on localhost:6379"]
async fn redis_round_trips_in_insertion_order() {
    let storage = RedisStorage::new(RedisSettings::default());
    let call_id = format!("test-{}", std::process::id());
    let records = vec![llm(&call_id, 0.1), tts(&call_id, 0.2), eou(&call_id)];
    for record in &records {
        storage.store_metric(record.clone()).await.unwrap();
    }

    let reloaded = storage
        .get_metrics(&MetricFilter::for_call(call_id.clone(), None))
        .await
        .unwrap();
    assert_eq!(reloaded, records);

    let only_tts = storage
        .get_metrics(&MetricFilter::for_call(call_id, Some(MetricKind::Tts)))
        .await
        .unwrap();
    assert_eq!(only_tts.len(), 1);
    storage.cleanup().await.unwrap();
}

// ── open_storage ─────────────────────────────────────────────────────

#[test]
fn open_storage_selects_variant() {
    assert_eq!(open_storage(&StorageSettings::Memory).name(), "memory");
    assert_eq!(
        open_storage(&StorageSettings::File {
            path: "m.jsonl".into()
        })
        .name(),
        "file"
    );
    assert_eq!(
        open_storage(&StorageSettings::Redis(RedisSettings::default())).name(),
        "redis"
    );
}
