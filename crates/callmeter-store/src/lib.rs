//! Pluggable persistence for call metrics.
//!
//! Every backend implements [`MetricsStorage`]: append one record, read
//! records back filtered by call and kind, and release resources on
//! shutdown. Three variants exist:
//!
//! | Backend | Durability | Query cost |
//! |---------|-----------|------------|
//! | [`MemoryStorage`] | process lifetime | linear scan |
//! | [`FileStorage`] | JSONL file, append per write | full file reload per query |
//! | [`RedisStorage`] | Redis lists, 24 h expiry per call | one list per call, `KEYS` scan otherwise |
//!
//! All three return the same records for the same sequence of calls; they
//! differ only in durability and in the errors their medium can raise.

mod error;
mod file;
mod memory;
mod redis_store;

pub use error::StoreError;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use redis_store::{call_key, RedisSettings, RedisStorage, CALL_KEY_TTL_SECONDS};

use async_trait::async_trait;
use callmeter_types::{MetricKind, MetricRecord};
use std::path::PathBuf;
use std::sync::Arc;

/// Filter criteria for [`MetricsStorage::get_metrics`].
///
/// Both fields are optional and combine with AND semantics. The default
/// filter matches every stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricFilter {
    /// Only records belonging to this call.
    pub call_id: Option<String>,
    /// Only records of this kind.
    pub kind: Option<MetricKind>,
}

impl MetricFilter {
    /// A filter matching one call, optionally narrowed to one kind.
    pub fn for_call(call_id: impl Into<String>, kind: Option<MetricKind>) -> Self {
        Self {
            call_id: Some(call_id.into()),
            kind,
        }
    }

    /// Returns `true` if `record` satisfies every set predicate.
    pub fn matches(&self, record: &MetricRecord) -> bool {
        if let Some(ref call_id) = self.call_id {
            if record.call_id() != call_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.kind() != kind {
                return false;
            }
        }
        true
    }
}

/// A metric persistence backend shared by every call in the process.
#[async_trait]
pub trait MetricsStorage: Send + Sync {
    /// Short label identifying the backend (`memory`, `file`, `redis`).
    fn name(&self) -> &'static str;

    /// Appends one record.
    async fn store_metric(&self, record: MetricRecord) -> Result<(), StoreError>;

    /// Returns the stored records matching `filter`.
    async fn get_metrics(&self, filter: &MetricFilter) -> Result<Vec<MetricRecord>, StoreError>;

    /// Releases held connections or handles.
    async fn cleanup(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Which backend to open, with its connection parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageSettings {
    Memory,
    File { path: PathBuf },
    Redis(RedisSettings),
}

/// Opens the backend described by `settings`.
///
/// No I/O happens here: the file backend touches disk on first write and
/// the Redis backend connects lazily on first command.
pub fn open_storage(settings: &StorageSettings) -> Arc<dyn MetricsStorage> {
    match settings {
        StorageSettings::Memory => Arc::new(MemoryStorage::new()),
        StorageSettings::File { path } => Arc::new(FileStorage::new(path.clone())),
        StorageSettings::Redis(redis) => Arc::new(RedisStorage::new(redis.clone())),
    }
}

#[cfg(test)]
mod tests;
