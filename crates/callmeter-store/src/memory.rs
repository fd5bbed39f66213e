use async_trait::async_trait;
use callmeter_types::MetricRecord;
use std::sync::RwLock;

use crate::{MetricFilter, MetricsStorage, StoreError};

/// Process-local, append-only record list.
///
/// Uses `std::sync::RwLock`: every acquisition is a single push or scan and
/// never spans an `.await`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<MetricRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetricsStorage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn store_metric(&self, record: MetricRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
        Ok(())
    }

    async fn get_metrics(&self, filter: &MetricFilter) -> Result<Vec<MetricRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
