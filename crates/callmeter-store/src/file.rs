use async_trait::async_trait;
use callmeter_types::MetricRecord;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::{MetricFilter, MetricsStorage, StoreError};

/// Newline-delimited JSON file backend.
///
/// Each write opens the file in append mode, writes one line and closes it,
/// so no handle is held between calls and lines already written survive a
/// crash. Reads reload and parse the whole file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsStorage for FileStorage {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn store_metric(&self, record: MetricRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get_metrics(&self, filter: &MetricFilter) -> Result<Vec<MetricRecord>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut records = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: MetricRecord = serde_json::from_str(line)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }

        Ok(records)
    }
}
