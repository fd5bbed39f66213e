use async_trait::async_trait;
use callmeter_types::MetricRecord;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::fmt;
use tokio::sync::Mutex;

use crate::{MetricFilter, MetricsStorage, StoreError};

/// Expiry applied to each call's list on every push (24 hours).
pub const CALL_KEY_TTL_SECONDS: i64 = 24 * 60 * 60;

const KEY_PREFIX: &str = "metrics:";

/// Returns the Redis list key holding a call's records.
pub fn call_key(call_id: &str) -> String {
    format!("{KEY_PREFIX}{call_id}")
}

/// Connection parameters for the Redis backend.
#[derive(Clone, PartialEq)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
        }
    }
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RedisSettings {
    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// Redis list backend.
///
/// Records for a call are pushed onto `metrics:{call_id}`; the key's expiry
/// is refreshed on every push so abandoned calls are reclaimed by Redis.
/// The connection is opened on first use and shared afterwards.
pub struct RedisStorage {
    settings: RedisSettings,
    connection: Mutex<Option<ConnectionManager>>,
}

impl fmt::Debug for RedisStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStorage")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RedisStorage {
    pub fn new(settings: RedisSettings) -> Self {
        Self {
            settings,
            connection: Mutex::new(None),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let mut guard = self.connection.lock().await;
        if let Some(ref manager) = *guard {
            return Ok(manager.clone());
        }

        let client = redis::Client::open(self.settings.connection_info())?;
        let manager = ConnectionManager::new(client).await?;
        tracing::info!(
            host = %self.settings.host,
            port = self.settings.port,
            db = self.settings.db,
            "connected to redis metrics store"
        );
        *guard = Some(manager.clone());
        Ok(manager)
    }

    async fn read_list(
        conn: &mut ConnectionManager,
        key: &str,
        into: &mut Vec<MetricRecord>,
    ) -> Result<(), StoreError> {
        let lines: Vec<String> = conn.lrange(key, 0, -1).await?;
        // LPUSH stores newest first; report in insertion order like the other backends.
        for line in lines.iter().rev() {
            into.push(serde_json::from_str(line)?);
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsStorage for RedisStorage {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn store_metric(&self, record: MetricRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(&record)?;
        let key = call_key(record.call_id());

        let mut conn = self.connection().await?;
        let _: () = conn.lpush(&key, line).await?;
        let _: () = conn.expire(&key, CALL_KEY_TTL_SECONDS).await?;
        Ok(())
    }

    async fn get_metrics(&self, filter: &MetricFilter) -> Result<Vec<MetricRecord>, StoreError> {
        let mut conn = self.connection().await?;
        let mut records = Vec::new();

        match filter.call_id {
            Some(ref call_id) => {
                Self::read_list(&mut conn, &call_key(call_id), &mut records).await?;
            }
            None => {
                // Full keyspace scan; only suitable for low-volume ops queries.
                let keys: Vec<String> = conn.keys(format!("{KEY_PREFIX}*")).await?;
                for key in keys {
                    Self::read_list(&mut conn, &key, &mut records).await?;
                }
            }
        }

        records.retain(|record| filter.matches(record));
        Ok(records)
    }

    async fn cleanup(&self) -> Result<(), StoreError> {
        if self.connection.lock().await.take().is_some() {
            tracing::debug!("released redis metrics connection");
        }
        Ok(())
    }
}
