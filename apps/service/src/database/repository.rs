use async_trait::async_trait;
use chrono::Utc;
use libsql::{Rows, params};
use std::path::Path;

use super::initialize_database;
use super::models::{
    RECORD_COLUMNS, parse_range, parse_since, record_from_row, timestamp_to_storage,
};
use super::retention::RetentionPolicy;
use crate::error::{Error, Result};
use crate::monitoring::MetricsRecord;
use crate::pool::{DEFAULT_POOL_SIZE, LibsqlManager, LibsqlPool, open_pool};

/// Storage for ping statistics.
///
/// One writer (the monitor loop) and any number of concurrent readers.
/// Every query returns records in ascending timestamp order.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Insert a record and prune everything older than `retention_days`.
    /// Returns how many expired records were deleted.
    async fn append(&self, record: &MetricsRecord, retention_days: u32) -> Result<u64>;

    /// Up to `limit` of the most recent records
    async fn query_recent(&self, limit: usize) -> Result<Vec<MetricsRecord>>;

    /// Records with `start <= timestamp <= end`, bounds as `YYYY-MM-DDTHH:MM:SS` (UTC)
    async fn query_range(&self, start: &str, end: &str) -> Result<Vec<MetricsRecord>>;

    /// Records strictly newer than an RFC 3339 instant
    async fn query_since(&self, since: &str) -> Result<Vec<MetricsRecord>>;

    /// Number of stored records
    async fn count(&self) -> Result<u64>;
}

/// LibSQL backed store
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    /// Create a store from an already initialized pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Open the database file at `path`, migrating its schema if needed.
    ///
    /// Safe to call on every startup.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = open_pool(path, DEFAULT_POOL_SIZE).await?;

        {
            let conn = pool.get().await.map_err(|e| Error::Pool { reason: e.to_string() })?;
            initialize_database(&conn).await?;
        }

        Ok(Self::new_from_pool(pool))
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        self.pool.get().await.map_err(|e| Error::Pool { reason: e.to_string() })
    }
}

/// Rows that cannot be decoded are logged and skipped so one bad row does not
/// hide the rest of the history.
async fn collect_records(mut rows: Rows) -> Result<Vec<MetricsRecord>> {
    let mut records = Vec::new();

    while let Some(row) = rows.next().await? {
        match record_from_row(&row) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping unreadable ping_stats row: {}", e),
        }
    }

    Ok(records)
}

#[async_trait]
impl MetricsStore for LibsqlStore {
    async fn append(&self, record: &MetricsRecord, retention_days: u32) -> Result<u64> {
        let conn = self.get_conn().await?;
        let cutoff = RetentionPolicy::new(retention_days).cutoff(Utc::now());

        let tx = conn.transaction().await?;

        tx.execute(
            "INSERT INTO ping_stats (timestamp, min, avg, max, stddev, packet_loss) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                timestamp_to_storage(&record.timestamp),
                record.min,
                record.avg,
                record.max,
                record.stddev,
                record.packet_loss
            ],
        )
        .await?;

        let pruned = tx
            .execute(
                "DELETE FROM ping_stats WHERE timestamp < ?",
                params![timestamp_to_storage(&cutoff)],
            )
            .await?;

        tx.commit().await?;

        if pruned > 0 {
            tracing::debug!("Pruned {} records older than {} days", pruned, retention_days);
        }

        Ok(pruned)
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<MetricsRecord>> {
        let conn = self.get_conn().await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = conn
            .query(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM ping_stats ORDER BY timestamp DESC, id DESC LIMIT ?"
                ),
                params![limit],
            )
            .await?;

        // Newest first out of SQL, oldest first to callers.
        let mut records = collect_records(rows).await?;
        records.reverse();
        Ok(records)
    }

    async fn query_range(&self, start: &str, end: &str) -> Result<Vec<MetricsRecord>> {
        let (start, end) = parse_range(start, end)?;
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM ping_stats
                     WHERE timestamp >= ? AND timestamp <= ?
                     ORDER BY timestamp ASC, id ASC"
                ),
                params![timestamp_to_storage(&start), timestamp_to_storage(&end)],
            )
            .await?;

        collect_records(rows).await
    }

    async fn query_since(&self, since: &str) -> Result<Vec<MetricsRecord>> {
        let since = parse_since(since)?;
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM ping_stats
                     WHERE timestamp > ?
                     ORDER BY timestamp ASC, id ASC"
                ),
                params![timestamp_to_storage(&since)],
            )
            .await?;

        collect_records(rows).await
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query("SELECT COUNT(*) FROM ping_stats", ()).await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?.max(0) as u64),
            None => Ok(0),
        }
    }
}
