use libsql::Connection;

use super::models::{is_storage_form, timestamp_from_storage, timestamp_to_storage};
use crate::error::{Error, Result};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i64 = 3;

/// Run database migrations
///
/// Databases written before versioning existed have a `ping_stats` table but
/// no `schema_migrations` rows, so they start at version 0 like an empty file
/// and every step below has to cope with the table already being there.
pub async fn run_migrations(conn: &Connection) -> Result<()> {
    // Create schema_migrations table first (tracks applied migrations)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    // Check current schema version
    let current_version = get_current_version(conn).await?;

    if current_version >= SCHEMA_VERSION {
        tracing::info!("Database schema is up to date (version {})", current_version);
        return Ok(());
    }

    tracing::info!("Running migrations from version {} to {}", current_version, SCHEMA_VERSION);

    if current_version < 1 {
        apply(conn, 1, "Baseline ping_stats table").await?;
    }

    if current_version < 2 {
        apply(conn, 2, "Add packet_loss column").await?;
    }

    if current_version < 3 {
        apply(conn, 3, "Allow missing latency values, normalize timestamps").await?;
    }

    tracing::info!("Database migrations completed successfully (now at version {})", SCHEMA_VERSION);
    Ok(())
}

/// Run one migration and record it, all in a single transaction.
async fn apply(conn: &Connection, version: i64, description: &str) -> Result<()> {
    let failed = |e: libsql::Error| Error::Migration { version, reason: e.to_string() };

    let tx = conn.transaction().await.map_err(failed)?;

    let outcome = match version {
        1 => run_migration_v1(&tx).await,
        2 => run_migration_v2(&tx).await,
        3 => run_migration_v3(&tx).await,
        _ => unreachable!("no migration for schema v{version}"),
    };
    outcome.map_err(failed)?;

    record_migration(&tx, version, description).await.map_err(failed)?;
    tx.commit().await.map_err(failed)?;

    tracing::info!("Applied migration v{}: {}", version, description);
    Ok(())
}

/// Get current schema version from database
async fn get_current_version(conn: &Connection) -> Result<i64> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    if let Some(row) = rows.next().await? {
        let version: Option<i64> = row.get(0)?;
        Ok(version.unwrap_or(0))
    } else {
        Ok(0)
    }
}

/// Record that a migration was applied
async fn record_migration(conn: &Connection, version: i64, description: &str) -> libsql::Result<()> {
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        libsql::params![version, now, description],
    )
    .await?;

    Ok(())
}

async fn has_column(conn: &Connection, table: &str, column: &str) -> libsql::Result<bool> {
    let mut rows = conn.query(&format!("PRAGMA table_info({table})"), ()).await?;

    while let Some(row) = rows.next().await? {
        let name: String = row.get(1)?;
        if name.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Migration v1: baseline table and timestamp index.
/// A no-op for the table itself on databases created before versioning.
async fn run_migration_v1(conn: &Connection) -> libsql::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ping_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            min REAL,
            avg REAL,
            max REAL,
            stddev REAL,
            packet_loss REAL NOT NULL DEFAULT 0
        )",
        (),
    )
    .await?;

    conn.execute("CREATE INDEX IF NOT EXISTS idx_ping_stats_timestamp ON ping_stats(timestamp)", ())
        .await?;

    Ok(())
}

/// Migration v2: the earliest layout had no packet_loss column.
async fn run_migration_v2(conn: &Connection) -> libsql::Result<()> {
    if has_column(conn, "ping_stats", "packet_loss").await? {
        return Ok(());
    }

    conn.execute("ALTER TABLE ping_stats ADD COLUMN packet_loss REAL DEFAULT 0", ()).await?;

    tracing::info!("Added packet_loss column to ping_stats");
    Ok(())
}

/// Migration v3: rebuild ping_stats so latency columns accept NULL.
///
/// SQLite cannot drop a NOT NULL constraint in place. Every row is copied and
/// missing loss values become 0. Legacy timestamps (offset-suffixed text or
/// Go's `time.Time.String()` form) are then rewritten in the naive UTC storage
/// form; SQLite's date functions cannot read the latter, so this happens here.
async fn run_migration_v3(conn: &Connection) -> libsql::Result<()> {
    conn.execute("DROP TABLE IF EXISTS ping_stats_rebuild", ()).await?;

    conn.execute(
        "CREATE TABLE ping_stats_rebuild (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            min REAL,
            avg REAL,
            max REAL,
            stddev REAL,
            packet_loss REAL NOT NULL DEFAULT 0
        )",
        (),
    )
    .await?;

    let copied = conn
        .execute(
            "INSERT INTO ping_stats_rebuild (id, timestamp, min, avg, max, stddev, packet_loss)
             SELECT id, timestamp, min, avg, max, stddev, COALESCE(packet_loss, 0)
             FROM ping_stats",
            (),
        )
        .await?;

    let normalized = normalize_timestamps(conn, "ping_stats_rebuild").await?;

    conn.execute("DROP TABLE ping_stats", ()).await?;
    conn.execute("ALTER TABLE ping_stats_rebuild RENAME TO ping_stats", ()).await?;
    conn.execute("CREATE INDEX IF NOT EXISTS idx_ping_stats_timestamp ON ping_stats(timestamp)", ())
        .await?;

    tracing::info!(
        "Rebuilt ping_stats with nullable latency columns ({} rows kept, {} timestamps normalized)",
        copied,
        normalized
    );
    Ok(())
}

/// Rewrite every readable non-storage-form timestamp in `table`.
/// Rows that cannot be read are kept untouched and logged.
async fn normalize_timestamps(conn: &Connection, table: &str) -> libsql::Result<u64> {
    let mut rewrites = Vec::new();

    let mut rows = conn
        .query(&format!("SELECT id, timestamp FROM {table} WHERE typeof(timestamp) = 'text'"), ())
        .await?;
    while let Some(row) = rows.next().await? {
        let id: i64 = row.get(0)?;
        let raw: String = row.get(1)?;

        if is_storage_form(&raw) {
            continue;
        }

        match timestamp_from_storage(&raw) {
            Ok(ts) => rewrites.push((id, timestamp_to_storage(&ts))),
            Err(e) => tracing::warn!("Keeping row {} with unreadable timestamp: {}", id, e),
        }
    }
    drop(rows);

    for (id, timestamp) in &rewrites {
        conn.execute(
            &format!("UPDATE {table} SET timestamp = ? WHERE id = ?"),
            libsql::params![timestamp.as_str(), *id],
        )
        .await?;
    }

    Ok(rewrites.len() as u64)
}
