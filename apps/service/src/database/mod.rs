//! Database layer for ping statistics
//!
//! A single `ping_stats` table in a local SQLite file, accessed through a
//! pool of libsql connections. Schema changes are versioned in
//! `migrations`; retention is enforced by the store on every append.

pub mod migrations;
pub mod models;
pub mod repository;
pub mod retention;


pub use repository::{LibsqlStore, MetricsStore};
pub use retention::RetentionPolicy;

use crate::error::Result;

/// Initialize database with schema
///
/// Switches the file to WAL so readers keep working while the monitor loop
/// writes, then brings the schema up to date. Idempotent.
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    // journal_mode answers with the resulting mode, so this has to be a query.
    let mut rows = conn.query("PRAGMA journal_mode = WAL", ()).await?;
    if let Some(row) = rows.next().await? {
        let mode: String = row.get(0)?;
        tracing::debug!("SQLite journal mode: {}", mode);
    }

    migrations::run_migrations(conn).await
}
