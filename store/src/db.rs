use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;

use crate::error::StoreResult;
use crate::DbPool;

/// Opens a pooled SQLite database file.
pub fn open_pool(database_url: &str, max_size: u32) -> StoreResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_url)
        .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
    let pool = r2d2::Pool::builder()
        .max_size(max_size.max(1))
        .build(manager)?;
    Ok(pool)
}

/// A private in-memory database. Each SQLite memory connection is its own
/// database, so the pool holds exactly one connection and never recycles it.
pub fn memory_pool() -> StoreResult<DbPool> {
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(SqliteConnectionManager::memory())?;
    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> StoreResult<()> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv_store (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    Ok(())
}
