//! Local persistence and query layer for the PromptVerse prompt catalog.
//!
//! Collections of prompts, categories, users, comments, outputs, favorites
//! and votes live as JSON arrays in a SQLite key/value table. [`Store`]
//! exposes the entity operations and keeps the denormalized counters
//! (`promptCount`, `favoritesCount`, `upvotes`/`downvotes`) in step with the
//! records they summarize.

pub mod categories;
pub mod comments;
pub mod config;
pub mod consistency;
pub mod db;
pub mod error;
pub mod favorites;
pub mod prompts;
pub mod records;
pub mod seed;
pub mod users;
pub mod votes;

mod query;

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

pub use config::{FixtureLocation, StoreConfig};
pub use consistency::{AuditReport, CounterDrift, PurgeReport};
pub use error::{StoreError, StoreResult};
pub use records::{Collection, RecordStore};
pub use seed::{DirectoryFixtures, FixtureError, FixtureSource, HttpFixtures, NoFixtures};
pub use users::Session;

pub type DbPool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

/// Handle to the store. Cheap to clone; clones share the pool, the
/// initialization flag and the write lock.
#[derive(Clone)]
pub struct Store {
    records: RecordStore,
    fixtures: Arc<dyn FixtureSource>,
    initialized: Arc<OnceCell<()>>,
    /// Held for the whole read-modify-write of every mutating operation.
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Wraps an already migrated pool.
    pub fn new(pool: DbPool, fixtures: Arc<dyn FixtureSource>) -> Self {
        Self {
            records: RecordStore::new(pool),
            fixtures,
            initialized: Arc::new(OnceCell::new()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Opens the configured database, applies migrations and picks the
    /// fixture source. Call [`Store::initialize`] before anything else.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let pool = db::open_pool(&config.database_url, config.pool_size)?;
        db::run_migrations(&pool)?;
        tracing::info!(database = %config.database_url, "Store opened");
        Ok(Self::new(pool, config.fixtures.source()))
    }

    /// A throwaway in-memory store.
    pub fn in_memory(fixtures: Arc<dyn FixtureSource>) -> StoreResult<Self> {
        let pool = db::memory_pool()?;
        db::run_migrations(&pool)?;
        Ok(Self::new(pool, fixtures))
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Number of records in each collection.
    pub async fn stats(&self) -> Vec<(Collection, usize)> {
        let mut stats = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            let items: Vec<serde_json::Value> = self.records.read_collection(collection).await;
            stats.push((collection, items.len()));
        }
        stats
    }
}
