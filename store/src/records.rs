//! Whole-collection persistence on top of the `kv_store` table.
//!
//! Every collection is one JSON array stored under a namespaced key. There
//! are no partial updates: callers read the full list, transform it, and
//! write the full list back.

use std::fmt;

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::DbPool;

pub const KEY_PREFIX: &str = "promptVerseDB_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Prompts,
    Categories,
    Users,
    Comments,
    Outputs,
    Favorites,
    Votes,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Prompts,
        Collection::Categories,
        Collection::Users,
        Collection::Comments,
        Collection::Outputs,
        Collection::Favorites,
        Collection::Votes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Prompts => "prompts",
            Collection::Categories => "categories",
            Collection::Users => "users",
            Collection::Comments => "comments",
            Collection::Outputs => "outputs",
            Collection::Favorites => "favorites",
            Collection::Votes => "votes",
        }
    }

    pub fn key(self) -> String {
        format!("{KEY_PREFIX}{}", self.name())
    }

    pub fn fixture_file(self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fresh opaque record id. Time-ordered, never reused.
pub(crate) fn new_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

#[derive(Clone)]
pub struct RecordStore {
    pool: DbPool,
}

impl RecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Whether anything, including an empty list, is stored for `collection`.
    pub async fn contains(&self, collection: Collection) -> StoreResult<bool> {
        let pool = self.pool.clone();
        let key = collection.key();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM kv_store WHERE key = ?1)",
                [&key],
                |row| row.get(0),
            )?;
            Ok::<_, StoreError>(exists)
        })
        .await?
    }

    /// The stored JSON text for `collection`, exactly as written.
    pub async fn raw(&self, collection: Collection) -> StoreResult<Option<String>> {
        let pool = self.pool.clone();
        let key = collection.key();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    [&key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok::<_, StoreError>(value)
        })
        .await?
    }

    /// Reads a whole collection. A missing key, a storage failure, or an
    /// undecodable value all read as an empty list.
    pub async fn read_collection<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        match self.raw(collection).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!(%collection, error = %e, "Stored collection is not decodable");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(%collection, error = %e, "Failed to read collection");
                Vec::new()
            }
        }
    }

    /// Replaces a whole collection in a single upsert. On failure the
    /// previously stored value is left as it was.
    pub async fn write_collection<T: Serialize>(
        &self,
        collection: Collection,
        items: &[T],
    ) -> StoreResult<()> {
        let json = serde_json::to_string(items)?;
        let pool = self.pool.clone();
        let key = collection.key();
        let len = items.len();

        let result = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                rusqlite::params![key, json, Utc::now().to_rfc3339()],
            )?;
            Ok::<_, StoreError>(())
        })
        .await?;

        match &result {
            Ok(()) => tracing::debug!(%collection, records = len, "Collection written"),
            Err(e) => tracing::error!(%collection, error = %e, "Failed to write collection"),
        }
        result
    }

    /// Drops the stored value so the next `initialize` seeds it again.
    pub async fn clear(&self, collection: Collection) -> StoreResult<bool> {
        let pool = self.pool.clone();
        let key = collection.key();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let affected = conn.execute("DELETE FROM kv_store WHERE key = ?1", [&key])?;
            Ok::<_, StoreError>(affected > 0)
        })
        .await?
    }

    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, StoreError>(keys)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn records() -> RecordStore {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        RecordStore::new(pool)
    }

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(Collection::Votes.key(), "promptVerseDB_votes");
        assert_eq!(Collection::Prompts.fixture_file(), "prompts.json");
    }

    #[tokio::test]
    async fn missing_key_reads_empty_but_is_not_contained() {
        let records = records();
        let items: Vec<serde_json::Value> = records.read_collection(Collection::Users).await;
        assert!(items.is_empty());
        assert!(!records.contains(Collection::Users).await.unwrap());
    }

    #[tokio::test]
    async fn empty_list_is_contained() {
        let records = records();
        records
            .write_collection::<serde_json::Value>(Collection::Votes, &[])
            .await
            .unwrap();
        assert!(records.contains(Collection::Votes).await.unwrap());
        assert_eq!(records.raw(Collection::Votes).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn write_replaces_previous_value() {
        let records = records();
        records
            .write_collection(Collection::Comments, &[1, 2, 3])
            .await
            .unwrap();
        records.write_collection(Collection::Comments, &[4]).await.unwrap();
        let items: Vec<i32> = records.read_collection(Collection::Comments).await;
        assert_eq!(items, vec![4]);
        assert_eq!(records.keys().await.unwrap(), vec!["promptVerseDB_comments"]);
    }

    #[tokio::test]
    async fn clear_forgets_the_key() {
        let records = records();
        records.write_collection(Collection::Outputs, &[1]).await.unwrap();
        assert!(records.clear(Collection::Outputs).await.unwrap());
        assert!(!records.contains(Collection::Outputs).await.unwrap());
        assert!(!records.clear(Collection::Outputs).await.unwrap());
    }
}
