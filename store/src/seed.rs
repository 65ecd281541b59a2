//! First-run seeding from static JSON fixtures.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use promptverse_shared::{
    Category, Comment, Favorite, Output, Prompt, User, Vote, UNCATEGORIZED_ID,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::categories::reserved_category;
use crate::error::{StoreError, StoreResult};
use crate::records::Collection;
use crate::Store;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} fetching {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Where seed fixtures come from.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// Raw text of `file_name`, or `None` when this source has nothing to
    /// offer for it.
    async fn fetch(&self, file_name: &str) -> Result<Option<String>, FixtureError>;

    fn describe(&self) -> String;
}

/// Fixtures read from `<dir>/<collection>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryFixtures {
    dir: PathBuf,
}

impl DirectoryFixtures {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FixtureSource for DirectoryFixtures {
    async fn fetch(&self, file_name: &str) -> Result<Option<String>, FixtureError> {
        let path = self.dir.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(source) => Err(FixtureError::Io { path, source }),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

/// Fixtures fetched from `<base_url>/<collection>.json`.
#[derive(Debug, Clone)]
pub struct HttpFixtures {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFixtures {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FixtureSource for HttpFixtures {
    async fn fetch(&self, file_name: &str) -> Result<Option<String>, FixtureError> {
        let url = format!("{}/{}", self.base_url, file_name);
        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            return Err(FixtureError::Status {
                status: resp.status(),
                url,
            });
        }

        Ok(Some(resp.text().await?))
    }

    fn describe(&self) -> String {
        format!("url {}", self.base_url)
    }
}

/// Seeds every collection empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFixtures;

#[async_trait]
impl FixtureSource for NoFixtures {
    async fn fetch(&self, _file_name: &str) -> Result<Option<String>, FixtureError> {
        Ok(None)
    }

    fn describe(&self) -> String {
        "no fixtures".to_string()
    }
}

/// Decodes a fixture document. A blank or non-array document yields no
/// records; array elements that do not decode are skipped one by one.
pub(crate) fn parse_fixture<T: DeserializeOwned>(collection: Collection, text: &str) -> Vec<T> {
    if text.trim().is_empty() {
        tracing::warn!(%collection, "Fixture is empty");
        return Vec::new();
    }

    let values: Vec<serde_json::Value> = match serde_json::from_str(text) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(%collection, error = %e, "Fixture is not a JSON array");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(%collection, index, error = %e, "Skipping malformed fixture record");
                None
            }
        })
        .collect()
}

impl Store {
    /// Seeds any collection that has never been stored and makes sure the
    /// reserved category exists. Only the first successful call does work.
    pub async fn initialize(&self) -> StoreResult<()> {
        self.initialized
            .get_or_try_init(|| async {
                let _guard = self.write_lock.lock().await;

                for collection in Collection::ALL {
                    match collection {
                        Collection::Prompts => self.seed::<Prompt>(collection).await?,
                        Collection::Categories => self.seed::<Category>(collection).await?,
                        Collection::Users => self.seed::<User>(collection).await?,
                        Collection::Comments => self.seed::<Comment>(collection).await?,
                        Collection::Outputs => self.seed::<Output>(collection).await?,
                        Collection::Favorites => self.seed::<Favorite>(collection).await?,
                        Collection::Votes => self.seed::<Vote>(collection).await?,
                    }
                }

                self.ensure_uncategorized().await?;
                tracing::info!(fixtures = %self.fixtures.describe(), "Store initialized");
                Ok::<_, StoreError>(())
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    async fn seed<T: DeserializeOwned + Serialize>(&self, collection: Collection) -> StoreResult<()> {
        if self.records.contains(collection).await? {
            tracing::debug!(%collection, "Collection already stored, not seeding");
            return Ok(());
        }

        let file = collection.fixture_file();
        let records: Vec<T> = match self.fixtures.fetch(&file).await {
            Ok(Some(text)) => parse_fixture(collection, &text),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(%collection, error = %e, "Could not fetch fixture, seeding empty");
                Vec::new()
            }
        };

        tracing::info!(%collection, records = records.len(), "Seeding collection");
        self.records.write_collection(collection, &records).await
    }

    /// The reserved category must be present exactly once.
    async fn ensure_uncategorized(&self) -> StoreResult<()> {
        let mut categories: Vec<Category> =
            self.records.read_collection(Collection::Categories).await;

        let present = categories.iter().filter(|c| c.id == UNCATEGORIZED_ID).count();
        match present {
            1 => return Ok(()),
            0 => categories.push(reserved_category(Utc::now())),
            _ => {
                tracing::warn!(copies = present, "Dropping duplicate reserved categories");
                let mut seen = false;
                categories.retain(|c| {
                    if c.id != UNCATEGORIZED_ID {
                        return true;
                    }
                    !std::mem::replace(&mut seen, true)
                });
            }
        }

        self.records
            .write_collection(Collection::Categories, &categories)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fixture_is_empty() {
        let prompts: Vec<Prompt> = parse_fixture(Collection::Prompts, "  \n");
        assert!(prompts.is_empty());
    }

    #[test]
    fn non_array_fixture_is_empty() {
        let prompts: Vec<Prompt> = parse_fixture(Collection::Prompts, r#"{"id":"p1"}"#);
        assert!(prompts.is_empty());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let text = r#"[
            {"itemId":"c1","itemType":"category","userId":"u1","voteType":"up"},
            {"itemId":"p1","itemType":"prompt","userId":"u1","voteType":"up"},
            {"itemId":"c2","itemType":"category","userId":"u1","voteType":"down"}
        ]"#;
        let votes: Vec<Vote> = parse_fixture(Collection::Votes, text);
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[1].item_id, "c2");
    }

    #[tokio::test]
    async fn directory_fixture_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryFixtures::new(dir.path());
        assert!(source.fetch("prompts.json").await.is_err());

        std::fs::write(dir.path().join("prompts.json"), "[]").unwrap();
        assert_eq!(
            source.fetch("prompts.json").await.unwrap().as_deref(),
            Some("[]")
        );
    }
}
