use std::path::PathBuf;
use std::sync::Arc;

use crate::seed::{DirectoryFixtures, FixtureSource, HttpFixtures, NoFixtures};

/// Where seed fixtures are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureLocation {
    Directory(PathBuf),
    Url(String),
    None,
}

impl FixtureLocation {
    /// `http://` and `https://` values are base URLs, `none` (or an empty
    /// value) disables fixtures, anything else is a directory.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            FixtureLocation::None
        } else if value.starts_with("http://") || value.starts_with("https://") {
            FixtureLocation::Url(value.to_string())
        } else {
            FixtureLocation::Directory(PathBuf::from(value))
        }
    }

    pub fn source(&self) -> Arc<dyn FixtureSource> {
        match self {
            FixtureLocation::Directory(dir) => Arc::new(DirectoryFixtures::new(dir.clone())),
            FixtureLocation::Url(url) => Arc::new(HttpFixtures::new(url.clone())),
            FixtureLocation::None => Arc::new(NoFixtures),
        }
    }
}

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database file (default: `promptverse.db`).
    pub database_url: String,
    /// Seed fixture location (default: `./data`).
    pub fixtures: FixtureLocation,
    /// Maximum pooled connections (default: `4`).
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "promptverse.db".to_string(),
            fixtures: FixtureLocation::Directory(PathBuf::from("./data")),
            pool_size: 4,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var        | Default          |
    /// |----------------|------------------|
    /// | `DATABASE_URL` | `promptverse.db` |
    /// | `FIXTURES`     | `./data`         |
    /// | `DB_POOL_SIZE` | `4`              |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let fixtures = std::env::var("FIXTURES")
            .map(|v| FixtureLocation::parse(&v))
            .unwrap_or(defaults.fixtures);

        let pool_size = match std::env::var("DB_POOL_SIZE") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "DB_POOL_SIZE is not a number, using default");
                defaults.pool_size
            }),
            Err(_) => defaults.pool_size,
        };

        Self {
            database_url,
            fixtures,
            pool_size,
        }
    }
}
