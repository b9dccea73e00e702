//! Durable cache store on SQLite
//!
//! One table keyed by normalised query. Operations run on the
//! tokio-rusqlite background thread; each write is a single upsert
//! statement, so readers never see a partially written row.

use super::{CacheEntry, CacheStore};
use crate::error::{Result, SearchError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};
use tokio_rusqlite::{params, Connection};
use tracing::debug;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
                       PRAGMA synchronous=NORMAL;
                       PRAGMA temp_store=MEMORY;";

const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = "CREATE TABLE IF NOT EXISTS search_cache (
                             normalized_query TEXT PRIMARY KEY NOT NULL,
                             results_json     TEXT NOT NULL,
                             expires_at       INTEGER NOT NULL,
                             updated_at       INTEGER NOT NULL
                         );";

/// SQLite-backed [`CacheStore`]
#[derive(Clone, Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and bring the schema up to date
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref().to_path_buf())
            .await
            .map_err(SearchError::cache)?;
        Self::init(conn).await
    }

    /// Open a private in-memory database
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(SearchError::cache)?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let version = conn
            .call(|conn| -> rusqlite::Result<i64> {
                conn.execute_batch(PRAGMAS)?;
                let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
                if version < 1 {
                    let tx = conn.transaction()?;
                    tx.execute_batch(SCHEMA_V1)?;
                    tx.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION))?;
                    tx.commit()?;
                }
                Ok(version)
            })
            .await
            .map_err(SearchError::cache)?;

        if version < SCHEMA_VERSION {
            debug!("Migrated search cache schema from v{} to v{}", version, SCHEMA_VERSION);
        }

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let key = key.to_string();
        let row = self
            .conn
            .call(move |conn| -> rusqlite::Result<Option<(String, String, i64)>> {
                conn.query_row(
                    "SELECT normalized_query, results_json, expires_at
                     FROM search_cache WHERE normalized_query = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
            })
            .await
            .map_err(SearchError::cache)?;

        let (normalized_query, results_json, expires_at) = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let results = serde_json::from_str(&results_json).map_err(SearchError::cache)?;
        let expires_at = DateTime::<Utc>::from_timestamp_millis(expires_at)
            .ok_or_else(|| SearchError::cache("stored expiry out of range"))?;

        Ok(Some(CacheEntry {
            normalized_query,
            results,
            expires_at,
        }))
    }

    async fn store(&self, entry: CacheEntry) -> Result<()> {
        let results_json = serde_json::to_string(&entry.results).map_err(SearchError::cache)?;
        let expires_at = entry.expires_at.timestamp_millis();
        let updated_at = Utc::now().timestamp_millis();
        let key = entry.normalized_query;

        self.conn
            .call(move |conn| -> rusqlite::Result<()> {
                conn.execute(
                    "INSERT INTO search_cache (normalized_query, results_json, expires_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(normalized_query) DO UPDATE SET
                         results_json = excluded.results_json,
                         expires_at = excluded.expires_at,
                         updated_at = excluded.updated_at",
                    params![key, results_json, expires_at, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(SearchError::cache)
    }

    async fn remove_stale(&self, key: &str, stale_at: DateTime<Utc>) -> Result<()> {
        let key = key.to_string();
        let stale_at = stale_at.timestamp_millis();
        self.conn
            .call(move |conn| -> rusqlite::Result<()> {
                conn.execute(
                    "DELETE FROM search_cache
                     WHERE normalized_query = ?1 AND expires_at <= ?2",
                    params![key, stale_at],
                )?;
                Ok(())
            })
            .await
            .map_err(SearchError::cache)
    }
}
