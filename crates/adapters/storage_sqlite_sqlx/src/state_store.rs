//! `SQLite` implementation of [`StateStore`].
//!
//! Documents are stored as JSON text keyed by their full path. Merge patches
//! run inside `SQLite` through `json_patch`, which follows RFC 7396, so a
//! partial update is a single statement.

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use serde_json::Value;
use stovepanel_app::ports::StateStore;
use stovepanel_domain::error::PanelError;

use crate::error::StorageError;

struct Wrapper(String, Value);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let path: String = row.try_get("path")?;
        let value: String = row.try_get("value")?;
        let value: Value =
            serde_json::from_str(&value).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(path, value))
    }
}

const SELECT_ONE: &str = "SELECT path, value FROM state_entries WHERE path = ?";

const UPSERT: &str = r"
    INSERT INTO state_entries (path, value, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(path) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
";

const MERGE: &str = r"
    INSERT INTO state_entries (path, value, updated_at)
    VALUES (?1, json_patch('{}', ?2), ?3)
    ON CONFLICT(path) DO UPDATE SET
        value = json_patch(state_entries.value, ?2),
        updated_at = ?3
";

const DELETE: &str = "DELETE FROM state_entries WHERE path = ?";

// `0` sorts right after `/`, which bounds every path under the prefix
const SELECT_CHILDREN: &str = r"
    SELECT path, value FROM state_entries
    WHERE path > ?1 || '/' AND path < ?1 || '0'
    ORDER BY path
";

/// `SQLite`-backed state store.
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl StateStore for SqliteStateStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, PanelError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_ONE)
            .bind(normalize(path))
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|Wrapper(_, value)| value))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), PanelError> {
        let value = serde_json::to_string(&value).map_err(StorageError::from)?;

        sqlx::query(UPSERT)
            .bind(normalize(path))
            .bind(value)
            .bind(stamp())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn update(&self, path: &str, patch: Value) -> Result<(), PanelError> {
        let patch = serde_json::to_string(&patch).map_err(StorageError::from)?;

        sqlx::query(MERGE)
            .bind(normalize(path))
            .bind(patch)
            .bind(stamp())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), PanelError> {
        sqlx::query(DELETE)
            .bind(normalize(path))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn children(&self, parent: &str) -> Result<Vec<(String, Value)>, PanelError> {
        let parent = normalize(parent);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_CHILDREN)
            .bind(parent)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let prefix_len = parent.len() + 1;
        Ok(rows
            .into_iter()
            .filter_map(|Wrapper(path, value)| {
                let key = path.get(prefix_len..)?;
                (!key.is_empty() && !key.contains('/')).then(|| (key.to_string(), value))
            })
            .collect())
    }
}
