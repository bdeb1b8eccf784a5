//! `SQLite` implementation of the coordination event log ports.

use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use stovepanel_app::ports::{CoordinationEventReader, CoordinationEventSink};
use stovepanel_domain::coordination::CoordinationEvent;
use stovepanel_domain::error::PanelError;

use crate::error::StorageError;

struct Wrapper(CoordinationEvent);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let payload: String = row.try_get("payload")?;
        let event: CoordinationEvent =
            serde_json::from_str(&payload).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(event))
    }
}

const INSERT: &str = r"
    INSERT INTO coordination_events (id, timestamp, outcome, payload)
    VALUES (?, ?, ?, ?)
";

const SELECT_RECENT: &str =
    "SELECT payload FROM coordination_events ORDER BY timestamp DESC, rowid DESC LIMIT ?";

/// `SQLite`-backed coordination event log.
#[derive(Clone)]
pub struct SqliteCoordinationEventLog {
    pool: SqlitePool,
}

impl SqliteCoordinationEventLog {
    /// Create a new event log using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CoordinationEventSink for SqliteCoordinationEventLog {
    async fn append(&self, event: CoordinationEvent) -> Result<(), PanelError> {
        let payload = serde_json::to_string(&event).map_err(StorageError::from)?;

        // fixed width so that text ordering matches time ordering
        let timestamp = event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(INSERT)
            .bind(event.id.as_uuid())
            .bind(timestamp)
            .bind(event.outcome.label())
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

impl CoordinationEventReader for SqliteCoordinationEventLog {
    async fn recent(&self, limit: usize) -> Result<Vec<CoordinationEvent>, PanelError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
