/// SQLite-backed durable record store.
///
/// Rows live in an `id_cards` table whose `id_number` column carries a
/// `UNIQUE` constraint. A duplicate insert therefore fails inside SQLite
/// itself and surfaces as `StoreError::DuplicateKey`, whatever the caller
/// looked up beforehand.
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use idguard_core::{IdentityRecord, RecordStore, StoreError, StoredRecord};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS id_cards (
         id           INTEGER PRIMARY KEY AUTOINCREMENT,
         id_number    TEXT NOT NULL UNIQUE,
         full_name    TEXT NOT NULL,
         birth_date   TEXT NOT NULL,
         attributes   TEXT NOT NULL DEFAULT '{}',
         recorded_at  TEXT NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_id_cards_recorded ON id_cards(recorded_at);";

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Create or open a database at the given path and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open SQLite database at {:?}", path.as_ref()))?;
        conn.busy_timeout(busy_timeout)
            .context("Failed to set SQLite busy timeout")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL journal")?;
        init_schema(&conn)?;

        info!("SqliteRecordStore opened at {:?}", path.as_ref());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

/// Create the `id_cards` table if it is missing. Safe to call repeatedly.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to initialize id_cards schema")?;
    Ok(())
}

fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_by_id(&self, id_number: &str) -> Result<Option<IdentityRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                "SELECT id_number, full_name, birth_date, attributes, recorded_at
                 FROM id_cards WHERE id_number = ?1",
                params![id_number],
                row_to_stored,
            )
            .optional()
            .map_err(unavailable)?;
        Ok(row.map(|stored| stored.record))
    }

    async fn insert(&self, record: &IdentityRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let attributes = serde_json::to_string(&record.attributes).map_err(unavailable)?;
        let result = conn.execute(
            "INSERT INTO id_cards (id_number, full_name, birth_date, attributes, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id_number,
                record.full_name,
                record.birth_date.format("%Y-%m-%d").to_string(),
                attributes,
                Utc::now().to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                debug!("Inserted identity record");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                warn!("Rejected insert of an identity number that is already stored");
                Err(StoreError::DuplicateKey(record.id_number.clone()))
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id_number, full_name, birth_date, attributes, recorded_at
                 FROM id_cards ORDER BY id DESC LIMIT ?1",
            )
            .map_err(unavailable)?;
        let rows = stmt
            .query_map(params![limit as i64], row_to_stored)
            .map_err(unavailable)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(unavailable)?;
        Ok(rows)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM id_cards", [], |row| row.get(0))
            .map_err(unavailable)?;
        Ok(count as usize)
    }
}

// ---------------------------------------------------------------------------
// Row deserialization helper
// ---------------------------------------------------------------------------

fn row_to_stored(row: &rusqlite::Row) -> rusqlite::Result<StoredRecord> {
    let id_number: String = row.get(0)?;
    let full_name: String = row.get(1)?;
    let birth_date: String = row.get(2)?;
    let attributes_json: String = row.get(3)?;
    let recorded_at: String = row.get(4)?;

    let birth_date = NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))?;
    let attributes: BTreeMap<String, String> = serde_json::from_str(&attributes_json)
        .map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
        .map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))?
        .with_timezone(&Utc);

    Ok(StoredRecord {
        record: IdentityRecord {
            id_number,
            full_name,
            birth_date,
            attributes,
        },
        recorded_at,
    })
}
