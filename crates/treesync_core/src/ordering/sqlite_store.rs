//! SQLite-backed order store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::store::{Collection, ListFilter, OrderStore, OrderableRecord};
use crate::error::{Result, TreeSyncError};

const SELECT_RECORD: &str = "SELECT id, collection, name, payload, position, created_at FROM records";

const ORDER_BY: &str = "ORDER BY position ASC, created_at ASC, id ASC";

/// Order store persisted in a SQLite database.
///
/// The connection is wrapped in a `Mutex` for thread-safe access.
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
}

/// A row before its text columns are parsed.
struct RawRecord {
    id: String,
    collection: String,
    name: String,
    payload: String,
    position: f64,
    created_at: i64,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            collection: row.get(1)?,
            name: row.get(2)?,
            payload: row.get(3)?,
            position: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<OrderableRecord> {
        let created_at = DateTime::<Utc>::from_timestamp_nanos(self.created_at);
        Ok(OrderableRecord {
            collection: self.collection.parse()?,
            id: self.id,
            name: self.name,
            payload: self.payload,
            position: self.position,
            created_at,
        })
    }
}

impl SqliteOrderStore {
    /// Open or create a database at `path`, creating tables as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database, lost on drop.
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn init_schema(&self) -> Result<()> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                name TEXT NOT NULL,
                payload TEXT NOT NULL DEFAULT '',
                position REAL NOT NULL,
                -- Nanoseconds since the Unix epoch
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_position ON records(collection, position);

            -- Category membership (record -> category record)
            CREATE TABLE IF NOT EXISTS memberships (
                record_id TEXT NOT NULL,
                category_id TEXT NOT NULL,
                PRIMARY KEY (record_id, category_id)
            );
            "#,
        )?;
        Ok(())
    }

    fn query(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<OrderableRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let raw = stmt
            .query_map(args, RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(RawRecord::into_record).collect()
    }
}

impl std::fmt::Debug for SqliteOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteOrderStore").finish_non_exhaustive()
    }
}

impl OrderStore for SqliteOrderStore {
    fn list(&self, collection: Collection, filter: &ListFilter) -> Result<Vec<OrderableRecord>> {
        let collection = collection.as_str();
        match filter {
            ListFilter::All => self.query(
                &format!("{} WHERE collection = ?1 {}", SELECT_RECORD, ORDER_BY),
                &[&collection],
            ),
            ListFilter::InCategory(category) => self.query(
                &format!(
                    "{} WHERE collection = ?1 AND id IN \
                     (SELECT record_id FROM memberships WHERE category_id = ?2) {}",
                    SELECT_RECORD, ORDER_BY
                ),
                &[&collection, category],
            ),
            ListFilter::Uncategorized => self.query(
                &format!(
                    "{} WHERE collection = ?1 AND id NOT IN \
                     (SELECT record_id FROM memberships) {}",
                    SELECT_RECORD, ORDER_BY
                ),
                &[&collection],
            ),
        }
    }

    fn get(&self, id: &str) -> Result<Option<OrderableRecord>> {
        let raw = self
            .conn()
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_RECORD),
                params![id],
                RawRecord::from_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    fn insert(&self, record: &OrderableRecord) -> Result<()> {
        let created_at = record.created_at.timestamp_nanos_opt().ok_or_else(|| {
            TreeSyncError::Persistence(format!(
                "Timestamp {} on record '{}' is out of range",
                record.created_at, record.id
            ))
        })?;
        self.conn().execute(
            "INSERT INTO records (id, collection, name, payload, position, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.collection.as_str(),
                record.name,
                record.payload,
                record.position,
                created_at,
            ],
        )?;
        Ok(())
    }

    fn update_position(&self, id: &str, position: f64) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE records SET position = ?1 WHERE id = ?2",
            params![position, id],
        )?;
        if changed == 0 {
            return Err(TreeSyncError::RecordNotFound(id.to_string()));
        }
        Ok(())
    }

    fn update_positions(&self, updates: &[(String, f64)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE records SET position = ?1 WHERE id = ?2")?;
            for (id, position) in updates {
                // Returning before commit rolls the transaction back
                if stmt.execute(params![position, id])? == 0 {
                    return Err(TreeSyncError::RecordNotFound(id.clone()));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM memberships WHERE record_id = ?1 OR category_id = ?1",
            params![id],
        )?;
        let removed = tx.execute("DELETE FROM records WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn assign_category(&self, record_id: &str, category_id: &str) -> Result<()> {
        let conn = self.conn();
        for id in [record_id, category_id] {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM records WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(TreeSyncError::RecordNotFound(id.to_string()));
            }
        }
        conn.execute(
            "INSERT OR IGNORE INTO memberships (record_id, category_id) VALUES (?1, ?2)",
            params![record_id, category_id],
        )?;
        Ok(())
    }

    fn unassign_category(&self, record_id: &str, category_id: &str) -> Result<bool> {
        let removed = self.conn().execute(
            "DELETE FROM memberships WHERE record_id = ?1 AND category_id = ?2",
            params![record_id, category_id],
        )?;
        Ok(removed > 0)
    }
}
