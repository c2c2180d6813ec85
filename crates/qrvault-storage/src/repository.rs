//! Record storage collaborators

use crate::{migrations, Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use qrvault_core::QrRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// Record storage abstraction
///
/// Records are never updated in place; replacing one is delete + insert.
pub trait RecordStore: Send + Sync {
    /// All records, oldest first
    fn list(&self) -> Result<Vec<QrRecord>>;

    /// Look up one record
    fn get(&self, id: Uuid) -> Result<Option<QrRecord>> {
        Ok(self.list()?.into_iter().find(|r| r.id() == id))
    }

    /// Insert a new record; an existing id is an error
    fn insert(&self, record: &QrRecord) -> Result<()>;

    /// Delete a record, returning whether it existed
    fn delete(&self, id: Uuid) -> Result<bool>;

    /// Delete every record, returning how many were removed
    fn delete_all(&self) -> Result<usize>;
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<QrRecord>>,
}

impl MemoryRecordStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn list(&self) -> Result<Vec<QrRecord>> {
        Ok(self.records.read().clone())
    }

    fn insert(&self, record: &QrRecord) -> Result<()> {
        let mut records = self.records.write();
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(Error::Validation(format!("duplicate record id {}", record.id())));
        }
        records.push(record.clone());
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id() != id);
        Ok(records.len() != before)
    }

    fn delete_all(&self) -> Result<usize> {
        let mut records = self.records.write();
        let count = records.len();
        records.clear();
        Ok(count)
    }
}

/// SQLite-backed record store
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

type RawRow = (String, String, Vec<u8>, String, Option<String>);

impl SqliteRecordStore {
    /// Open (creating if needed) a database file and migrate it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// In-memory database, for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn parse_row(raw: RawRow) -> Result<QrRecord> {
        let (id, label, ciphertext, date_added, cached_type) = raw;
        let id = Uuid::parse_str(&id)
            .map_err(|e| Error::Validation(format!("invalid record id {:?}: {}", id, e)))?;
        let date_added = DateTime::parse_from_rfc3339(&date_added)
            .map_err(|e| Error::Validation(format!("invalid date for {}: {}", id, e)))?
            .with_timezone(&Utc);
        Ok(QrRecord::from_parts(id, label, ciphertext, date_added, cached_type)?)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

impl RecordStore for SqliteRecordStore {
    fn list(&self) -> Result<Vec<QrRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, label, ciphertext, date_added, cached_type
             FROM qr_records ORDER BY date_added, rowid",
        )?;
        let rows = stmt.query_map([], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            match Self::parse_row(row?) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping malformed record row: {}", e),
            }
        }
        Ok(records)
    }

    fn get(&self, id: Uuid) -> Result<Option<QrRecord>> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT id, label, ciphertext, date_added, cached_type
                 FROM qr_records WHERE id = ?1",
                [id.to_string()],
                read_row,
            )
            .optional()?;
        raw.map(Self::parse_row).transpose()
    }

    fn insert(&self, record: &QrRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO qr_records (id, label, ciphertext, date_added, cached_type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id().to_string(),
                record.label(),
                record.ciphertext(),
                record.date_added().to_rfc3339_opts(SecondsFormat::Micros, true),
                record.cached_type(),
            ],
        )?;
        tracing::debug!("Inserted record {}", record.id());
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM qr_records WHERE id = ?1", [id.to_string()])?;
        Ok(rows > 0)
    }

    fn delete_all(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM qr_records", [])?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stores() -> Vec<Box<dyn RecordStore>> {
        vec![
            Box::new(MemoryRecordStore::new()),
            Box::new(SqliteRecordStore::open_in_memory().unwrap()),
        ]
    }

    #[test]
    fn test_insert_list_delete() {
        for store in stores() {
            let a = QrRecord::new("a", vec![1]).unwrap();
            let b = QrRecord::new("b", vec![2]).unwrap();
            store.insert(&a).unwrap();
            store.insert(&b).unwrap();

            let listed = store.list().unwrap();
            assert_eq!(listed.len(), 2);
            assert_eq!(store.get(a.id()).unwrap().unwrap().label(), "a");

            assert!(store.delete(a.id()).unwrap());
            assert!(!store.delete(a.id()).unwrap());
            assert!(store.get(a.id()).unwrap().is_none());
            assert_eq!(store.delete_all().unwrap(), 1);
            assert!(store.list().unwrap().is_empty());
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        for store in stores() {
            let a = QrRecord::new("a", vec![1]).unwrap();
            store.insert(&a).unwrap();
            assert!(store.insert(&a).is_err());
        }
    }

    #[test]
    fn test_sqlite_round_trips_fields() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let record = QrRecord::new("label", vec![9, 8, 7])
            .unwrap()
            .with_category(qrvault_core::Category::Address);
        store.insert(&record).unwrap();

        let loaded = store.get(record.id()).unwrap().unwrap();
        assert_eq!(loaded.ciphertext(), record.ciphertext());
        assert_eq!(loaded.cached_type(), Some("Address"));
        assert_eq!(
            loaded.date_added().timestamp_micros(),
            record.date_added().timestamp_micros()
        );
    }

    #[test]
    fn test_sqlite_skips_malformed_rows() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let good = QrRecord::new("good", vec![1]).unwrap();
        store.insert(&good).unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO qr_records (id, label, ciphertext, date_added, cached_type)
                 VALUES ('not-a-uuid', 'bad', x'01', '2021-01-01T00:00:00Z', NULL)",
                [],
            )
            .unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), good.id());
    }
}
