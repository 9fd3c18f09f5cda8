use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};
use tracing::debug;

/// Key-value slot table using SQLite
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - A single-row upsert replaces the old value or leaves it alone
/// - Doesn't require a separate process
pub struct SlotTable {
    conn: Connection,
}

impl SlotTable {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        // Initialize schema on first run
        Self::init_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Open a throwaway database that lives as long as this table
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Read the raw value stored under `key`, if any
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM slots WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
    }

    /// Replace the value stored under `key`
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        debug!("Wrote slot {} ({} bytes)", key, value.len());
        Ok(())
    }
}
