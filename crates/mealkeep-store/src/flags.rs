use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::schema;
use crate::store::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable set of completed migration steps.
///
/// Read at startup before any step runs; written only after a step
/// verifiably finished. Once a flag is set it is never reset by the
/// engine, which is what makes every migration one-shot.
pub struct MigrationFlags {
    conn: Mutex<rusqlite::Connection>,
}

impl MigrationFlags {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn =
            rusqlite::Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: rusqlite::Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        schema::migrations()
            .to_latest(&mut conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn is_completed(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT completed FROM migration_flags WHERE name = ?1",
            [name],
            |row| row.get::<_, bool>(0),
        )
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(false),
            other => Err(StoreError::Database(other.to_string())),
        })
    }

    pub fn mark_completed(&self, name: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO migration_flags (name, completed) VALUES (?1, 1)",
            [name],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}
