use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use mealkeep::{PhotoPair, RecipeId};

use crate::schema;
use crate::store::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable before/after photo pairs keyed by recipe id.
///
/// Slots update independently: an omitted slot never touches what is
/// already stored, so "set the after photo later" cannot clobber the
/// before photo.
pub struct PhotoStore {
    conn: Mutex<rusqlite::Connection>,
}

impl PhotoStore {
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

    /// Store one or both photo slots. `None` leaves the stored slot as
    /// it is; only a `Some` value writes.
    pub fn store_photos(
        &self,
        before: Option<&[u8]>,
        after: Option<&[u8]>,
        id: &RecipeId,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO photos (recipe_id, before_image, after_image)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(recipe_id) DO UPDATE SET
                 before_image = COALESCE(excluded.before_image, before_image),
                 after_image  = COALESCE(excluded.after_image, after_image)",
            rusqlite::params![id.as_str(), before, after],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set only the after slot, e.g. when the user photographs the
    /// finished dish long after capture.
    pub fn store_after_photo(&self, photo: &[u8], id: &RecipeId) -> Result<(), StoreError> {
        self.store_photos(None, Some(photo), id)
    }

    pub fn get(&self, id: &RecipeId) -> Result<Option<PhotoPair>, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT before_image, after_image FROM photos WHERE recipe_id = ?1",
            [id.as_str()],
            |row| {
                Ok(PhotoPair {
                    recipe_id: id.clone(),
                    before: row.get(0)?,
                    after: row.get(1)?,
                })
            },
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError::Database(other.to_string())),
        })
    }

    pub fn exists(&self, id: &RecipeId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }

    pub fn remove(&self, id: &RecipeId) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM photos WHERE recipe_id = ?1", [id.as_str()])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}
