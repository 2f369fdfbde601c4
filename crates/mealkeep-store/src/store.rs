use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use mealkeep::{IngredientUsed, Nutrition, Origin, Recipe, RecipeId};

use crate::schema;

/// How long a connection waits on a locked database before giving up.
/// Several stores may share one database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The authoritative local collection of recipes, keyed by id.
///
/// This store is the single source of truth for UI-facing reads; the
/// remote listing is reconciled into it, never the other way around.
pub struct LocalRecipeStore {
    conn: Mutex<rusqlite::Connection>,
}

impl LocalRecipeStore {
    /// Open a store backed by a file on disk, creating and migrating
    /// the schema as needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn =
            rusqlite::Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store (for testing).
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

    /// Insert or replace a recipe. Saving the same id twice overwrites.
    pub fn save(&self, recipe: &Recipe) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        let ingredients_json = serde_json::to_string(&recipe.ingredients)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let instructions_json = serde_json::to_string(&recipe.instructions)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let nutrition_json = recipe
            .nutrition
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let tags_json = serde_json::to_string(&recipe.tags)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let dietary_json = serde_json::to_string(&recipe.dietary_flags)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO recipes
                (id, name, description, ingredients_json, instructions_json,
                 prep_time, cook_time, total_time, servings, difficulty,
                 nutrition_json, tags_json, dietary_json, tips, share_caption,
                 origin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            rusqlite::params![
                recipe.id.as_str(),
                recipe.name,
                recipe.description,
                ingredients_json,
                instructions_json,
                recipe.prep_time,
                recipe.cook_time,
                recipe.total_time,
                recipe.servings,
                recipe.difficulty,
                nutrition_json,
                tags_json,
                dietary_json,
                recipe.tips,
                recipe.share_caption,
                recipe.origin.to_string(),
                recipe.created_at as i64,
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    pub fn exists(&self, id: &RecipeId) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM recipes WHERE id = ?1",
                [id.as_str()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::Database(other.to_string())),
            })?;
        Ok(found.is_some())
    }

    pub fn get(&self, id: &RecipeId) -> Result<Option<Recipe>, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
            [id.as_str()],
            Self::row_to_recipe,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError::Database(other.to_string())),
        })
    }

    /// All stored recipes, newest first.
    pub fn all(&self) -> Result<Vec<Recipe>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at DESC, id"
            ))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let recipes = stmt
            .query_map([], Self::row_to_recipe)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(recipes)
    }

    pub fn remove(&self, id: &RecipeId) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM recipes WHERE id = ?1", [id.as_str()])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(count as u64)
    }

    fn row_to_recipe(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let description: String = row.get(2)?;
        let ingredients_json: String = row.get(3)?;
        let instructions_json: String = row.get(4)?;
        let prep_time: Option<u32> = row.get(5)?;
        let cook_time: Option<u32> = row.get(6)?;
        let total_time: Option<u32> = row.get(7)?;
        let servings: Option<u32> = row.get(8)?;
        let difficulty: Option<String> = row.get(9)?;
        let nutrition_json: Option<String> = row.get(10)?;
        let tags_json: String = row.get(11)?;
        let dietary_json: String = row.get(12)?;
        let tips: Option<String> = row.get(13)?;
        let share_caption: Option<String> = row.get(14)?;
        let origin: String = row.get(15)?;
        let created_at: i64 = row.get(16)?;
        let created_at = created_at as u64;

        let ingredients: Vec<IngredientUsed> =
            serde_json::from_str(&ingredients_json).unwrap_or_default();
        let instructions: Vec<String> =
            serde_json::from_str(&instructions_json).unwrap_or_default();
        let nutrition: Option<Nutrition> =
            nutrition_json.and_then(|json| serde_json::from_str(&json).ok());
        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
        let dietary_flags: Vec<String> = serde_json::from_str(&dietary_json).unwrap_or_default();

        Ok(Recipe {
            id: RecipeId::new(id),
            name,
            description,
            ingredients,
            instructions,
            prep_time,
            cook_time,
            total_time,
            servings,
            difficulty,
            nutrition,
            tags,
            dietary_flags,
            tips,
            share_caption,
            origin: Origin::parse(&origin),
            created_at,
        })
    }
}

const RECIPE_COLUMNS: &str = "id, name, description, ingredients_json, instructions_json, \
     prep_time, cook_time, total_time, servings, difficulty, \
     nutrition_json, tags_json, dietary_json, tips, share_caption, \
     origin, created_at";

/// Errors specific to durable store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),
}
