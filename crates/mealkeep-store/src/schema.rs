use rusqlite_migration::{M, Migrations};

pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE recipes (
            id                TEXT PRIMARY KEY,
            name              TEXT NOT NULL,
            description       TEXT NOT NULL,
            ingredients_json  TEXT NOT NULL DEFAULT '[]',
            instructions_json TEXT NOT NULL DEFAULT '[]',
            prep_time         INTEGER,
            cook_time         INTEGER,
            total_time        INTEGER,
            servings          INTEGER,
            difficulty        TEXT,
            nutrition_json    TEXT,
            tags_json         TEXT NOT NULL DEFAULT '[]',
            dietary_json      TEXT NOT NULL DEFAULT '[]',
            tips              TEXT,
            share_caption     TEXT,
            origin            TEXT NOT NULL,
            created_at        INTEGER NOT NULL
        );

        CREATE TABLE photos (
            recipe_id    TEXT PRIMARY KEY,
            before_image BLOB,
            after_image  BLOB
        );

        CREATE TABLE migration_flags (
            name      TEXT PRIMARY KEY,
            completed INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_recipes_created_at ON recipes(created_at);",
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_validate() {
        assert!(migrations().validate().is_ok());
    }
}
