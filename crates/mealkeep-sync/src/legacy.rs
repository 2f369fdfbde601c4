//! The legacy on-device storage generations and their import steps.
//!
//! Formats here are frozen: they describe what old clients actually
//! wrote, so they parse liberally and never evolve with the current
//! data model.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use mealkeep::{
    Feedback, IngredientUsed, MigrationCoordinator, Nutrition, Origin, Recipe, RecipeId,
};
use mealkeep_store::{LocalRecipeStore, PhotoStore};
use serde::Deserialize;

use crate::migrate::{MigrationError, MigrationStep, StepCounts};

/// First generation: a single JSON array exported by the earliest app
/// builds. Records carry no identifier and no photos.
pub struct LegacyJsonExport {
    path: PathBuf,
    recipes: Arc<LocalRecipeStore>,
}

impl LegacyJsonExport {
    pub fn new(path: impl Into<PathBuf>, recipes: Arc<LocalRecipeStore>) -> Self {
        Self {
            path: path.into(),
            recipes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct V1Record {
    meal_name: String,
    #[serde(default)]
    meal_description: String,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    recipe_steps: Vec<String>,
    nutritional_info: Option<Nutrition>,
    created_at: Option<u64>,
}

impl V1Record {
    fn into_recipe(self) -> Recipe {
        let id = derive_v1_id(&self.meal_name, self.created_at);
        let created_at = self.created_at.unwrap_or_else(now_epoch_secs);
        let mut recipe = Recipe::bare(id, self.meal_name, self.meal_description, Origin::Local, created_at);
        recipe.ingredients = self
            .ingredients
            .into_iter()
            .map(|name| IngredientUsed {
                name,
                amount: String::new(),
            })
            .collect();
        recipe.instructions = self.recipe_steps;
        recipe.nutrition = self.nutritional_info;
        recipe
    }
}

/// v1 records have no identifier, so one is derived deterministically
/// from the record itself. Stability matters: a re-run after a partial
/// failure must map each record to the same id to dedupe.
fn derive_v1_id(name: &str, created_at: Option<u64>) -> RecipeId {
    let seed = format!("{}:{}", name, created_at.unwrap_or(0));
    let id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, seed.as_bytes());
    RecipeId::new(id.to_string())
}

#[async_trait::async_trait]
impl MigrationStep for LegacyJsonExport {
    fn name(&self) -> &str {
        "legacy-json-export"
    }

    async fn run(&self) -> Result<StepCounts, MigrationError> {
        let mut counts = StepCounts::default();
        if !self.path.exists() {
            return Ok(counts);
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| MigrationError::Read(e.to_string()))?;
        let records: Vec<serde_json::Value> =
            serde_json::from_str(&contents).map_err(|e| MigrationError::Parse(e.to_string()))?;

        for (index, value) in records.into_iter().enumerate() {
            let record: V1Record = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(index, error = %error, "skipping unreadable v1 record");
                    counts
                        .feedback
                        .push(Feedback::warning(format!("skipping record {index}: {error}")));
                    counts.failed_records += 1;
                    continue;
                }
            };

            import_recipe(&self.recipes, record.into_recipe(), &mut counts);
        }

        Ok(counts)
    }
}

/// Second generation: a documents directory holding one `<id>.json` per
/// recipe, with optional `<id>_before.jpg` / `<id>_after.jpg` photos
/// beside it.
pub struct LegacyDocumentsDir {
    dir: PathBuf,
    recipes: Arc<LocalRecipeStore>,
    photos: Arc<PhotoStore>,
    imports: MigrationCoordinator<RecipeId>,
}

impl LegacyDocumentsDir {
    pub fn new(
        dir: impl Into<PathBuf>,
        recipes: Arc<LocalRecipeStore>,
        photos: Arc<PhotoStore>,
    ) -> Self {
        Self {
            dir: dir.into(),
            recipes,
            photos,
            imports: MigrationCoordinator::new(),
        }
    }

    fn import_photos(&self, id: &RecipeId, counts: &mut StepCounts) {
        if !self.imports.start(id.clone()) {
            return;
        }

        let before = match read_optional(&self.dir.join(format!("{}_before.jpg", id.as_str()))) {
            Ok(bytes) => bytes,
            Err(error) => {
                counts
                    .feedback
                    .push(Feedback::warning(format!("photo read failed for {id}: {error}")));
                counts.failed_records += 1;
                self.imports.fail(id);
                return;
            }
        };
        let after = match read_optional(&self.dir.join(format!("{}_after.jpg", id.as_str()))) {
            Ok(bytes) => bytes,
            Err(error) => {
                counts
                    .feedback
                    .push(Feedback::warning(format!("photo read failed for {id}: {error}")));
                counts.failed_records += 1;
                self.imports.fail(id);
                return;
            }
        };

        if before.is_none() && after.is_none() {
            self.imports.complete(id);
            return;
        }

        match self
            .photos
            .store_photos(before.as_deref(), after.as_deref(), id)
        {
            Ok(()) => self.imports.complete(id),
            Err(error) => {
                tracing::warn!(recipe = %id, error = %error, "photo import failed");
                counts
                    .feedback
                    .push(Feedback::warning(format!("photo import failed for {id}: {error}")));
                counts.failed_records += 1;
                self.imports.fail(id);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct V2Document {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ingredients: Vec<IngredientUsed>,
    #[serde(default)]
    instructions: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    prep_time: Option<u32>,
    cook_time: Option<u32>,
    servings: Option<u32>,
    created_at: Option<u64>,
}

impl V2Document {
    fn into_recipe(self) -> Recipe {
        let created_at = self.created_at.unwrap_or_else(now_epoch_secs);
        let mut recipe = Recipe::bare(
            RecipeId::new(self.id),
            self.name,
            self.description,
            Origin::Local,
            created_at,
        );
        recipe.ingredients = self.ingredients;
        recipe.instructions = self.instructions;
        recipe.tags = self.tags;
        recipe.prep_time = self.prep_time;
        recipe.cook_time = self.cook_time;
        recipe.servings = self.servings;
        recipe
    }
}

#[async_trait::async_trait]
impl MigrationStep for LegacyDocumentsDir {
    fn name(&self) -> &str {
        "legacy-documents-dir"
    }

    async fn run(&self) -> Result<StepCounts, MigrationError> {
        let mut counts = StepCounts::default();
        if !self.dir.is_dir() {
            return Ok(counts);
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| MigrationError::Read(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| MigrationError::Read(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(error) => {
                    counts.feedback.push(Feedback::warning(format!(
                        "skipping {}: {error}",
                        path.display()
                    )));
                    counts.failed_records += 1;
                    continue;
                }
            };
            let document: V2Document = match serde_json::from_str(&contents) {
                Ok(document) => document,
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "skipping unreadable v2 document");
                    counts.feedback.push(Feedback::warning(format!(
                        "skipping {}: {error}",
                        path.display()
                    )));
                    counts.failed_records += 1;
                    continue;
                }
            };

            let recipe = document.into_recipe();
            let id = recipe.id.clone();
            let imported = import_recipe(&self.recipes, recipe, &mut counts);
            if imported {
                self.import_photos(&id, &mut counts);
            }
        }

        Ok(counts)
    }
}

/// Third generation: the previous app cached the remote listing as one
/// JSON document. Entries unknown to the store are imported as
/// remote-sourced so they stay readable offline.
pub struct LegacyListingCache {
    path: PathBuf,
    recipes: Arc<LocalRecipeStore>,
}

impl LegacyListingCache {
    pub fn new(path: impl Into<PathBuf>, recipes: Arc<LocalRecipeStore>) -> Self {
        Self {
            path: path.into(),
            recipes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CachedListing {
    #[serde(default)]
    recipes: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CachedEntry {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ingredients_used: Vec<IngredientUsed>,
    #[serde(default)]
    instructions: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    dietary_flags: Vec<String>,
    prep_time: Option<u32>,
    cook_time: Option<u32>,
    total_time: Option<u32>,
    servings: Option<u32>,
    difficulty: Option<String>,
    nutrition: Option<Nutrition>,
    tips: Option<String>,
    share_caption: Option<String>,
    created_at: Option<u64>,
}

impl CachedEntry {
    fn into_recipe(self) -> Recipe {
        Recipe {
            id: RecipeId::new(self.id),
            name: self.name,
            description: self.description,
            ingredients: self.ingredients_used,
            instructions: self.instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            total_time: self.total_time,
            servings: self.servings,
            difficulty: self.difficulty,
            nutrition: self.nutrition,
            tags: self.tags,
            dietary_flags: self.dietary_flags,
            tips: self.tips,
            share_caption: self.share_caption,
            origin: Origin::Remote,
            created_at: self.created_at.unwrap_or_else(now_epoch_secs),
        }
    }
}

#[async_trait::async_trait]
impl MigrationStep for LegacyListingCache {
    fn name(&self) -> &str {
        "legacy-listing-cache"
    }

    async fn run(&self) -> Result<StepCounts, MigrationError> {
        let mut counts = StepCounts::default();
        if !self.path.exists() {
            return Ok(counts);
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| MigrationError::Read(e.to_string()))?;
        let listing: CachedListing =
            serde_json::from_str(&contents).map_err(|e| MigrationError::Parse(e.to_string()))?;

        for (index, value) in listing.recipes.into_iter().enumerate() {
            let entry: CachedEntry = match serde_json::from_value(value) {
                Ok(entry) => entry,
                Err(error) => {
                    counts
                        .feedback
                        .push(Feedback::warning(format!("skipping entry {index}: {error}")));
                    counts.failed_records += 1;
                    continue;
                }
            };

            import_recipe(&self.recipes, entry.into_recipe(), &mut counts);
        }

        Ok(counts)
    }
}

/// Shared import tail: skip ids the store already holds, otherwise save
/// and count. Returns true when the recipe was newly imported. Storage
/// failures are per-record: reported and skipped, never fatal to the
/// step.
fn import_recipe(store: &LocalRecipeStore, recipe: Recipe, counts: &mut StepCounts) -> bool {
    let id = recipe.id.clone();
    match store.exists(&id) {
        Ok(true) => {
            counts.already_existed += 1;
            false
        }
        Ok(false) => match store.save(&recipe) {
            Ok(()) => {
                counts.migrated += 1;
                true
            }
            Err(error) => {
                tracing::warn!(recipe = %id, error = %error, "record import failed");
                counts
                    .feedback
                    .push(Feedback::warning(format!("import failed for {id}: {error}")));
                counts.failed_records += 1;
                false
            }
        },
        Err(error) => {
            counts
                .feedback
                .push(Feedback::warning(format!("lookup failed for {id}: {error}")));
            counts.failed_records += 1;
            false
        }
    }
}

fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
