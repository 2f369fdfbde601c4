use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, globally unique identifier for a recipe.
/// Remote-sourced recipes carry the identifier the remote store minted;
/// locally created and migrated recipes mint their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a recipe originated on this device or was pulled down
/// from the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    Remote,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl Origin {
    pub fn parse(s: &str) -> Self {
        match s {
            "local" => Self::Local,
            _ => Self::Remote,
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

/// One ingredient line: what and how much.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientUsed {
    pub name: String,
    #[serde(default)]
    pub amount: String,
}

/// Estimated nutrition per serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: u32,
    #[serde(default)]
    pub protein: u32,
    #[serde(default)]
    pub carbs: u32,
    #[serde(default)]
    pub fat: u32,
    pub fiber: Option<u32>,
    pub sugar: Option<u32>,
    pub sodium: Option<u32>,
}

/// The synchronized content entity. Immutable after creation as far as
/// this engine is concerned; likes and photos live beside it under the
/// same identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<IngredientUsed>,
    /// Ordered preparation steps.
    pub instructions: Vec<String>,
    pub prep_time: Option<u32>,
    pub cook_time: Option<u32>,
    pub total_time: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<String>,
    pub nutrition: Option<Nutrition>,
    pub tags: Vec<String>,
    pub dietary_flags: Vec<String>,
    pub tips: Option<String>,
    pub share_caption: Option<String>,
    pub origin: Origin,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
}

impl Recipe {
    /// Minimal constructor for a recipe that has only the required
    /// fields filled in. Everything optional starts empty.
    pub fn bare(
        id: RecipeId,
        name: impl Into<String>,
        description: impl Into<String>,
        origin: Origin,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            prep_time: None,
            cook_time: None,
            total_time: None,
            servings: None,
            difficulty: None,
            nutrition: None,
            tags: Vec::new(),
            dietary_flags: Vec::new(),
            tips: None,
            share_caption: None,
            origin,
            created_at,
        }
    }
}
