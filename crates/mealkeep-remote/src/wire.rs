//! Wire shapes for the remote object store. Kept separate from the
//! domain types so protocol drift stays contained here.

use mealkeep::{IngredientUsed, LikeCount, Nutrition, Origin, Recipe, RecipeId};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ListingResponse {
    #[serde(default)]
    pub recipes: Vec<RecipeDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients_used: Vec<IngredientUsed>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub prep_time: Option<u32>,
    pub cook_time: Option<u32>,
    pub total_time: Option<u32>,
    pub servings: Option<u32>,
    pub difficulty: Option<String>,
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dietary_flags: Vec<String>,
    pub tips: Option<String>,
    pub share_caption: Option<String>,
    pub created_at: Option<u64>,
}

impl RecipeDto {
    pub fn into_recipe(self) -> Recipe {
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

#[derive(Debug, Clone, Deserialize)]
pub struct CountsResponse {
    #[serde(default)]
    pub counts: Vec<LikeCountDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LikeCountDto {
    pub recipe_id: String,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub count: i64,
}

impl LikeCountDto {
    pub fn into_like_count(self) -> LikeCount {
        LikeCount {
            recipe_id: RecipeId::new(self.recipe_id),
            liked: self.liked,
            count: self.count,
        }
    }
}

fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_parses_with_sparse_fields() {
        let json = r#"{
            "recipes": [
                {"id": "r1", "name": "Omelette"},
                {
                    "id": "r2",
                    "name": "Stir Fry",
                    "description": "Fast weeknight dinner",
                    "ingredients_used": [{"name": "rice", "amount": "1 cup"}],
                    "instructions": ["Cook rice.", "Fry vegetables."],
                    "prep_time": 5,
                    "nutrition": {"calories": 400, "protein": 12, "carbs": 60, "fat": 10},
                    "tags": ["quick"],
                    "created_at": 1700000000
                }
            ]
        }"#;

        let listing: ListingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(listing.recipes.len(), 2);

        let sparse = listing.recipes[0].clone().into_recipe();
        assert_eq!(sparse.id.as_str(), "r1");
        assert_eq!(sparse.origin, Origin::Remote);
        assert!(sparse.created_at > 0);

        let full = listing.recipes[1].clone().into_recipe();
        assert_eq!(full.ingredients[0].name, "rice");
        assert_eq!(full.nutrition.unwrap().calories, 400);
        assert_eq!(full.created_at, 1_700_000_000);
    }

    #[test]
    fn counts_parse_with_defaults() {
        let json = r#"{"counts": [{"recipe_id": "r1", "count": 4}]}"#;
        let counts: CountsResponse = serde_json::from_str(json).unwrap();
        let count = counts.counts[0].clone().into_like_count();
        assert_eq!(count.recipe_id.as_str(), "r1");
        assert_eq!(count.count, 4);
        assert!(!count.liked);
    }
}
