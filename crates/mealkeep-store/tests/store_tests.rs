use mealkeep::{IngredientUsed, Nutrition, Origin, Recipe, RecipeId};
use mealkeep_store::LocalRecipeStore;

fn sample_recipe(id: &str, name: &str, created_at: u64) -> Recipe {
    Recipe {
        id: RecipeId::new(id),
        name: name.to_owned(),
        description: format!("{name} description"),
        ingredients: vec![
            IngredientUsed {
                name: "eggs".to_owned(),
                amount: "3".to_owned(),
            },
            IngredientUsed {
                name: "tomatoes".to_owned(),
                amount: "2 large".to_owned(),
            },
        ],
        instructions: vec!["Chop.".to_owned(), "Simmer.".to_owned(), "Serve.".to_owned()],
        prep_time: Some(10),
        cook_time: Some(20),
        total_time: Some(30),
        servings: Some(2),
        difficulty: Some("easy".to_owned()),
        nutrition: Some(Nutrition {
            calories: 320,
            protein: 18,
            carbs: 12,
            fat: 22,
            fiber: Some(4),
            sugar: None,
            sodium: None,
        }),
        tags: vec!["quick".to_owned(), "vegetarian".to_owned()],
        dietary_flags: vec!["gluten-free".to_owned()],
        tips: Some("Use ripe tomatoes.".to_owned()),
        share_caption: None,
        origin: Origin::Local,
        created_at,
    }
}

fn create_store() -> LocalRecipeStore {
    LocalRecipeStore::open_in_memory().unwrap()
}

#[test]
fn all_returns_empty_when_no_recipes() {
    let store = create_store();
    assert!(store.all().unwrap().is_empty());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn save_then_get_round_trips_every_field() {
    let store = create_store();
    let recipe = sample_recipe("r1", "Shakshuka", 1_700_000_000);
    store.save(&recipe).unwrap();

    let fetched = store.get(&RecipeId::new("r1")).unwrap().unwrap();
    assert_eq!(fetched, recipe);
}

#[test]
fn get_missing_returns_none() {
    let store = create_store();
    assert!(store.get(&RecipeId::new("nope")).unwrap().is_none());
    assert!(!store.exists(&RecipeId::new("nope")).unwrap());
}

#[test]
fn save_is_idempotent_per_id() {
    let store = create_store();
    let mut recipe = sample_recipe("r1", "Original", 1_700_000_000);
    store.save(&recipe).unwrap();

    recipe.name = "Updated".to_owned();
    store.save(&recipe).unwrap();

    assert_eq!(store.count().unwrap(), 1);
    let fetched = store.get(&RecipeId::new("r1")).unwrap().unwrap();
    assert_eq!(fetched.name, "Updated");
}

#[test]
fn all_orders_newest_first() {
    let store = create_store();
    store
        .save(&sample_recipe("old", "Old", 1_600_000_000))
        .unwrap();
    store
        .save(&sample_recipe("new", "New", 1_700_000_000))
        .unwrap();
    store
        .save(&sample_recipe("mid", "Mid", 1_650_000_000))
        .unwrap();

    let names: Vec<String> = store.all().unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["New", "Mid", "Old"]);
}

#[test]
fn remove_deletes_only_the_given_id() {
    let store = create_store();
    store
        .save(&sample_recipe("r1", "Keep", 1_700_000_000))
        .unwrap();
    store
        .save(&sample_recipe("r2", "Drop", 1_700_000_001))
        .unwrap();

    store.remove(&RecipeId::new("r2")).unwrap();

    assert!(store.exists(&RecipeId::new("r1")).unwrap());
    assert!(!store.exists(&RecipeId::new("r2")).unwrap());
}

#[test]
fn recipes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mealkeep.db");

    {
        let store = LocalRecipeStore::open(&path).unwrap();
        store
            .save(&sample_recipe("r1", "Durable", 1_700_000_000))
            .unwrap();
    }

    let reopened = LocalRecipeStore::open(&path).unwrap();
    let fetched = reopened.get(&RecipeId::new("r1")).unwrap().unwrap();
    assert_eq!(fetched.name, "Durable");
    assert_eq!(fetched.origin, Origin::Local);
}

#[test]
fn optional_fields_stay_absent() {
    let store = create_store();
    let recipe = Recipe::bare(
        RecipeId::new("bare"),
        "Toast",
        "Bread, heated",
        Origin::Remote,
        1_700_000_000,
    );
    store.save(&recipe).unwrap();

    let fetched = store.get(&RecipeId::new("bare")).unwrap().unwrap();
    assert!(fetched.nutrition.is_none());
    assert!(fetched.prep_time.is_none());
    assert!(fetched.tips.is_none());
    assert!(fetched.ingredients.is_empty());
    assert_eq!(fetched.origin, Origin::Remote);
}
