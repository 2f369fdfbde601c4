use anyhow::{Result, bail};
use mealkeep::RecipeId;
use mealkeep_store::{LocalRecipeStore, PhotoStore};

pub fn run(recipes: &LocalRecipeStore, photos: &PhotoStore, id: &str) -> Result<()> {
    let id = RecipeId::new(id);
    let Some(recipe) = recipes.get(&id)? else {
        bail!("no recipe stored with id {id}");
    };

    println!("{}", recipe.name);
    println!("{}", recipe.description);
    println!("origin: {}", recipe.origin);

    if !recipe.ingredients.is_empty() {
        println!("\nIngredients:");
        for ingredient in &recipe.ingredients {
            if ingredient.amount.is_empty() {
                println!("  - {}", ingredient.name);
            } else {
                println!("  - {} ({})", ingredient.name, ingredient.amount);
            }
        }
    }

    if !recipe.instructions.is_empty() {
        println!("\nSteps:");
        for (index, step) in recipe.instructions.iter().enumerate() {
            println!("  {}. {step}", index + 1);
        }
    }

    if let Some(nutrition) = &recipe.nutrition {
        println!(
            "\n{} kcal, {}g protein, {}g carbs, {}g fat",
            nutrition.calories, nutrition.protein, nutrition.carbs, nutrition.fat
        );
    }

    if !recipe.tags.is_empty() {
        println!("tags: {}", recipe.tags.join(", "));
    }

    if let Some(pair) = photos.get(&id)? {
        let describe = |slot: &Option<Vec<u8>>| match slot {
            Some(bytes) => format!("{} bytes", bytes.len()),
            None => "none".to_owned(),
        };
        println!(
            "photos: before {}, after {}",
            describe(&pair.before),
            describe(&pair.after)
        );
    }

    Ok(())
}
