use anyhow::Result;
use mealkeep_store::LocalRecipeStore;

pub fn run(recipes: &LocalRecipeStore) -> Result<()> {
    let all = recipes.all()?;
    if all.is_empty() {
        println!("No recipes stored. Run `mealkeep sync` to pull the remote listing.");
        return Ok(());
    }

    for recipe in all {
        println!("{}  [{}]  {}", recipe.id, recipe.origin, recipe.name);
    }
    Ok(())
}
