use anyhow::{Result, bail};
use mealkeep::RecipeId;
use mealkeep_store::{LocalRecipeStore, PhotoStore};

pub fn run(recipes: &LocalRecipeStore, photos: &PhotoStore, id: &str) -> Result<()> {
    let id = RecipeId::new(id);
    if !recipes.exists(&id)? {
        bail!("no recipe stored with id {id}");
    }

    recipes.remove(&id)?;
    photos.remove(&id)?;
    println!("Removed {id}");
    Ok(())
}
