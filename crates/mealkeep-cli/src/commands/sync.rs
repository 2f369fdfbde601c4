use anyhow::Result;
use mealkeep_sync::RecipeCache;

pub async fn run(cache: &RecipeCache, force: bool) -> Result<()> {
    let items = cache.get_items(force).await?;

    let local = items.iter().filter(|r| r.origin.is_local()).count();
    println!(
        "{} recipes available ({} local, {} remote)",
        items.len(),
        local,
        items.len() - local
    );

    Ok(())
}
