use anyhow::Result;
use mealkeep::RecipeId;
use mealkeep_sync::LikeStateManager;

pub async fn run(likes: &LikeStateManager, id: &str) -> Result<()> {
    let id = RecipeId::new(id);

    // Best effort: seed the local count so the toggle prints a sensible
    // total. Offline is fine; the toggle itself decides success.
    if let Err(error) = likes.refresh_counts(std::slice::from_ref(&id)).await {
        tracing::debug!(recipe = %id, error = %error, "count refresh skipped");
    }

    let liked = likes.toggle(&id).await?;
    if liked {
        println!("Liked ({} total)", likes.count(&id));
    } else {
        println!("Unliked ({} total)", likes.count(&id));
    }
    Ok(())
}
