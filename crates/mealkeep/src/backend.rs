use std::sync::Arc;

use crate::error::NetworkError;
use crate::like::LikeCount;
use crate::recipe::{Recipe, RecipeId};

/// The remote object store, seen through the operations this engine
/// needs. Implemented over HTTP by the remote crate and by in-memory
/// fakes in tests.
#[async_trait::async_trait]
pub trait RecipeBackend: Send + Sync {
    /// Human-readable label identifying this backend.
    fn label(&self) -> &str;

    /// Fetch the full remote recipe listing.
    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, NetworkError>;

    /// Persist an absolute liked value for one recipe. Absolute rather
    /// than a delta so that concurrent devices converge last-writer-wins.
    async fn set_liked(&self, id: &RecipeId, liked: bool) -> Result<(), NetworkError>;

    /// Fetch authoritative like counts for a batch of recipes.
    async fn like_counts(&self, ids: &[RecipeId]) -> Result<Vec<LikeCount>, NetworkError>;
}

#[async_trait::async_trait]
impl<T: RecipeBackend + ?Sized> RecipeBackend for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, NetworkError> {
        (**self).fetch_recipes().await
    }

    async fn set_liked(&self, id: &RecipeId, liked: bool) -> Result<(), NetworkError> {
        (**self).set_liked(id, liked).await
    }

    async fn like_counts(&self, ids: &[RecipeId]) -> Result<Vec<LikeCount>, NetworkError> {
        (**self).like_counts(ids).await
    }
}
