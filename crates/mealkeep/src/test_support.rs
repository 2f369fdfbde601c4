use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::backend::RecipeBackend;
use crate::error::NetworkError;
use crate::like::LikeCount;
use crate::recipe::{Origin, Recipe, RecipeId};

/// In-memory [`RecipeBackend`] for tests: canned listings and counts,
/// scripted failures, call counters, and an optional artificial delay
/// so concurrent callers can be caught mid-fetch.
pub struct InMemoryBackend {
    listing: Mutex<Vec<Recipe>>,
    counts: Mutex<HashMap<RecipeId, LikeCount>>,
    /// Errors to return, consumed front-to-back before any real work.
    scripted_failures: Mutex<Vec<NetworkError>>,
    delay: Mutex<Option<Duration>>,
    fetch_calls: AtomicUsize,
    set_liked_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            listing: Mutex::new(Vec::new()),
            counts: Mutex::new(HashMap::new()),
            scripted_failures: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            fetch_calls: AtomicUsize::new(0),
            set_liked_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_listing(listing: Vec<Recipe>) -> Self {
        let backend = Self::new();
        *backend.listing.lock().unwrap() = listing;
        backend
    }

    pub fn set_listing(&self, listing: Vec<Recipe>) {
        *self.listing.lock().unwrap() = listing;
    }

    pub fn set_count(&self, count: LikeCount) {
        self.counts
            .lock()
            .unwrap()
            .insert(count.recipe_id.clone(), count);
    }

    /// Queue an error; the next backend call consumes and returns it.
    pub fn push_failure(&self, error: NetworkError) {
        self.scripted_failures.lock().unwrap().push(error);
    }

    /// Make every call sleep first, holding concurrent callers open.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn set_liked_calls(&self) -> usize {
        self.set_liked_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) -> Result<(), NetworkError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = {
            let mut scripted = self.scripted_failures.lock().unwrap();
            if scripted.is_empty() {
                None
            } else {
                Some(scripted.remove(0))
            }
        };
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecipeBackend for InMemoryBackend {
    fn label(&self) -> &str {
        "in-memory"
    }

    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, NetworkError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.begin_call().await?;
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn set_liked(&self, id: &RecipeId, liked: bool) -> Result<(), NetworkError> {
        self.set_liked_calls.fetch_add(1, Ordering::SeqCst);
        self.begin_call().await?;
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry(id.clone()).or_insert_with(|| LikeCount {
            recipe_id: id.clone(),
            liked: false,
            count: 0,
        });
        if liked != entry.liked {
            entry.count += if liked { 1 } else { -1 };
        }
        entry.liked = liked;
        Ok(())
    }

    async fn like_counts(&self, ids: &[RecipeId]) -> Result<Vec<LikeCount>, NetworkError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.begin_call().await?;
        let counts = self.counts.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| counts.get(id).cloned())
            .collect())
    }
}

/// Shorthand remote-sourced recipe for tests.
pub fn remote_recipe(id: &str, name: &str) -> Recipe {
    Recipe::bare(
        RecipeId::new(id),
        name,
        format!("{name} from the remote store"),
        Origin::Remote,
        1_700_000_000,
    )
}

/// Shorthand locally created recipe for tests.
pub fn local_recipe(id: &str, name: &str) -> Recipe {
    Recipe::bare(
        RecipeId::new(id),
        name,
        format!("{name} captured on this device"),
        Origin::Local,
        1_700_000_000,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_failure_is_consumed_once() {
        let backend = InMemoryBackend::with_listing(vec![remote_recipe("a", "Pasta")]);
        backend.push_failure(NetworkError::Http(503));

        assert_eq!(
            backend.fetch_recipes().await,
            Err(NetworkError::Http(503))
        );
        let listing = backend.fetch_recipes().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(backend.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn set_liked_is_absolute_not_a_delta() {
        let backend = InMemoryBackend::new();
        let id = RecipeId::new("a");

        backend.set_liked(&id, true).await.unwrap();
        // Repeating the same absolute value does not double-count.
        backend.set_liked(&id, true).await.unwrap();

        let counts = backend.like_counts(std::slice::from_ref(&id)).await.unwrap();
        assert_eq!(counts[0].count, 1);
        assert!(counts[0].liked);
    }
}
