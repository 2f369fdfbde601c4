use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use mealkeep::{FetchCoordinator, FetchError, Recipe, RecipeBackend, RecipeId};
use mealkeep_store::LocalRecipeStore;

/// The fixed coordinator key for the remote listing; there is exactly
/// one listing, so all refreshes contend on this.
const LISTING_KEY: &str = "recipe-listing";

#[derive(Debug, Clone)]
struct CacheEntry {
    items: Vec<Recipe>,
    fetched_at: u64,
}

/// Explicitly refreshable cache of the remote recipe listing.
///
/// The cache holds only rebuildable state: losing it costs a re-fetch,
/// never data. The durable store stays authoritative. Remote items are
/// written back into it, and on merge a local id always shadows the
/// remote copy of the same id.
pub struct RecipeCache {
    backend: Arc<dyn RecipeBackend>,
    store: Arc<LocalRecipeStore>,
    entry: Mutex<Option<CacheEntry>>,
    coordinator: FetchCoordinator<String, Vec<Recipe>>,
}

impl RecipeCache {
    pub fn new(backend: Arc<dyn RecipeBackend>, store: Arc<LocalRecipeStore>) -> Self {
        Self {
            backend,
            store,
            entry: Mutex::new(None),
            coordinator: FetchCoordinator::new(),
        }
    }

    /// Items for display. With a warm entry and no forced refresh this
    /// never touches the network; otherwise exactly one refresh runs no
    /// matter how many callers arrive concurrently.
    pub async fn get_items(&self, force_refresh: bool) -> Result<Vec<Recipe>, FetchError> {
        if !force_refresh && let Some(items) = self.cached() {
            return self.merge_with_store(items);
        }

        loop {
            if self.coordinator.start_if_absent(LISTING_KEY.to_owned()) {
                let key = LISTING_KEY.to_owned();
                match self.refresh().await {
                    Ok(items) => {
                        self.coordinator.complete(&key, items.clone());
                        return self.merge_with_store(items);
                    }
                    Err(error) => {
                        self.coordinator.fail(&key, error.clone());
                        return Err(error);
                    }
                }
            }

            if let Some(receiver) = self.coordinator.subscribe(&LISTING_KEY.to_owned()) {
                return match receiver.await {
                    Ok(Ok(items)) => self.merge_with_store(items),
                    Ok(Err(error)) => Err(error),
                    Err(_) => Err(FetchError::new("listing refresh dropped before completion")),
                };
            }

            // The in-flight refresh finished between the claim check and
            // subscribing; its result is in the entry now.
            if let Some(items) = self.cached() {
                return self.merge_with_store(items);
            }
            // Entry was cleared in the same window; claim the key ourselves.
        }
    }

    /// Drop the entry. Purely transient state, safe at any time.
    pub fn clear(&self) {
        *self.entry.lock().unwrap() = None;
    }

    /// Epoch seconds of the last successful refresh.
    pub fn last_fetched_at(&self) -> Option<u64> {
        self.entry.lock().unwrap().as_ref().map(|e| e.fetched_at)
    }

    async fn refresh(&self) -> Result<Vec<Recipe>, FetchError> {
        let items = self
            .backend
            .fetch_recipes()
            .await
            .map_err(FetchError::from)?;

        // Write unseen remote items into the durable store before the
        // entry is replaced or any subscriber is notified, so nobody
        // observes a listing the store has not caught up with. A failed
        // fetch never reaches this point, which is what preserves the
        // previous entry on failure.
        for item in &items {
            let known = self
                .store
                .exists(&item.id)
                .map_err(|e| FetchError::new(e.to_string()))?;
            if !known {
                self.store
                    .save(item)
                    .map_err(|e| FetchError::new(e.to_string()))?;
            }
        }

        *self.entry.lock().unwrap() = Some(CacheEntry {
            items: items.clone(),
            fetched_at: now_epoch_secs(),
        });
        tracing::debug!(count = items.len(), "refreshed recipe listing");
        Ok(items)
    }

    fn cached(&self) -> Option<Vec<Recipe>> {
        self.entry.lock().unwrap().as_ref().map(|e| e.items.clone())
    }

    fn merge_with_store(&self, remote: Vec<Recipe>) -> Result<Vec<Recipe>, FetchError> {
        let local = self
            .store
            .all()
            .map_err(|e| FetchError::new(e.to_string()))?;
        Ok(merge_local_first(local, remote))
    }
}

/// Merge for display: local entries first, then remote entries whose id
/// was not already seen. A locally stored id always wins because it may
/// carry not-yet-synced local edits.
pub fn merge_local_first(local: Vec<Recipe>, remote: Vec<Recipe>) -> Vec<Recipe> {
    let mut seen: HashSet<RecipeId> = HashSet::new();
    let mut merged = Vec::with_capacity(local.len() + remote.len());
    for recipe in local.into_iter().chain(remote) {
        if seen.insert(recipe.id.clone()) {
            merged.push(recipe);
        }
    }
    merged
}

fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
