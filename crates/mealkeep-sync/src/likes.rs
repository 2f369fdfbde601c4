use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mealkeep::{
    FetchCoordinator, FetchError, LikeCount, LikeState, NetworkError, RecipeBackend, RecipeId,
};

/// Optimistic like state, reconciled against the remote store.
///
/// `toggle` applies locally first and rolls back on remote failure.
/// All state here is transient; a count refresh rebuilds it from the
/// remote at any time. Cross-device races resolve last-writer-wins at
/// the remote store because toggles push an absolute value.
pub struct LikeStateManager {
    backend: Arc<dyn RecipeBackend>,
    states: Mutex<HashMap<RecipeId, LikeState>>,
    /// One async mutex per id serializes concurrent toggles so the
    /// second flip sees the first one's settled state.
    toggle_locks: Mutex<HashMap<RecipeId, Arc<tokio::sync::Mutex<()>>>>,
    refresh: FetchCoordinator<String, Vec<LikeCount>>,
}

impl LikeStateManager {
    pub fn new(backend: Arc<dyn RecipeBackend>) -> Self {
        Self {
            backend,
            states: Mutex::new(HashMap::new()),
            toggle_locks: Mutex::new(HashMap::new()),
            refresh: FetchCoordinator::new(),
        }
    }

    pub fn is_liked(&self, id: &RecipeId) -> bool {
        self.states
            .lock()
            .unwrap()
            .get(id)
            .map(|s| s.liked)
            .unwrap_or(false)
    }

    pub fn count(&self, id: &RecipeId) -> i64 {
        self.states
            .lock()
            .unwrap()
            .get(id)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    /// Flip the liked flag optimistically and persist it remotely.
    /// On failure the exact pre-toggle state is restored and the error
    /// surfaces to the caller. Returns the new liked value on success.
    pub async fn toggle(&self, id: &RecipeId) -> Result<bool, NetworkError> {
        let lock = self.toggle_lock(id);
        let _serialized = lock.lock().await;

        let previous = {
            let mut states = self.states.lock().unwrap();
            let entry = states.entry(id.clone()).or_default();
            let previous = *entry;
            entry.liked = !previous.liked;
            entry.count = if entry.liked {
                previous.count + 1
            } else {
                // Clamp: an un-refreshed id starts at zero and must not
                // go negative when its remote like is withdrawn.
                (previous.count - 1).max(0)
            };
            previous
        };
        let target = !previous.liked;

        match self.backend.set_liked(id, target).await {
            Ok(()) => Ok(target),
            Err(error) => {
                self.states.lock().unwrap().insert(id.clone(), previous);
                tracing::warn!(recipe = %id, error = %error, "like toggle rolled back");
                Err(error)
            }
        }
    }

    /// Pull authoritative counts for a batch of ids. Identical
    /// concurrent batches share one remote call; the remote values win
    /// over whatever is held locally.
    pub async fn refresh_counts(&self, ids: &[RecipeId]) -> Result<(), FetchError> {
        if ids.is_empty() {
            return Ok(());
        }
        let key = batch_key(ids);

        if self.refresh.start_if_absent(key.clone()) {
            return match self.backend.like_counts(ids).await {
                Ok(counts) => {
                    self.apply(&counts);
                    self.refresh.complete(&key, counts);
                    Ok(())
                }
                Err(error) => {
                    let error = FetchError::from(error);
                    self.refresh.fail(&key, error.clone());
                    Err(error)
                }
            };
        }

        if let Some(receiver) = self.refresh.subscribe(&key) {
            return match receiver.await {
                // The owner already applied the counts.
                Ok(Ok(_)) => Ok(()),
                Ok(Err(error)) => Err(error),
                Err(_) => Err(FetchError::new("count refresh dropped before completion")),
            };
        }

        // The batch finished between the claim check and subscribing;
        // its values are applied already.
        Ok(())
    }

    /// Drop all transient state; the next refresh rebuilds it.
    pub fn clear(&self) {
        self.states.lock().unwrap().clear();
    }

    fn apply(&self, counts: &[LikeCount]) {
        let mut states = self.states.lock().unwrap();
        for count in counts {
            states.insert(
                count.recipe_id.clone(),
                LikeState {
                    liked: count.liked,
                    count: count.count,
                },
            );
        }
    }

    fn toggle_lock(&self, id: &RecipeId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.toggle_locks.lock().unwrap();
        locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

fn batch_key(ids: &[RecipeId]) -> String {
    let mut keys: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    keys.sort_unstable();
    keys.join(",")
}
