use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::FetchError;

/// Per-key de-duplication of concurrent fetch work.
///
/// The first caller to `start_if_absent` a key becomes the owner and
/// must eventually call `complete` or `fail` for it. Everyone else
/// subscribes and receives the owner's result. At most one operation
/// is in flight per key; the in-flight record is removed in the same
/// critical section that collects the subscribers, so a key can be
/// restarted the instant its previous run finished and no subscriber
/// is ever left hanging.
pub struct FetchCoordinator<K, T> {
    in_flight: Mutex<HashMap<K, Vec<oneshot::Sender<Result<T, FetchError>>>>>,
}

impl<K, T> FetchCoordinator<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Claim the key. Returns true when the caller became the owner and
    /// must perform the fetch; false when another owner already holds it.
    pub fn start_if_absent(&self, key: K) -> bool {
        let mut in_flight = self.in_flight.lock().unwrap();
        if in_flight.contains_key(&key) {
            return false;
        }
        in_flight.insert(key, Vec::new());
        true
    }

    /// Register interest in the key's eventual result.
    ///
    /// Returns `None` when nothing is in flight for the key, either
    /// because it was never started or because it completed between the
    /// caller's `start_if_absent` and this call. Callers handle `None`
    /// by re-checking their cache or claiming the key themselves.
    pub fn subscribe(&self, key: &K) -> Option<oneshot::Receiver<Result<T, FetchError>>> {
        let mut in_flight = self.in_flight.lock().unwrap();
        in_flight.get_mut(key).map(|subscribers| {
            let (tx, rx) = oneshot::channel();
            subscribers.push(tx);
            rx
        })
    }

    /// Owner-only: publish a successful result to every subscriber and
    /// release the key.
    pub fn complete(&self, key: &K, value: T) {
        self.finish(key, Ok(value));
    }

    /// Owner-only: publish a failure to every subscriber and release
    /// the key. Each subscriber receives an identical error.
    pub fn fail(&self, key: &K, error: FetchError) {
        self.finish(key, Err(error));
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.lock().unwrap().contains_key(key)
    }

    fn finish(&self, key: &K, result: Result<T, FetchError>) {
        let subscribers = {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight.remove(key).unwrap_or_default()
        };
        for subscriber in subscribers {
            // A subscriber that dropped its receiver opted out; that is
            // its business, not a delivery failure.
            let _ = subscriber.send(result.clone());
        }
    }
}

impl<K, T> Default for FetchCoordinator<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a one-shot import tracked per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    NotStarted,
    Running,
    Completed,
}

/// Per-key guard against duplicate one-shot imports.
///
/// Unlike [`FetchCoordinator`] there is no result to fan out; callers
/// that lose the `start` race simply skip the work. `fail` returns the
/// key to `NotStarted` so a later attempt stays eligible, while
/// `complete` is sticky for the life of the process.
pub struct MigrationCoordinator<K> {
    states: Mutex<HashMap<K, MigrationState>>,
}

impl<K> MigrationCoordinator<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Claim the key for import. False when the import is already
    /// running or already completed.
    pub fn start(&self, key: K) -> bool {
        let mut states = self.states.lock().unwrap();
        match states.get(&key) {
            Some(MigrationState::Running) | Some(MigrationState::Completed) => false,
            _ => {
                states.insert(key, MigrationState::Running);
                true
            }
        }
    }

    pub fn complete(&self, key: &K) {
        self.states
            .lock()
            .unwrap()
            .insert(key.clone(), MigrationState::Completed);
    }

    /// Not completed: the key becomes claimable again.
    pub fn fail(&self, key: &K) {
        self.states.lock().unwrap().remove(key);
    }

    pub fn state(&self, key: &K) -> MigrationState {
        self.states
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(MigrationState::NotStarted)
    }
}

impl<K> Default for MigrationCoordinator<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
