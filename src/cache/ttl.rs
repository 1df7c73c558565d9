use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tracing::debug;

use super::clock::{Clock, SystemClock};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Outcome of one load, shared by every caller that missed while it ran.
type Flight<V, E> = Arc<OnceCell<Result<V, E>>>;

/// In-memory map whose entries expire a fixed time after they are stored.
///
/// Expired entries are dropped lazily, on the next lookup of their key.
/// [`get_or_try_insert_with`](Self::get_or_try_insert_with) runs at most one
/// loader per key at a time; callers that miss while it runs receive its
/// result, `Err` included. `E` is the loader's error type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use fontdeck::cache::{ManualClock, TtlCache};
///
/// let clock = Arc::new(ManualClock::new());
/// let cache: TtlCache<&str, u32, ()> =
///     TtlCache::with_clock(Duration::from_secs(60), clock.clone());
///
/// cache.insert("popularity", 3);
/// assert_eq!(cache.get(&"popularity"), Some(3));
///
/// clock.advance(Duration::from_secs(61));
/// assert_eq!(cache.get(&"popularity"), None);
/// ```
pub struct TtlCache<K, V, E> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, Entry<V>>>,
    in_flight: Mutex<HashMap<K, Flight<V, E>>>,
}

impl<K, V, E> TtlCache<K, V, E>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
    E: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`, evicting it first if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries();

        match entries.get(key) {
            Some(entry) if now <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                debug!(?key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value`, replacing any previous entry for `key` wholesale.
    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries().insert(key, Entry { value, expires_at });
    }

    /// Number of stored entries, expired ones included until they are looked up.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Returns the live value for `key`, or runs `load` and stores its output.
    ///
    /// Only one load per key runs at a time. Callers that miss while it runs
    /// wait for it and get its outcome instead of loading themselves, so a
    /// failing load fails all of them once. Nothing is stored on failure, and
    /// the next miss after the load finished starts a fresh one.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            debug!(?key, "cache hit");
            return Ok(value);
        }

        let flight = {
            let mut in_flight = self.in_flight();
            // A load that finished since the check above has stored its value
            // before retiring its flight.
            if let Some(value) = self.get(&key) {
                debug!(?key, "cache filled by concurrent load");
                return Ok(value);
            }
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let load_key = key.clone();
        let outcome = flight
            .get_or_init(|| async move {
                debug!(key = ?load_key, "cache miss, loading");
                let outcome = load().await;
                if let Ok(value) = &outcome {
                    self.insert(load_key, value.clone());
                }
                outcome
            })
            .await
            .clone();

        let mut in_flight = self.in_flight();
        if in_flight
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &flight))
        {
            in_flight.remove(&key);
        }
        outcome
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<K, Flight<V, E>>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
