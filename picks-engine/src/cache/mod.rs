use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum Slot<V, E> {
    Ready { value: V, fetched_at: Instant },
    InFlight(SharedFetch<V, E>),
}

enum Lookup<V, E> {
    Hit(V),
    Join(SharedFetch<V, E>),
}

/// Keyed response cache with a time-to-live and single-flight fetches.
///
/// At most one fetch per key is in flight; concurrent callers await the same
/// shared future and all see its result. Only successes are stored. Expired
/// entries are purged whenever a new fetch starts, and a new key arriving at
/// `max_entries` evicts the oldest settled entry.
pub struct TtlCache<V, E> {
    entries: DashMap<String, Slot<V, E>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V, E> TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, usize::MAX)
    }

    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached value, or the result of `fetch` (shared with any concurrent callers).
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        // No map guard is held across an await
        let lookup = match self.existing(key) {
            Some(lookup) => lookup,
            None => {
                self.purge_expired();
                self.make_room(key);
                self.start_fetch(key, fetch)
            }
        };

        let pending = match lookup {
            Lookup::Hit(value) => return Ok(value),
            Lookup::Join(pending) => pending,
        };

        let result = pending.clone().await;

        // First waiter back settles the slot, if it still holds this fetch
        if let Entry::Occupied(mut occupied) = self.entries.entry(key.to_string()) {
            let same_fetch = matches!(occupied.get(), Slot::InFlight(p) if p.ptr_eq(&pending));
            if same_fetch {
                match &result {
                    Ok(value) => {
                        occupied.insert(Slot::Ready {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                        });
                    }
                    Err(_) => {
                        occupied.remove();
                    }
                }
            }
        }

        result
    }

    fn is_fresh(&self, fetched_at: &Instant) -> bool {
        fetched_at.elapsed() < self.ttl
    }

    fn existing(&self, key: &str) -> Option<Lookup<V, E>> {
        match self.entries.get(key)?.value() {
            Slot::Ready { value, fetched_at } if self.is_fresh(fetched_at) => {
                Some(Lookup::Hit(value.clone()))
            }
            Slot::InFlight(pending) => Some(Lookup::Join(pending.clone())),
            Slot::Ready { .. } => None,
        }
    }

    // Another caller may have started the same fetch since `existing` looked
    fn start_fetch<F, Fut>(&self, key: &str, fetch: F) -> Lookup<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let raced = match occupied.get() {
                    Slot::Ready { value, fetched_at } if self.is_fresh(fetched_at) => {
                        Some(Lookup::Hit(value.clone()))
                    }
                    Slot::InFlight(pending) => Some(Lookup::Join(pending.clone())),
                    Slot::Ready { .. } => None,
                };
                match raced {
                    Some(lookup) => lookup,
                    None => {
                        debug!("Cache entry '{}' expired, refetching", key);
                        let pending = fetch().boxed().shared();
                        occupied.insert(Slot::InFlight(pending.clone()));
                        Lookup::Join(pending)
                    }
                }
            }
            Entry::Vacant(vacant) => {
                debug!("Cache miss for '{}'", key);
                let pending = fetch().boxed().shared();
                vacant.insert(Slot::InFlight(pending.clone()));
                Lookup::Join(pending)
            }
        }
    }

    /// Drops settled entries older than the TTL.
    pub fn purge_expired(&self) {
        let before = self.entries.len();
        self.entries.retain(|_, slot| match slot {
            Slot::Ready { fetched_at, .. } => fetched_at.elapsed() < self.ttl,
            Slot::InFlight(_) => true,
        });
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!("Purged {} expired cache entries", purged);
        }
    }

    // In-flight fetches are never evicted, so the cap can be exceeded while
    // every slot is still loading
    fn make_room(&self, key: &str) {
        if self.entries.len() < self.max_entries || self.entries.contains_key(key) {
            return;
        }
        let oldest = self
            .entries
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Ready { fetched_at, .. } => Some((entry.key().clone(), *fetched_at)),
                Slot::InFlight(_) => None,
            })
            .min_by_key(|(_, fetched_at)| *fetched_at)
            .map(|(key, _)| key);

        if let Some(oldest) = oldest {
            debug!("Cache full ({} entries), evicting '{}'", self.max_entries, oldest);
            self.entries.remove(&oldest);
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Entries currently held, fresh, stale or in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
