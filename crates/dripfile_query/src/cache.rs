use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::key::QueryKey;
use crate::state::QueryState;

pub type Fetcher<V, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, E>> + Send + Sync>;

struct Entry<V, E> {
    state: watch::Sender<QueryState<V, E>>,
    generation: u64,
    fetcher: Option<Fetcher<V, E>>,
}

impl<V: Clone, E> Entry<V, E> {
    fn new() -> Self {
        let (state, _) = watch::channel(QueryState::Idle);
        Self {
            state,
            generation: 0,
            fetcher: None,
        }
    }

    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state.send_modify(|state| {
            *state = match state.data() {
                Some(data) => QueryState::Refreshing(data.clone()),
                None => QueryState::Pending,
            };
        });
        self.generation
    }
}

type Entries<V, E> = Mutex<HashMap<QueryKey, Entry<V, E>>>;

/// Fetches still in flight when the cache is cleared complete into nothing.
pub struct QueryCache<V, E> {
    entries: Arc<Entries<V, E>>,
}

impl<V, E> Clone for QueryCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V, E> Default for QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> QueryCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn watch<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryHandle<V, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let fetcher: Fetcher<V, E> = Arc::new(move || fetcher().boxed());

        let mut entries = lock(&self.entries);
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.fetcher = Some(fetcher.clone());

        let needs_fetch = entry.state.borrow().needs_fetch();
        let issued = needs_fetch.then(|| entry.begin());
        let receiver = entry.state.subscribe();
        drop(entries);

        match issued {
            Some(generation) => self.spawn_fetch(key.clone(), generation, fetcher),
            None => debug!(key = %key, "query served from cache or in-flight request"),
        }

        QueryHandle { key, receiver }
    }

    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut refetch = Vec::new();
        {
            let mut entries = lock(&self.entries);
            for (key, entry) in entries.iter_mut() {
                if !key.starts_with(prefix) {
                    continue;
                }
                let Some(fetcher) = entry.fetcher.clone() else {
                    continue;
                };
                refetch.push((key.clone(), entry.begin(), fetcher));
            }
        }

        info!(prefix = %prefix, keys = refetch.len(), "invalidating queries");
        let count = refetch.len();
        for (key, generation, fetcher) in refetch {
            self.spawn_fetch(key, generation, fetcher);
        }
        count
    }

    pub fn state(&self, key: &QueryKey) -> QueryState<V, E> {
        lock(&self.entries)
            .get(key)
            .map(|entry| entry.state.borrow().clone())
            .unwrap_or(QueryState::Idle)
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    fn spawn_fetch(&self, key: QueryKey, generation: u64, fetcher: Fetcher<V, E>) {
        debug!(key = %key, generation, "issuing query");
        let entries: Weak<Entries<V, E>> = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let result = fetcher().await;

            let Some(entries) = entries.upgrade() else {
                return;
            };
            let mut entries = lock(&entries);
            let Some(entry) = entries.get_mut(&key) else {
                return;
            };
            // only the response of the latest request may land
            if entry.generation != generation {
                debug!(
                    key = %key,
                    generation,
                    current = entry.generation,
                    "discarding superseded response"
                );
                return;
            }

            entry.state.send_replace(match result {
                Ok(data) => QueryState::Success(data),
                Err(error) => QueryState::Error(error),
            });
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // entry updates never leave the map half-written, so a poisoned lock is still usable
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct QueryHandle<V, E> {
    key: QueryKey,
    receiver: watch::Receiver<QueryState<V, E>>,
}

impl<V, E> QueryHandle<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState<V, E> {
        self.receiver.borrow().clone()
    }

    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    pub async fn settled(&mut self) -> QueryState<V, E> {
        if let Ok(state) = self.receiver.wait_for(|state| !state.is_fetching()).await {
            return state.clone();
        }
        self.state()
    }

    pub fn updates(&self) -> WatchStream<QueryState<V, E>> {
        WatchStream::new(self.receiver.clone())
    }
}
