use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{task::JoinHandle, time::sleep};

/// Coalesces bursts of requests per key: a request only runs once no newer one
/// for the same key arrived within `delay`. Newer requests abort older ones,
/// including ones already past the delay.
#[derive(Clone, Debug)]
pub struct Debouncer<K> {
    delay: Duration,
    pending: Arc<Mutex<HashMap<K, JoinHandle<()>>>>,
}

impl<K: Eq + Hash> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn schedule<F>(&self, key: K, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            task.await;
        });

        let previous = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.retain(|_, h| !h.is_finished());
            pending.insert(key, handle)
        };

        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drops whatever is pending for `key` without running it.
    pub fn cancel(&self, key: &K) {
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        if let Some(previous) = previous {
            previous.abort();
        }
    }
}
