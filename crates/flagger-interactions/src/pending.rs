//! Pending entries that expire unless retired first.
//!
//! Both outstanding confirmation prompts and free-text captures are "wait for
//! the user, or give up after a timeout". `PendingRegistry` owns that race:
//! retiring an entry and expiring it both remove it under one lock, so exactly
//! one side receives the value. Each registration gets a fresh generation, and
//! a timer only removes the entry it was armed for, never a newer replacement.

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use flagger_core::{ChannelId, UserId};

use crate::{Scheduler, TimerHandle};

/// How long a free-text response is awaited by default.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

struct PendingEntry<V> {
    generation: u64,
    value: V,
    timer: Option<TimerHandle>,
}

struct RegistryInner<K, V> {
    entries: Mutex<HashMap<K, PendingEntry<V>>>,
    generations: AtomicU64,
}

/// Keyed map of values awaiting either retirement or expiry.
pub struct PendingRegistry<K, V> {
    inner: Arc<RegistryInner<K, V>>,
}

impl<K, V> Clone for PendingRegistry<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for PendingRegistry<K, V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }
}

impl<K, V> PendingRegistry<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, PendingEntry<V>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `value` under `key` and arms its expiry timer.
    ///
    /// A previous entry for `key` is replaced and its timer cancelled; its value
    /// is returned. If the timer fires before the entry is retired, `on_expire`
    /// receives the key and value.
    pub fn register<F, Fut>(
        &self,
        key: K,
        value: V,
        timeout: Duration,
        scheduler: &dyn Scheduler,
        on_expire: F,
    ) -> Option<V>
    where
        F: FnOnce(K, V) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let replaced = self.lock().insert(
            key.clone(),
            PendingEntry {
                generation,
                value,
                timer: None,
            },
        );
        let replaced = replaced.map(|entry| {
            if let Some(timer) = entry.timer {
                timer.cancel();
            }
            entry.value
        });

        let registry = self.clone();
        let expiry_key = key.clone();
        let timer = scheduler.schedule(
            timeout,
            Box::pin(async move {
                if let Some(value) = registry.expire(&expiry_key, generation) {
                    tracing::debug!(key = ?expiry_key, "pending entry expired");
                    on_expire(expiry_key, value).await;
                }
            }),
        );

        // The entry may already be gone if the timer fired or someone retired
        // it in between; the dropped handle then never fires anything.
        if let Some(entry) = self.lock().get_mut(&key) {
            if entry.generation == generation {
                entry.timer = Some(timer);
            }
        }
        replaced
    }

    /// Removes the entry for `key`, cancelling its timer.
    ///
    /// Returns `None` when there is no entry, including when it already expired.
    pub fn retire(&self, key: &K) -> Option<V> {
        let entry = self.lock().remove(key)?;
        if let Some(timer) = entry.timer {
            timer.cancel();
        }
        Some(entry.value)
    }

    fn expire(&self, key: &K, generation: u64) -> Option<V> {
        let mut entries = self.lock();
        let current = entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation);
        if current {
            entries.remove(key).map(|entry| entry.value)
        } else {
            None
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Identifies a free-text response: the user being waited on and the channel
/// they were asked in.
pub type ResponseKey = (UserId, ChannelId);

/// Waits for the next message a user sends in a channel.
pub struct ResponseRegistry<T> {
    pending: PendingRegistry<ResponseKey, T>,
    scheduler: Arc<dyn Scheduler>,
    timeout: Duration,
}

impl<T: Send + 'static> ResponseRegistry<T> {
    pub fn new(scheduler: Arc<dyn Scheduler>, timeout: Duration) -> Self {
        Self {
            pending: PendingRegistry::new(),
            scheduler,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stores `continuation` until the user's next message in `channel`.
    ///
    /// A newer wait for the same user and channel replaces the older one.
    pub fn await_response(&self, user: UserId, channel: ChannelId, continuation: T) {
        let replaced = self.pending.register(
            (user, channel),
            continuation,
            self.timeout,
            self.scheduler.as_ref(),
            |(user, channel), _continuation| async move {
                tracing::debug!(%user, %channel, "response wait timed out");
            },
        );
        if replaced.is_some() {
            tracing::debug!("replaced an outstanding response wait");
        }
    }

    /// Claims the continuation waiting on `user` in `channel`, if any.
    pub fn resolve(&self, user: &UserId, channel: &ChannelId) -> Option<T> {
        self.pending.retire(&(user.clone(), channel.clone()))
    }

    pub fn is_waiting(&self, user: &UserId, channel: &ChannelId) -> bool {
        self.pending.contains(&(user.clone(), channel.clone()))
    }
}
