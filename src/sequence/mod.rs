//! Single-writer monotonic counter shared by every v7 request.
//!
//! A [`SequenceActor`] owns one durable record. The first operation against
//! it loads that record; until the load finishes every other caller waits on
//! the same gate. Increments are serialized and persisted before they are
//! published, so a value handed out is never handed out again, including
//! after a restart or by another process over the same store.

pub mod store;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::OnceCell;

use crate::error::ServiceError;
use store::CounterStore;

/// Value a counter starts from when its record has never been written.
pub const SEQUENCE_FLOOR: u64 = 5000;

pub struct SequenceActor {
    name: Arc<str>,
    store: Arc<dyn CounterStore>,
    loaded: OnceCell<()>,
    current: AtomicU64,
    writer: tokio::sync::Mutex<()>,
}

impl SequenceActor {
    #[must_use]
    pub fn new(name: &str, store: Arc<dyn CounterStore>) -> Self {
        Self {
            name: Arc::from(name),
            store,
            loaded: OnceCell::new(),
            current: AtomicU64::new(0),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current counter value, without mutation.
    ///
    /// Does not wait for in-flight increments, so it may trail a concurrent
    /// `increment` by one step. Increments made by other processes over a
    /// shared store show up here after this actor's next `increment`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SequenceInitFault`] when the record cannot be
    /// loaded.
    pub async fn load(&self) -> Result<u64, ServiceError> {
        self.ensure_loaded().await?;
        Ok(self.current.load(Ordering::Acquire))
    }

    /// Advance to `max(stored, current, floor) + 1`, persist it, then return
    /// it.
    ///
    /// The store re-reads its record under its own lock, so actors in other
    /// processes sharing the record draw from the same stream.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SequenceInitFault`] when the record cannot be
    /// loaded, is corrupt, or the counter is exhausted, and
    /// [`ServiceError::Store`] when the new value could not be persisted. A
    /// failed persist leaves the counter unchanged.
    pub async fn increment(&self) -> Result<u64, ServiceError> {
        self.ensure_loaded().await?;
        let _writer = self.writer.lock().await;

        let at_least = self.current.load(Ordering::Acquire).max(SEQUENCE_FLOOR);
        let store = Arc::clone(&self.store);
        let name = Arc::clone(&self.name);
        let advanced = tokio::task::spawn_blocking(move || store.advance(&name, at_least)).await;
        let next = match advanced {
            Ok(Ok(Some(next))) => next,
            Ok(Ok(None)) => {
                return Err(ServiceError::SequenceInitFault(format!(
                    "sequence '{}' is exhausted",
                    self.name
                )))
            }
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::InvalidData => {
                return Err(self.init_fault(&err.to_string()));
            }
            Ok(Err(err)) => {
                tracing::error!(sequence = %self.name, "failed to persist sequence: {err}");
                return Err(ServiceError::Store(err.to_string()));
            }
            Err(err) => {
                tracing::error!(sequence = %self.name, "sequence persist task failed: {err}");
                return Err(ServiceError::Store(err.to_string()));
            }
        };

        self.current.store(next, Ordering::Release);
        Ok(next)
    }

    async fn ensure_loaded(&self) -> Result<(), ServiceError> {
        self.loaded
            .get_or_try_init(|| async {
                let store = Arc::clone(&self.store);
                let name = Arc::clone(&self.name);
                let stored = tokio::task::spawn_blocking(move || store.load(&name))
                    .await
                    .map_err(|err| self.init_fault(&err.to_string()))?
                    .map_err(|err| self.init_fault(&err.to_string()))?;

                let start = stored.unwrap_or(SEQUENCE_FLOOR).max(SEQUENCE_FLOOR);
                self.current.store(start, Ordering::Release);
                tracing::info!(
                    sequence = %self.name,
                    stored = ?stored,
                    start,
                    "sequence loaded"
                );
                Ok::<(), ServiceError>(())
            })
            .await
            .map(|_| ())
    }

    fn init_fault(&self, reason: &str) -> ServiceError {
        tracing::error!(sequence = %self.name, "failed to load sequence: {reason}");
        ServiceError::SequenceInitFault(format!("sequence '{}': {reason}", self.name))
    }
}

/// Hands out one shared actor per logical name.
pub struct SequenceRegistry {
    store: Arc<dyn CounterStore>,
    actors: Mutex<FxHashMap<String, Arc<SequenceActor>>>,
}

impl SequenceRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            actors: Mutex::new(FxHashMap::default()),
        }
    }

    /// The actor for `name`, created on first use.
    #[must_use]
    pub fn get(&self, name: &str) -> Arc<SequenceActor> {
        let mut actors = self.actors.lock();
        if let Some(actor) = actors.get(name) {
            return Arc::clone(actor);
        }
        let actor = Arc::new(SequenceActor::new(name, Arc::clone(&self.store)));
        actors.insert(name.to_string(), Arc::clone(&actor));
        actor
    }
}
