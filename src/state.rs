use std::sync::Arc;

use crate::config::{AppConfig, StoreKind};
use crate::negotiate::Encoding;
use crate::routing::normalize_base_path;
use crate::sequence::store::{CounterStore, FileCounterStore, MemoryCounterStore};
use crate::sequence::{SequenceActor, SequenceRegistry};

/// Shared application state accessible to all handlers.
///
/// Built once at startup; the sequence actor is the only component holding
/// state across requests.
pub struct AppState {
    pub config: AppConfig,
    base_path: String,
    sequences: SequenceRegistry,
    sequence: Arc<SequenceActor>,
}

impl AppState {
    /// Build state with the counter store selected by `config.sequence`.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let store: Arc<dyn CounterStore> = match config.sequence.store {
            StoreKind::File => Arc::new(FileCounterStore::new(config.sequence.store_dir.clone())),
            StoreKind::Memory => Arc::new(MemoryCounterStore::new()),
        };
        Self::with_store(config, store)
    }

    /// Build state over an explicit counter store.
    #[must_use]
    pub fn with_store(config: AppConfig, store: Arc<dyn CounterStore>) -> Self {
        let sequences = SequenceRegistry::new(store);
        let sequence = sequences.get(&config.sequence.name);
        Self {
            base_path: normalize_base_path(&config.server.base_path),
            config,
            sequences,
            sequence,
        }
    }

    /// The configured sequence actor.
    #[must_use]
    pub fn sequence(&self) -> &SequenceActor {
        &self.sequence
    }

    /// Actor for another logical name over the same store.
    #[must_use]
    pub fn sequence_named(&self, name: &str) -> Arc<SequenceActor> {
        self.sequences.get(name)
    }

    /// Normalized mount point: empty or `/prefix` without a trailing slash.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn default_encoding(&self) -> Encoding {
        self.config.features.default_encoding
    }
}
