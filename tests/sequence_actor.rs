use std::collections::BTreeSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uuid_ninja::error::ServiceError;
use uuid_ninja::ident::{pack_v7, v7};
use uuid_ninja::sequence::store::{CounterStore, FileCounterStore, MemoryCounterStore};
use uuid_ninja::sequence::{SequenceActor, SequenceRegistry, SEQUENCE_FLOOR};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_dense_and_unique() {
    const N: u64 = 200;
    let store = MemoryCounterStore::with_record("global", 8000);
    let actor = Arc::new(SequenceActor::new("global", Arc::new(store.clone())));

    let mut tasks = Vec::new();
    for _ in 0..N {
        let actor = Arc::clone(&actor);
        tasks.push(tokio::spawn(async move { actor.increment().await }));
    }

    let mut seen = BTreeSet::new();
    for task in tasks {
        let value = task.await.expect("join").expect("increment");
        assert!(seen.insert(value), "duplicate value {value}");
    }
    let expected: BTreeSet<u64> = (8001..=8000 + N).collect();
    assert_eq!(seen, expected);
    assert_eq!(store.get("global"), Some(8000 + N));
    assert_eq!(actor.load().await.unwrap(), 8000 + N);
}

#[tokio::test]
async fn test_restart_never_regresses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let last = {
        let actor = SequenceActor::new("global", Arc::new(FileCounterStore::new(dir.path())));
        let mut last = 0;
        for _ in 0..5 {
            last = actor.increment().await.expect("increment");
        }
        last
    };
    assert_eq!(last, SEQUENCE_FLOOR + 5);

    let restarted = SequenceActor::new("global", Arc::new(FileCounterStore::new(dir.path())));
    assert_eq!(restarted.load().await.unwrap(), last);
    let next = restarted.increment().await.expect("increment");
    assert!(next > last);
    assert_eq!(next, last + 1);
}

#[tokio::test]
async fn test_actors_sharing_a_directory_never_duplicate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = SequenceActor::new("global", Arc::new(FileCounterStore::new(dir.path())));
    let b = SequenceActor::new("global", Arc::new(FileCounterStore::new(dir.path())));

    let a1 = a.increment().await.expect("increment");
    let b1 = b.increment().await.expect("increment");
    let a2 = a.increment().await.expect("increment");
    assert_eq!((a1, b1, a2), (5001, 5002, 5003));

    let record = std::fs::read_to_string(dir.path().join("global.seq")).expect("read record");
    assert_eq!(record.trim(), "5003");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_actors_sharing_a_directory_are_unique() {
    const PER_ACTOR: usize = 40;
    let dir = tempfile::tempdir().expect("tempdir");
    let actors: Vec<Arc<SequenceActor>> = (0..3)
        .map(|_| Arc::new(SequenceActor::new("global", Arc::new(FileCounterStore::new(dir.path())))))
        .collect();

    let mut tasks = Vec::new();
    for actor in &actors {
        for _ in 0..PER_ACTOR {
            let actor = Arc::clone(actor);
            tasks.push(tokio::spawn(async move { actor.increment().await }));
        }
    }
    let mut seen = BTreeSet::new();
    for task in tasks {
        let value = task.await.expect("join").expect("increment");
        assert!(seen.insert(value), "duplicate value {value}");
    }

    let total = (PER_ACTOR * actors.len()) as u64;
    assert_eq!(seen, (SEQUENCE_FLOOR + 1..=SEQUENCE_FLOOR + total).collect::<BTreeSet<u64>>());
    let record = std::fs::read_to_string(dir.path().join("global.seq")).expect("read record");
    assert_eq!(record.trim(), (SEQUENCE_FLOOR + total).to_string());
}

#[tokio::test]
async fn test_first_ever_increment_is_above_floor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let actor = SequenceActor::new("fresh", Arc::new(FileCounterStore::new(dir.path())));
    assert_eq!(actor.increment().await.unwrap(), SEQUENCE_FLOOR + 1);
}

#[tokio::test]
async fn test_corrupt_record_is_a_fault_not_the_floor() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("global.seq"), "NaN\n").expect("write record");
    let actor = SequenceActor::new("global", Arc::new(FileCounterStore::new(dir.path())));

    let err = actor.increment().await.unwrap_err();
    assert!(matches!(err, ServiceError::SequenceInitFault(_)), "{err:?}");
    let err = actor.load().await.unwrap_err();
    assert!(matches!(err, ServiceError::SequenceInitFault(_)), "{err:?}");

    let contents = std::fs::read_to_string(dir.path().join("global.seq")).expect("read record");
    assert_eq!(contents, "NaN\n");
}

/// Store whose load is slow and counted, and whose load or persist can be failed.
#[derive(Default)]
struct InstrumentedStore {
    inner: MemoryCounterStore,
    loads: AtomicUsize,
    fail_load: AtomicBool,
    fail_persist: AtomicBool,
}

impl CounterStore for InstrumentedStore {
    fn load(&self, name: &str) -> io::Result<Option<u64>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(io::Error::other("store offline"));
        }
        self.inner.load(name)
    }

    fn persist(&self, name: &str, value: u64) -> io::Result<()> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk full"));
        }
        self.inner.persist(name, value)
    }

    fn advance(&self, name: &str, at_least: u64) -> io::Result<Option<u64>> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk full"));
        }
        self.inner.advance(name, at_least)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_operations_wait_for_single_initial_load() {
    let store = Arc::new(InstrumentedStore {
        inner: MemoryCounterStore::with_record("global", 9000),
        ..InstrumentedStore::default()
    });
    let actor = Arc::new(SequenceActor::new("global", Arc::clone(&store) as Arc<dyn CounterStore>));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let actor = Arc::clone(&actor);
        tasks.push(tokio::spawn(async move { actor.increment().await }));
    }
    let mut values = BTreeSet::new();
    for task in tasks {
        values.insert(task.await.expect("join").expect("increment"));
    }

    assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    assert_eq!(values, (9001..=9008).collect::<BTreeSet<u64>>());
}

#[tokio::test]
async fn test_failed_persist_does_not_advance() {
    let store = Arc::new(InstrumentedStore::default());
    let actor = SequenceActor::new("global", Arc::clone(&store) as Arc<dyn CounterStore>);
    assert_eq!(actor.increment().await.unwrap(), SEQUENCE_FLOOR + 1);

    store.fail_persist.store(true, Ordering::SeqCst);
    let err = actor.increment().await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(_)));
    assert_eq!(actor.load().await.unwrap(), SEQUENCE_FLOOR + 1);

    store.fail_persist.store(false, Ordering::SeqCst);
    assert_eq!(actor.increment().await.unwrap(), SEQUENCE_FLOOR + 2);
}

#[tokio::test]
async fn test_failed_initial_load_is_retried() {
    let store = Arc::new(InstrumentedStore {
        inner: MemoryCounterStore::with_record("global", 6000),
        ..InstrumentedStore::default()
    });
    store.fail_load.store(true, Ordering::SeqCst);
    let actor = SequenceActor::new("global", Arc::clone(&store) as Arc<dyn CounterStore>);

    let err = actor.increment().await.unwrap_err();
    assert!(matches!(err, ServiceError::SequenceInitFault(_)), "{err:?}");
    let err = actor.load().await.unwrap_err();
    assert!(matches!(err, ServiceError::SequenceInitFault(_)), "{err:?}");
    assert_eq!(store.loads.load(Ordering::SeqCst), 2);

    store.fail_load.store(false, Ordering::SeqCst);
    assert_eq!(actor.load().await.unwrap(), 6000);
    assert_eq!(actor.increment().await.unwrap(), 6001);
    assert_eq!(store.loads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_registry_serializes_same_name() {
    let registry = SequenceRegistry::new(Arc::new(MemoryCounterStore::new()));
    let a = registry.get("global");
    let b = registry.get("global");
    assert_eq!(a.increment().await.unwrap(), SEQUENCE_FLOOR + 1);
    assert_eq!(b.increment().await.unwrap(), SEQUENCE_FLOOR + 2);
    assert_eq!(registry.get("other").load().await.unwrap(), SEQUENCE_FLOOR);
}

#[tokio::test]
async fn test_v7_order_follows_override_sequence() {
    let actor = SequenceActor::new("global", Arc::new(MemoryCounterStore::new()));
    let mut ids = Vec::new();
    for seq in 100..140 {
        ids.push(v7(Some(seq), &actor).await.expect("v7"));
    }
    for pair in ids.windows(2) {
        // Same millisecond: sequence decides. Later millisecond: timestamp does.
        assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
    }
}

#[test]
fn test_v7_pack_orders_by_timestamp_then_sequence() {
    let mut ids = Vec::new();
    for (offset, ts) in [1_000_u64, 1_001, 1_002].into_iter().enumerate() {
        for seq in 0..3_u64 {
            // later timestamps get smaller sequences and random tails
            let seq = seq + 100 - 10 * offset as u64;
            ids.push((ts, seq, pack_v7(ts, seq, u16::MAX >> offset)));
        }
    }
    let mut sorted = ids.clone();
    sorted.sort_by_key(|(_, _, id)| *id);
    assert_eq!(sorted, ids);
}
