//! Durable storage for sequence counters: one record per logical name.
//!
//! Several processes may point at the same file store. Every write happens
//! under an exclusive advisory lock on the record, and [`CounterStore::advance`]
//! re-reads the record under that lock, so two writers can never issue the
//! same value or move a record backwards.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fd_lock::RwLock;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Blocking key/value storage of counter records.
///
/// Implementations are only ever driven by a [`SequenceActor`], which runs
/// them on the blocking thread pool.
///
/// [`SequenceActor`]: super::SequenceActor
pub trait CounterStore: Send + Sync {
    /// Read the record for `name`; `Ok(None)` when it was never written.
    ///
    /// # Errors
    ///
    /// I/O failures, or `InvalidData` when the stored record is corrupt.
    fn load(&self, name: &str) -> io::Result<Option<u64>>;

    /// Durably replace the record for `name` with `value`.
    ///
    /// # Errors
    ///
    /// Any I/O failure; the previous record must survive a failed write.
    fn persist(&self, name: &str, value: u64) -> io::Result<()>;

    /// Replace the record with `max(stored, at_least) + 1` and return the new
    /// value, or `Ok(None)` when that would overflow `u64`.
    ///
    /// The default reads then persists and is only correct for a store with a
    /// single writer; shared stores override it with a locked read-modify-write.
    ///
    /// # Errors
    ///
    /// Any [`load`](Self::load) or [`persist`](Self::persist) failure; the
    /// record is unchanged on error.
    fn advance(&self, name: &str, at_least: u64) -> io::Result<Option<u64>> {
        let stored = self.load(name)?.unwrap_or(0);
        let Some(next) = stored.max(at_least).checked_add(1) else {
            return Ok(None);
        };
        self.persist(name, next)?;
        Ok(Some(next))
    }
}

/// One decimal text file per name under `dir`, replaced atomically.
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    dir: PathBuf,
}

impl FileCounterStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.seq"))
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.seq.lock"))
    }

    /// Run `f` holding the exclusive lock for `name`. Blocks until any other
    /// holder, in this process or another, releases it.
    fn with_record_lock<T>(&self, name: &str, f: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
        fs::create_dir_all(&self.dir)?;
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path(name))?;
        let mut lock = RwLock::new(file);
        let _guard = lock.write()?;
        f()
    }

    fn write_record(&self, name: &str, value: u64) -> io::Result<()> {
        let path = self.record_path(name);
        let tmp = self.dir.join(format!("{name}.seq.tmp"));
        {
            let mut file = fs::File::create(&tmp)?;
            writeln!(file, "{value}")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        sync_dir(&self.dir)
    }
}

impl CounterStore for FileCounterStore {
    fn load(&self, name: &str) -> io::Result<Option<u64>> {
        let path = self.record_path(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        contents.trim().parse::<u64>().map(Some).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("corrupt sequence record {}: {err}", path.display()),
            )
        })
    }

    fn persist(&self, name: &str, value: u64) -> io::Result<()> {
        self.with_record_lock(name, || self.write_record(name, value))
    }

    fn advance(&self, name: &str, at_least: u64) -> io::Result<Option<u64>> {
        self.with_record_lock(name, || {
            let stored = self.load(name)?.unwrap_or(0);
            let Some(next) = stored.max(at_least).checked_add(1) else {
                return Ok(None);
            };
            self.write_record(name, next)?;
            Ok(Some(next))
        })
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Process-local store. Clones share the same records, so a fresh actor
/// built over a clone behaves like a restarted process.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    records: Arc<Mutex<FxHashMap<String, u64>>>,
}

impl MemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(name: &str, value: u64) -> Self {
        let store = Self::new();
        store.records.lock().insert(name.to_string(), value);
        store
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.records.lock().get(name).copied()
    }
}

impl CounterStore for MemoryCounterStore {
    fn load(&self, name: &str) -> io::Result<Option<u64>> {
        Ok(self.get(name))
    }

    fn persist(&self, name: &str, value: u64) -> io::Result<()> {
        self.records.lock().insert(name.to_string(), value);
        Ok(())
    }

    fn advance(&self, name: &str, at_least: u64) -> io::Result<Option<u64>> {
        let mut records = self.records.lock();
        let stored = records.get(name).copied().unwrap_or(0);
        let Some(next) = stored.max(at_least).checked_add(1) else {
            return Ok(None);
        };
        records.insert(name.to_string(), next);
        Ok(Some(next))
    }
}
