//! In-process store backend.
//!
//! Hashes live behind a shared mutex. Each key carries a version counter bumped
//! by every write, which is what a watch compares at `exec` time, so the
//! check-and-set behaviour matches a real Redis server.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::{ConnectionPool, ExecOutcome, StoreConnection};

#[derive(Debug, Default)]
struct Inner {
    hashes: FxHashMap<String, BTreeMap<String, String>>,
    versions: FxHashMap<String, u64>,
    offline: bool,
    active_connections: usize,
}

impl Inner {
    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &str) {
        *self.versions.entry(key.to_string()).or_insert(0) += 1;
    }

    fn set(&mut self, key: &str, pairs: &[(String, String)]) {
        let hash = self.hashes.entry(key.to_string()).or_default();
        for (field, value) in pairs {
            hash.insert(field.clone(), value.clone());
        }
        self.touch(key);
    }

    fn delete(&mut self, key: &str, fields: &[String]) -> usize {
        let Some(hash) = self.hashes.get_mut(key) else {
            return 0;
        };
        let removed = fields.iter().filter(|f| hash.remove(*f).is_some()).count();
        if hash.is_empty() {
            self.hashes.remove(key);
        }
        if removed > 0 {
            self.touch(key);
        }
        removed
    }
}

/// Shared in-process store. Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection.
    #[must_use]
    pub fn connect(&self) -> MemoryConnection {
        self.inner.lock().active_connections += 1;
        MemoryConnection {
            store: Arc::clone(&self.inner),
            watched: Vec::new(),
            queued: None,
        }
    }

    /// Returns the raw stored value of `field` in hash `key`.
    #[must_use]
    pub fn raw_field(&self, key: &str, field: &str) -> Option<String> {
        self.inner
            .lock()
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).cloned())
    }

    /// Writes a raw value, bypassing the codec. Counts as a modification of
    /// `key` for watchers.
    pub fn put_raw(&self, key: &str, field: &str, value: &str) {
        self.inner
            .lock()
            .set(key, &[(field.to_string(), value.to_string())]);
    }

    /// Returns the number of fields in hash `key`.
    #[must_use]
    pub fn field_count(&self, key: &str) -> usize {
        self.inner.lock().hashes.get(key).map_or(0, BTreeMap::len)
    }

    /// Simulates losing (or regaining) the network: while offline every
    /// command fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// Number of connections currently open against this store.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.inner.lock().active_connections
    }
}

#[derive(Debug)]
enum Queued {
    Set {
        key: String,
        pairs: Vec<(String, String)>,
    },
    Delete {
        key: String,
        fields: Vec<String>,
    },
}

/// Connection to a [`MemoryStore`], with its own watch list and transaction
/// block.
#[derive(Debug)]
pub struct MemoryConnection {
    store: Arc<Mutex<Inner>>,
    watched: Vec<(String, u64)>,
    queued: Option<Vec<Queued>>,
}

impl MemoryConnection {
    fn online(&self) -> Result<parking_lot::MutexGuard<'_, Inner>> {
        let inner = self.store.lock();
        if inner.offline {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(inner)
    }

    /// Returns true while a transaction block is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.queued.is_some()
    }

    /// Returns true while any key is watched.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        !self.watched.is_empty()
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut inner = self.store.lock();
        inner.active_connections = inner.active_connections.saturating_sub(1);
    }
}

impl StoreConnection for MemoryConnection {
    fn check(&mut self) -> Result<()> {
        self.online().map(drop)
    }

    fn hash_get_all(&mut self, key: &str) -> Result<Vec<(String, String)>> {
        let inner = self.online()?;
        Ok(inner
            .hashes
            .get(key)
            .map(|hash| hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn hash_get(&mut self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        let inner = self.online()?;
        let hash = inner.hashes.get(key);
        Ok(fields
            .iter()
            .map(|field| hash.and_then(|h| h.get(*field).cloned()))
            .collect())
    }

    fn hash_keys(&mut self, key: &str) -> Result<Vec<String>> {
        let inner = self.online()?;
        Ok(inner
            .hashes
            .get(key)
            .map(|hash| hash.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn hash_set(&mut self, key: &str, pairs: &[(String, String)]) -> Result<()> {
        if let Some(queue) = self.queued.as_mut() {
            queue.push(Queued::Set {
                key: key.to_string(),
                pairs: pairs.to_vec(),
            });
            return Ok(());
        }
        self.online()?.set(key, pairs);
        Ok(())
    }

    fn hash_delete(&mut self, key: &str, fields: &[&str]) -> Result<usize> {
        let fields: Vec<String> = fields.iter().map(|f| (*f).to_string()).collect();
        if let Some(queue) = self.queued.as_mut() {
            queue.push(Queued::Delete {
                key: key.to_string(),
                fields,
            });
            return Ok(0);
        }
        Ok(self.online()?.delete(key, &fields))
    }

    fn watch(&mut self, key: &str) -> Result<()> {
        if self.queued.is_some() {
            return Err(Error::Transport(
                "WATCH inside MULTI is not allowed".to_string(),
            ));
        }
        let version = self.online()?.version(key);
        self.watched.push((key.to_string(), version));
        Ok(())
    }

    fn multi(&mut self) -> Result<()> {
        if self.queued.is_some() {
            return Err(Error::Transport("MULTI calls can not be nested".to_string()));
        }
        self.online().map(drop)?;
        self.queued = Some(Vec::new());
        Ok(())
    }

    fn exec(&mut self) -> Result<ExecOutcome> {
        let Some(queue) = self.queued.take() else {
            return Err(Error::Transport("EXEC without MULTI".to_string()));
        };
        let watched = std::mem::take(&mut self.watched);
        let mut inner = self.online()?;

        if watched.iter().any(|(key, seen)| inner.version(key) != *seen) {
            return Ok(ExecOutcome::Aborted);
        }
        for op in queue {
            match op {
                Queued::Set { key, pairs } => inner.set(&key, &pairs),
                Queued::Delete { key, fields } => {
                    inner.delete(&key, &fields);
                }
            }
        }
        Ok(ExecOutcome::Committed)
    }

    fn reset(&mut self) -> Result<()> {
        self.queued = None;
        self.watched.clear();
        Ok(())
    }
}

/// Pool handing out [`MemoryConnection`]s to one [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryPool {
    store: MemoryStore,
    closed: AtomicBool,
}

impl MemoryPool {
    /// Creates a pool over `store`.
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Returns true once [`close`](ConnectionPool::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl ConnectionPool for MemoryPool {
    type Connection = MemoryConnection;

    fn get(&self) -> Result<MemoryConnection> {
        if self.is_closed() {
            return Err(Error::PoolClosed);
        }
        Ok(self.store.connect())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
