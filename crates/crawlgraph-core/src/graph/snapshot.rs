//! Snapshot policy with a deferred, check-and-set protected commit.
//!
//! A snapshot watches the graph key, loads the whole graph (or a subset of
//! vertices) into an [`InMemoryPolicy`], applies mutations locally while
//! recording every touched vertex, and on [`commit`] writes back only those
//! vertices inside one transaction. Vertices removed with `remove_vertices`
//! are deleted in that same transaction; no other vertex is ever deleted. If anyone else modified the graph after
//! the watch was registered, the transaction is discarded and commit returns
//! [`Error::Conflict`]; the caller retries by opening a fresh snapshot.
//!
//! Commit is single-use: its correctness is relative to the one load.
//!
//! # Example
//!
//! ```rust
//! use crawlgraph_core::graph::{EdgeKind, EdgeValue, InsertEdge, SnapshotPolicy, StoragePolicy};
//! use crawlgraph_core::store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let mut snapshot = SnapshotPolicy::open("web", store.connect()).unwrap();
//! snapshot
//!     .insert_edges(&[InsertEdge::new("a", "b", EdgeValue::new(2.5, EdgeKind::Resource))])
//!     .unwrap();
//! snapshot.commit().unwrap();
//!
//! let reloaded = SnapshotPolicy::open("web", store.connect()).unwrap();
//! assert!(reloaded.edges("b").unwrap().unwrap().in_edges.contains_key("a"));
//! ```
//!
//! [`commit`]: StoragePolicy::commit

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{self, StoreConnection};

use super::in_memory::InMemoryPolicy;
use super::policy::StoragePolicy;
use super::types::{Edges, InsertEdge, RemoveEdge};

/// Single-use snapshot that owns one store connection until commit.
#[derive(Debug)]
pub struct SnapshotPolicy<C: StoreConnection> {
    mem: InMemoryPolicy,
    conn: Option<C>,
    dirty: FxHashSet<String>,
    removed: FxHashSet<String>,
    // Ids already read from the store; `None` once the whole graph is loaded.
    loaded: Option<FxHashSet<String>>,
}

impl<C: StoreConnection> SnapshotPolicy<C> {
    /// Watches `graph` and loads all of it.
    ///
    /// On error the connection has been dropped and no snapshot exists.
    pub fn open(graph: impl Into<String>, conn: C) -> Result<Self> {
        let mut snapshot = Self::watch(graph.into(), conn)?;
        if let Some(conn) = snapshot.conn.as_mut() {
            store::load_graph(conn, &mut snapshot.mem)?;
        }
        Ok(snapshot)
    }

    /// Watches `graph` and loads only `vertices`. Vertices absent from the
    /// store are simply missing from the snapshot.
    ///
    /// A later mutation touching a vertex outside `vertices` first reads that
    /// vertex's stored record, so commit never overwrites edges it has not
    /// seen.
    pub fn open_subgraph(graph: impl Into<String>, conn: C, vertices: &[&str]) -> Result<Self> {
        let mut snapshot = Self::watch(graph.into(), conn)?;
        if let Some(conn) = snapshot.conn.as_mut() {
            store::load_subgraph(conn, &mut snapshot.mem, vertices)?;
        }
        snapshot.loaded = Some(vertices.iter().map(|v| (*v).to_string()).collect());
        Ok(snapshot)
    }

    fn watch(graph: String, mut conn: C) -> Result<Self> {
        conn.check()
            .map_err(|e| Error::Transport(format!("invalid connection ({e})")))?;
        store::graph_cas(&mut conn, &graph)?;
        debug!(graph = %graph, "snapshot watch registered");
        Ok(Self {
            mem: InMemoryPolicy::new(graph),
            conn: Some(conn),
            dirty: FxHashSet::default(),
            removed: FxHashSet::default(),
            loaded: None,
        })
    }

    /// Returns true until the snapshot has committed or been released.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Vertices touched since the snapshot was loaded.
    pub fn dirty_vertices(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Returns true if `vertex` was touched since the snapshot was loaded.
    #[must_use]
    pub fn is_dirty(&self, vertex: &str) -> bool {
        self.dirty.contains(vertex)
    }

    /// Borrows the in-memory view.
    #[must_use]
    pub fn view(&self) -> &InMemoryPolicy {
        &self.mem
    }

    /// Drops the watch and the connection without running a transaction.
    /// Buffered mutations are discarded.
    pub fn release(&mut self) -> Result<()> {
        let mut conn = self.take_conn()?;
        conn.reset()
    }

    fn take_conn(&mut self) -> Result<C> {
        self.conn
            .take()
            .ok_or_else(|| Error::SnapshotConsumed(self.mem.name().to_string()))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.conn.is_some() {
            Ok(())
        } else {
            Err(Error::SnapshotConsumed(self.mem.name().to_string()))
        }
    }

    // Reads the stored records of vertices a partial snapshot has not seen
    // yet. Runs under the watch, so a concurrent change still aborts commit.
    fn fault_in(&mut self, vertices: &[&str]) -> Result<()> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };
        let mut missing: Vec<&str> = vertices
            .iter()
            .copied()
            .filter(|v| !loaded.contains(*v))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        missing.dedup();

        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| Error::SnapshotConsumed(self.mem.name().to_string()))?;
        store::load_subgraph(conn, &mut self.mem, &missing)?;
        loaded.extend(missing.iter().map(|v| (*v).to_string()));
        Ok(())
    }

    fn mark<'a>(&mut self, vertices: impl IntoIterator<Item = &'a str>) {
        for vertex in vertices {
            self.removed.remove(vertex);
            if !self.dirty.contains(vertex) {
                self.dirty.insert(vertex.to_string());
            }
        }
    }

    // Dirty vertices still in the view are upserted; vertices explicitly
    // removed are deleted in the same transaction.
    fn write_back(&self, conn: &mut C) -> Result<()> {
        let graph = self.mem.name();

        let mut removed = Vec::with_capacity(self.removed.len());
        let mut kept = Vec::with_capacity(self.dirty.len());
        for vertex in &self.dirty {
            match self.mem.record(vertex) {
                Some(edges) => kept.push((vertex.as_str(), edges)),
                None if self.removed.contains(vertex) => removed.push(vertex.as_str()),
                None => {}
            }
        }

        store::check_cas(conn)?;

        let written = store::store_records(conn, graph, kept)?;
        if !removed.is_empty() {
            conn.hash_delete(&store::contents_key(graph), &removed)?;
        }
        store::set_cas(conn, graph)?;

        debug!(graph = %graph, written, removed = removed.len(), "snapshot committed");
        Ok(())
    }
}

impl<C: StoreConnection> StoragePolicy for SnapshotPolicy<C> {
    fn name(&self) -> &str {
        self.mem.name()
    }

    fn vertices(&self) -> Result<Vec<String>> {
        self.mem.vertices()
    }

    fn edges(&self, vertex: &str) -> Result<Option<Edges>> {
        self.mem.edges(vertex)
    }

    fn insert_edges(&mut self, edges: &[InsertEdge]) -> Result<()> {
        self.ensure_open()?;
        let touched: Vec<&str> = edges
            .iter()
            .flat_map(|e| [e.src.as_str(), e.dst.as_str()])
            .collect();
        self.fault_in(&touched)?;
        self.mark(touched);
        self.mem.insert_edges(edges)
    }

    fn remove_edges(&mut self, edges: &[RemoveEdge]) -> Result<()> {
        self.ensure_open()?;
        let touched: Vec<&str> = edges
            .iter()
            .flat_map(|e| [e.src.as_str(), e.dst.as_str()])
            .collect();
        self.fault_in(&touched)?;
        self.mark(touched);
        self.mem.remove_edges(edges)
    }

    fn insert_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        self.ensure_open()?;
        self.fault_in(vertices)?;
        self.mark(vertices.iter().copied());
        self.mem.insert_vertices(vertices)
    }

    fn remove_vertices(&mut self, vertices: &[&str]) -> Result<()> {
        self.ensure_open()?;
        self.mark(vertices.iter().copied());
        self.removed.extend(vertices.iter().map(|v| (*v).to_string()));
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.extend(vertices.iter().map(|v| (*v).to_string()));
        }
        self.mem.remove_vertices(vertices)
    }

    /// Writes back the dirty vertices in one check-and-set transaction.
    ///
    /// The connection is released whatever the outcome. Calling this twice
    /// fails with [`Error::SnapshotConsumed`].
    fn commit(&mut self) -> Result<()> {
        let mut conn = self.take_conn()?;
        let result = self.write_back(&mut conn);
        if result.is_err() {
            // Best effort: the connection is dropped right after.
            let _ = conn.reset();
        }
        result
    }
}
