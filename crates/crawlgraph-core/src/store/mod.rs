//! Store transport: the connection abstraction, the wire codec and the
//! check-and-set protocol.
//!
//! A graph lives in one hash per namespace (`graphs:contents:<name>`); each
//! field is a vertex id and each value a JSON [`Edges`](crate::graph::Edges)
//! record. Any backend offering hash reads and writes plus a
//! watch / multi / exec transaction can host a graph:
//!
//! - [`MemoryStore`]: in-process backend with per-key version counters.
//! - `RedisPool` (feature `redis`): a blocking Redis backend.

mod codec;
mod memory;
#[cfg(feature = "redis")]
mod redis_backend;


pub use codec::{
    check_cas, contents_key, decode_edges, encode_edges, graph_cas, load_graph, load_subgraph,
    read_vertices, remove_vertices, set_cas, start_cas, store_graph, store_records,
    GRAPHS_CONTENTS,
};
pub use memory::{MemoryConnection, MemoryPool, MemoryStore};
#[cfg(feature = "redis")]
pub use redis_backend::{RedisConnection, RedisPool};

use crate::error::Result;

/// Result of executing a transaction block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Queued writes were applied.
    Committed,
    /// A watched key changed; queued writes were discarded.
    Aborted,
}

/// One blocking connection to a hash-capable key-value store.
///
/// Between [`multi`](Self::multi) and [`exec`](Self::exec) the write methods
/// queue instead of applying, mirroring a Redis transaction block.
pub trait StoreConnection: Send {
    /// Fails if the connection is known to be unusable.
    fn check(&mut self) -> Result<()>;

    /// Returns every `(field, value)` pair of the hash at `key`.
    fn hash_get_all(&mut self, key: &str) -> Result<Vec<(String, String)>>;

    /// Returns the values of `fields`, `None` for missing fields.
    fn hash_get(&mut self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>>;

    /// Returns every field name of the hash at `key`.
    fn hash_keys(&mut self, key: &str) -> Result<Vec<String>>;

    /// Upserts `(field, value)` pairs.
    fn hash_set(&mut self, key: &str, pairs: &[(String, String)]) -> Result<()>;

    /// Deletes `fields` and returns how many existed.
    fn hash_delete(&mut self, key: &str, fields: &[&str]) -> Result<usize>;

    /// Registers a watch on `key` for the next transaction.
    fn watch(&mut self, key: &str) -> Result<()>;

    /// Opens a transaction block.
    fn multi(&mut self) -> Result<()>;

    /// Executes the transaction block, clearing all watches.
    fn exec(&mut self) -> Result<ExecOutcome>;

    /// Drops any open transaction block and every watch.
    fn reset(&mut self) -> Result<()>;
}

/// Source of store connections shared by concurrent callers.
pub trait ConnectionPool: Send + Sync {
    /// Connection type handed out by the pool.
    type Connection: StoreConnection;

    /// Acquires a connection; dropping it hands it back.
    fn get(&self) -> Result<Self::Connection>;

    /// Tears the pool down. Later [`get`](Self::get) calls fail.
    fn close(&self) -> Result<()>;
}
