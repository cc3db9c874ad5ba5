//! Wire codec and the raw store protocol for graph namespaces.

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{Edges, InMemoryPolicy, StoragePolicy};

use super::{ExecOutcome, StoreConnection};

/// Key prefix of every graph hash.
pub const GRAPHS_CONTENTS: &str = "graphs:contents:";

/// Returns the hash key holding graph `name`.
#[must_use]
pub fn contents_key(name: &str) -> String {
    format!("{GRAPHS_CONTENTS}{name}")
}

/// Serializes an adjacency record to its stored JSON form.
///
/// Non-finite weights are rejected: `serde_json` would write them as `null`,
/// which no later load can decode.
pub fn encode_edges(edges: &Edges) -> Result<String> {
    if let Some((neighbor, value)) = edges
        .in_edges
        .iter()
        .chain(&edges.out_edges)
        .find(|(_, value)| !value.weight.is_finite())
    {
        return Err(Error::NonFiniteWeight {
            neighbor: neighbor.clone(),
            weight: value.weight,
        });
    }
    Ok(serde_json::to_string(edges)?)
}

/// Parses a stored adjacency record, naming the vertex and graph on failure.
pub fn decode_edges(graph: &str, vertex: &str, data: &str) -> Result<Edges> {
    serde_json::from_str(data).map_err(|source| Error::Serialization {
        graph: graph.to_string(),
        vertex: vertex.to_string(),
        record: data.to_string(),
        source,
    })
}

fn with_context(err: Error, context: &str) -> Error {
    match err {
        Error::Transport(msg) => Error::Transport(format!("{context}: {msg}")),
        other => other,
    }
}

/// Loads every vertex of `mem`'s graph into `mem`.
///
/// Fails fast: if any stored record is malformed nothing is installed.
/// Recovery is a rebuild from the upstream crawl.
pub fn load_graph<C>(conn: &mut C, mem: &mut InMemoryPolicy) -> Result<()>
where
    C: StoreConnection + ?Sized,
{
    let graph = mem.name().to_string();
    let pairs = conn
        .hash_get_all(&contents_key(&graph))
        .map_err(|e| with_context(e, "could not read graph"))?;

    let decoded = pairs
        .into_iter()
        .map(|(vertex, data)| {
            let edges = decode_edges(&graph, &vertex, &data)?;
            Ok((vertex, edges))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(graph = %graph, vertices = decoded.len(), "loaded graph");
    for (vertex, edges) in decoded {
        mem.put_record(vertex, edges);
    }
    Ok(())
}

/// Loads only `vertices` into `mem`. Vertices absent from the store are
/// skipped; malformed records abort the whole load.
pub fn load_subgraph<C>(conn: &mut C, mem: &mut InMemoryPolicy, vertices: &[&str]) -> Result<()>
where
    C: StoreConnection + ?Sized,
{
    if vertices.is_empty() {
        return Ok(());
    }
    let graph = mem.name().to_string();
    let values = conn
        .hash_get(&contents_key(&graph), vertices)
        .map_err(|e| with_context(e, "could not read subgraph"))?;

    let mut decoded = Vec::with_capacity(values.len());
    for (vertex, value) in vertices.iter().zip(values) {
        let Some(data) = value else {
            continue;
        };
        decoded.push(((*vertex).to_string(), decode_edges(&graph, vertex, &data)?));
    }

    debug!(graph = %graph, requested = vertices.len(), found = decoded.len(), "loaded subgraph");
    for (vertex, edges) in decoded {
        mem.put_record(vertex, edges);
    }
    Ok(())
}

/// Lists every vertex stored for `graph`, without check-and-set protection.
pub fn read_vertices<C>(conn: &mut C, graph: &str) -> Result<Vec<String>>
where
    C: StoreConnection + ?Sized,
{
    conn.hash_keys(&contents_key(graph))
        .map_err(|e| with_context(e, "could not list vertices"))
}

/// Upserts the given records into `graph`'s hash. An empty changeset issues
/// no command.
pub fn store_records<'a, C, I>(conn: &mut C, graph: &str, records: I) -> Result<usize>
where
    C: StoreConnection + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a Edges)>,
{
    let pairs = records
        .into_iter()
        .map(|(vertex, edges)| Ok((vertex.to_string(), encode_edges(edges)?)))
        .collect::<Result<Vec<_>>>()?;
    if pairs.is_empty() {
        return Ok(0);
    }

    conn.hash_set(&contents_key(graph), &pairs)
        .map_err(|e| with_context(e, &format!("could not write to graph {graph}")))?;
    Ok(pairs.len())
}

/// Upserts every vertex held by `mem`.
pub fn store_graph<C>(conn: &mut C, mem: &InMemoryPolicy) -> Result<usize>
where
    C: StoreConnection + ?Sized,
{
    let graph = mem.name();
    store_records(conn, graph, mem.records())
}

/// Deletes `vertices` from `graph` and returns how many actually existed.
pub fn remove_vertices<C>(conn: &mut C, graph: &str, vertices: &[&str]) -> Result<usize>
where
    C: StoreConnection + ?Sized,
{
    if vertices.is_empty() {
        return Ok(0);
    }
    conn.hash_delete(&contents_key(graph), vertices)
        .map_err(|e| with_context(e, &format!("could not delete from graph {graph}")))
}

// Check-and-set idiom: watch, open a block, queue writes, execute. Execution
// is not guaranteed; an aborted block must be retried by the caller.

/// Watches the whole `graph` hash.
pub fn graph_cas<C>(conn: &mut C, graph: &str) -> Result<()>
where
    C: StoreConnection + ?Sized,
{
    start_cas(conn, &contents_key(graph))
}

/// Watches `key`.
pub fn start_cas<C>(conn: &mut C, key: &str) -> Result<()>
where
    C: StoreConnection + ?Sized,
{
    conn.watch(key)
        .map_err(|e| with_context(e, "could not start check-and-set"))
}

/// Opens the transaction block.
pub fn check_cas<C>(conn: &mut C) -> Result<()>
where
    C: StoreConnection + ?Sized,
{
    conn.multi()
        .map_err(|e| with_context(e, "could not start write operations"))
}

/// Executes the transaction block; an invalidated watch yields
/// [`Error::Conflict`].
pub fn set_cas<C>(conn: &mut C, graph: &str) -> Result<()>
where
    C: StoreConnection + ?Sized,
{
    match conn
        .exec()
        .map_err(|e| with_context(e, "could not commit cas operations"))?
    {
        ExecOutcome::Committed => Ok(()),
        ExecOutcome::Aborted => Err(Error::Conflict(graph.to_string())),
    }
}
