//! Error types for crawlgraph.

use thiserror::Error;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the storage policies and the store transport.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection or network failure talking to the store.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A persisted adjacency record could not be decoded.
    #[error("could not parse edges {record} in vertex {vertex} from graph {graph}: {source}")]
    Serialization {
        /// Graph the record belongs to.
        graph: String,
        /// Vertex (hash field) holding the record.
        vertex: String,
        /// Raw stored value.
        record: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },

    /// An adjacency record could not be encoded for write-back.
    #[error("could not encode edges, commit aborted: {0}")]
    Encode(#[from] serde_json::Error),

    /// An edge weight has no JSON representation (NaN or infinite).
    #[error("edge to {neighbor} has non-finite weight {weight}, commit aborted")]
    NonFiniteWeight {
        /// Neighbour id keying the offending edge.
        neighbor: String,
        /// Rejected weight.
        weight: f64,
    },

    /// The watched graph key changed between snapshot load and commit.
    #[error("graph {0}: concurrent modification, transaction aborted")]
    Conflict(String),

    /// The snapshot already committed or released its connection.
    #[error("graph {0}: snapshot already committed or released")]
    SnapshotConsumed(String),

    /// The connection pool has been shut down.
    #[error("connection pool is closed")]
    PoolClosed,

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true when the caller may reopen a snapshot and reapply its
    /// mutations.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Stable error code, for hosts that surface errors over a wire protocol.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::Transport(_) | Error::PoolClosed => "TRANSPORT",
            Error::Serialization { .. } | Error::Encode(_) | Error::NonFiniteWeight { .. } => {
                "SERIALIZATION"
            }
            Error::Conflict(_) => "CONFLICT",
            Error::SnapshotConsumed(_) => "SNAPSHOT_CONSUMED",
            Error::Config(_) => "CONFIG",
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Transport(err.to_string())
    }
}
