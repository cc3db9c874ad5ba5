//! Blocking Redis backend.
//!
//! Maps [`StoreConnection`] onto `HGETALL`/`HMGET`/`HKEYS`/`HSET`/`HDEL` and
//! the `WATCH`/`MULTI`/`EXEC` transaction. Connections go back to an idle list
//! on drop after their watch and transaction state has been cleared.

use parking_lot::Mutex;
use redis::ConnectionLike;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};

use super::{ConnectionPool, ExecOutcome, StoreConnection};

struct Shared {
    client: redis::Client,
    idle: Mutex<Vec<redis::Connection>>,
    max_idle: usize,
    closed: AtomicBool,
}

/// Pool of blocking Redis connections.
#[derive(Clone)]
pub struct RedisPool {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("max_idle", &self.shared.max_idle)
            .field("closed", &self.shared.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl RedisPool {
    /// Creates a pool for `url` keeping at most `max_idle` idle connections.
    /// No connection is opened until the first [`get`](ConnectionPool::get).
    pub fn open(url: &str, max_idle: usize) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            shared: Arc::new(Shared {
                client,
                idle: Mutex::new(Vec::with_capacity(max_idle)),
                max_idle,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Creates a pool from the `[store]` configuration section.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open(&config.url, config.max_idle)
    }
}

impl ConnectionPool for RedisPool {
    type Connection = RedisConnection;

    fn get(&self) -> Result<RedisConnection> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(Error::PoolClosed);
        }
        let reused = self.shared.idle.lock().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => self.shared.client.get_connection()?,
        };
        Ok(RedisConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.shared),
            in_multi: false,
            watching: false,
        })
    }

    fn close(&self) -> Result<()> {
        self.shared.closed.store(true, Ordering::Release);
        let drained = std::mem::take(&mut *self.shared.idle.lock());
        debug!(closed = drained.len(), "redis pool shut down");
        Ok(())
    }
}

/// A pooled Redis connection.
pub struct RedisConnection {
    conn: Option<redis::Connection>,
    pool: Arc<Shared>,
    in_multi: bool,
    watching: bool,
}

impl RedisConnection {
    fn raw(&mut self) -> Result<&mut redis::Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::Transport("connection already released".to_string()))
    }
}

impl Drop for RedisConnection {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };
        let cleared = if self.in_multi {
            redis::cmd("DISCARD").query::<()>(&mut conn)
        } else if self.watching {
            redis::cmd("UNWATCH").query::<()>(&mut conn)
        } else {
            Ok(())
        };
        if let Err(err) = cleared {
            warn!(error = %err, "dropping redis connection");
            return;
        }
        if self.pool.closed.load(Ordering::Acquire) || !conn.is_open() {
            return;
        }
        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.max_idle {
            idle.push(conn);
        }
    }
}

impl StoreConnection for RedisConnection {
    fn check(&mut self) -> Result<()> {
        if self.raw()?.is_open() {
            Ok(())
        } else {
            Err(Error::Transport("connection is closed".to_string()))
        }
    }

    fn hash_get_all(&mut self, key: &str) -> Result<Vec<(String, String)>> {
        let map: HashMap<String, String> =
            redis::cmd("HGETALL").arg(key).query(self.raw()?)?;
        Ok(map.into_iter().collect())
    }

    fn hash_get(&mut self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        Ok(redis::cmd("HMGET").arg(key).arg(fields).query(self.raw()?)?)
    }

    fn hash_keys(&mut self, key: &str) -> Result<Vec<String>> {
        Ok(redis::cmd("HKEYS").arg(key).query(self.raw()?)?)
    }

    fn hash_set(&mut self, key: &str, pairs: &[(String, String)]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in pairs {
            cmd.arg(field).arg(value);
        }
        cmd.query::<()>(self.raw()?)?;
        Ok(())
    }

    fn hash_delete(&mut self, key: &str, fields: &[&str]) -> Result<usize> {
        if fields.is_empty() {
            return Ok(0);
        }
        if self.in_multi {
            redis::cmd("HDEL").arg(key).arg(fields).query::<()>(self.raw()?)?;
            return Ok(0);
        }
        Ok(redis::cmd("HDEL").arg(key).arg(fields).query(self.raw()?)?)
    }

    fn watch(&mut self, key: &str) -> Result<()> {
        redis::cmd("WATCH").arg(key).query::<()>(self.raw()?)?;
        self.watching = true;
        Ok(())
    }

    fn multi(&mut self) -> Result<()> {
        redis::cmd("MULTI").query::<()>(self.raw()?)?;
        self.in_multi = true;
        Ok(())
    }

    fn exec(&mut self) -> Result<ExecOutcome> {
        let reply: redis::RedisResult<redis::Value> = redis::cmd("EXEC").query(self.raw()?);
        self.in_multi = false;
        self.watching = false;
        match reply? {
            redis::Value::Nil => Ok(ExecOutcome::Aborted),
            _ => Ok(ExecOutcome::Committed),
        }
    }

    fn reset(&mut self) -> Result<()> {
        // DISCARD also drops every watch.
        if self.in_multi {
            redis::cmd("DISCARD").query::<()>(self.raw()?)?;
        } else if self.watching {
            redis::cmd("UNWATCH").query::<()>(self.raw()?)?;
        }
        self.in_multi = false;
        self.watching = false;
        Ok(())
    }
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection")
            .field("in_multi", &self.in_multi)
            .field("watching", &self.watching)
            .finish_non_exhaustive()
    }
}
