//! Query Cache Invalidation
//!
//! Read views subscribe to named queries. A successful submission marks
//! them stale; refetching is the subscriber's job.

use std::collections::BTreeSet;
use std::sync::Mutex;

/// Cached read queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryKey {
    /// The local node's HA configuration
    HaConfig,
    /// The replication schedule of that configuration
    HaReplicationSchedule,
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::HaConfig => write!(f, "HAConfig"),
            QueryKey::HaReplicationSchedule => write!(f, "HAReplicationSchedule"),
        }
    }
}

/// Marks cached queries stale
pub trait QueryCache: Send + Sync {
    fn invalidate(&self, key: QueryKey);
}

/// In-memory set of stale query keys
#[derive(Debug, Default)]
pub struct StaleQueries {
    stale: Mutex<BTreeSet<QueryKey>>,
}

impl StaleQueries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.stale
            .lock()
            .map(|s| s.contains(&key))
            .unwrap_or(false)
    }

    /// Drain the stale keys in a stable order
    pub fn take_stale(&self) -> Vec<QueryKey> {
        match self.stale.lock() {
            Ok(mut s) => std::mem::take(&mut *s).into_iter().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl QueryCache for StaleQueries {
    fn invalidate(&self, key: QueryKey) {
        tracing::debug!("Invalidating query {}", key);
        if let Ok(mut s) = self.stale.lock() {
            s.insert(key);
        }
    }
}
