//! View deduplication
//!
//! Decides whether a published-event read should bump the event's view
//! counter: at most once per (event, client address). The in-memory tracker
//! lives as long as the process and is not shared between instances; the
//! Redis tracker is the option for multi-instance deployments.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::config::RedisConfig;
use crate::utils::errors::Result;

#[async_trait]
pub trait ViewTracker: Send + Sync {
    /// True the first time the pair is seen, false afterwards
    async fn record_view(&self, event_id: i64, address: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryViewTracker {
    seen: DashMap<i64, DashSet<String>>,
}

impl InMemoryViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event_id: i64, address: &str) -> bool {
        self.seen.entry(event_id).or_default().insert(address.to_string())
    }

    /// Distinct addresses counted for an event so far
    pub fn unique_viewers(&self, event_id: i64) -> usize {
        self.seen.get(&event_id).map_or(0, |addresses| addresses.len())
    }
}

#[async_trait]
impl ViewTracker for InMemoryViewTracker {
    async fn record_view(&self, event_id: i64, address: &str) -> bool {
        self.record(event_id, address)
    }
}

/// Shared tracker backed by one Redis set per event
#[derive(Clone)]
pub struct RedisViewTracker {
    connection_manager: redis::aio::ConnectionManager,
    prefix: String,
    ttl_seconds: u64,
}

impl RedisViewTracker {
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            prefix: config.prefix.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }

    fn views_key(&self, event_id: i64) -> String {
        format!("{}views:{}", self.prefix, event_id)
    }
}

#[async_trait]
impl ViewTracker for RedisViewTracker {
    async fn record_view(&self, event_id: i64, address: &str) -> bool {
        let key = self.views_key(event_id);
        let mut conn = self.connection_manager.clone();

        let added = match conn.sadd::<_, _, i64>(&key, address).await {
            Ok(added) => added == 1,
            Err(e) => {
                // Counting nothing is safer than counting twice
                warn!(event_id = event_id, error = %e, "View tracking unavailable, view not counted");
                return false;
            }
        };

        if let Err(e) = conn.expire::<_, bool>(&key, self.ttl_seconds as i64).await {
            warn!(event_id = event_id, error = %e, "Failed to refresh view set TTL");
        }

        debug!(event_id = event_id, new_viewer = added, "View recorded in Redis");
        added
    }
}
