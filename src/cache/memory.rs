//! In-process cache backed by `DashMap`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use crate::cache::Cache;

#[derive(Debug)]
struct Item {
    value: Value,
    expires_at: Option<Instant>,
}

impl Item {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Thread-safe [`Cache`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    items: DashMap<String, Item>,
    queues: DashMap<String, VecDeque<Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items, expired ones included until the next `gc`.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let item = self.items.get(key)?;
            if !item.is_expired(now) {
                return Some(item.value.clone());
            }
        }
        // guard released above; remove only if still expired
        self.items.remove_if(key, |_, item| item.is_expired(now));
        None
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.items.insert(key.to_string(), Item { value, expires_at });
    }

    fn del(&self, key: &str) -> bool {
        self.items.remove(key).is_some()
    }

    fn push(&self, key: &str, value: Value) {
        self.queues.entry(key.to_string()).or_default().push_back(value);
    }

    fn pop(&self, key: &str) -> Option<Value> {
        let value = self.queues.get_mut(key)?.pop_front();
        self.queues.remove_if(key, |_, queue| queue.is_empty());
        value
    }

    fn flush(&self) {
        self.items.clear();
        self.queues.clear();
    }

    fn gc(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.items.retain(|_, item| {
            let keep = !item.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            tracing::debug!(removed, remaining = self.items.len(), "Cache GC");
        }
        removed
    }
}
