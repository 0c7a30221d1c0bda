//! Shared cache reached from every request context.
//!
//! # Responsibilities
//! - Key/value storage with optional per-item expiry
//! - Named FIFO queues
//!
//! # Design Decisions
//! - Values are `serde_json::Value` so handlers can store any serializable data
//! - Implementations do their own locking; callers hold an `Arc<dyn Cache>`
//! - Expired items are invisible to `get` immediately and reclaimed by `gc`

pub mod memory;

use std::time::Duration;

use serde_json::Value;

pub use memory::MemoryCache;

/// Cache handle shared by all requests.
pub trait Cache: Send + Sync {
    /// Value stored under `key`, unless missing or expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value`. `None` keeps it until deleted or flushed.
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>);

    /// Remove `key`, returning whether it existed.
    fn del(&self, key: &str) -> bool;

    /// Append `value` to the queue named `key`.
    fn push(&self, key: &str, value: Value);

    /// Take the oldest value from the queue named `key`.
    fn pop(&self, key: &str) -> Option<Value>;

    /// Drop every item and queue.
    fn flush(&self);

    /// Reclaim expired items, returning how many were removed.
    fn gc(&self) -> usize;
}
