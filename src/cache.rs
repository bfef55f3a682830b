//! Keyed store for looked-up entries.
//!
//! The store is shared between [`PeopleDirectory`](crate::people::PeopleDirectory) instances.
//! Writers are not coordinated; when two instances store the same key, the last write wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::directory::DirectoryEntry;


#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn put(&self, key: &str, entry: DirectoryEntry, ttl: Duration);
    async fn get(&self, key: &str) -> Option<DirectoryEntry>;
    async fn has(&self, key: &str) -> bool;
}


struct CachedEntry {
    entry: DirectoryEntry,
    expires_at: Instant,
}
impl CachedEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}


/// How often `put` sweeps out expired entries.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);


#[derive(Default)]
struct Entries {
    by_key: HashMap<String, CachedEntry>,
    next_prune: Option<Instant>,
}
impl Entries {
    fn prune(&mut self, now: Instant) -> usize {
        let before = self.by_key.len();
        self.by_key.retain(|_, c| c.is_live(now));
        self.next_prune = Some(now + PRUNE_INTERVAL);
        before - self.by_key.len()
    }
}


/// An in-process [`CacheStore`] with per-entry expiry.
///
/// Expired entries read as absent right away but are only dropped from memory by [`prune`],
/// which `put` runs at most once per minute.
///
/// [`prune`]: MemoryCache::prune
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<Entries>>,
}
impl MemoryCache {
    pub fn new() -> Self { Self::default() }

    /// Number of entries that have not yet expired.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await
            .by_key.values()
            .filter(|c| c.is_live(now))
            .count()
    }

    pub async fn clear(&self) {
        self.entries.write().await.by_key.clear();
    }

    /// Drops expired entries and returns how many were dropped.
    pub async fn prune(&self) -> usize {
        self.entries.write().await.prune(Instant::now())
    }
}
#[async_trait]
impl CacheStore for MemoryCache {
    async fn put(&self, key: &str, entry: DirectoryEntry, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.next_prune.map_or(true, |at| at <= now) {
            entries.prune(now);
        }
        entries.by_key.insert(
            key.to_owned(),
            CachedEntry {
                entry,
                expires_at: now + ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<DirectoryEntry> {
        let entries = self.entries.read().await;
        let cached = entries.by_key.get(key)?;
        if cached.is_live(Instant::now()) {
            Some(cached.entry.clone())
        } else {
            None
        }
    }

    async fn has(&self, key: &str) -> bool {
        let entries = self.entries.read().await;
        entries.by_key.get(key)
            .map(|c| c.is_live(Instant::now()))
            .unwrap_or(false)
    }
}
