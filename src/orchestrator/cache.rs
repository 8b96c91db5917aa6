//! In-memory suggestion cache keyed by request fingerprint.

use super::fingerprint::Fingerprint;
use crate::types::SuggestionBatch;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    batch: SuggestionBatch,
    created_at: Instant,
}

/// TTL cache of successful batches. Only successful batches are stored.
#[derive(Debug)]
pub struct SuggestionCache {
    entries: HashMap<Fingerprint, CacheEntry>,
    ttl: Duration,
}

impl SuggestionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Batch cached for `fingerprint` if it is younger than the TTL.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<SuggestionBatch> {
        self.entries
            .get(fingerprint)
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .map(|entry| entry.batch.clone())
    }

    /// Store a batch, pruning expired entries first.
    pub fn insert(&mut self, fingerprint: Fingerprint, batch: SuggestionBatch) {
        if batch.is_error() {
            return;
        }
        self.prune();
        self.entries.insert(
            fingerprint,
            CacheEntry {
                batch,
                created_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries; returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
