//! Rasterized comment bitmaps with deferred eviction
//!
//! Identical comments share one bitmap. Every time a comment materializes a
//! bitmap, by rasterizing or by reusing a cached one, the cache becomes
//! *claimed* by that comment and an eviction is queued. When the eviction
//! comes due the comment's bitmap is released, and the cache entry is removed
//! unless another comment has claimed it since.

mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use danmaku_core::Segment;
use tiny_skia::Pixmap;

use crate::utils::RenderError;

/// Identity of a rasterized bitmap: content segments and mail token set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    content: String,
    mail: String,
}

impl CacheKey {
    /// Key for the given segments and mail tokens, ignoring token order
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DrawingError`] if the segments cannot be
    /// serialized.
    pub fn new(segments: &[Segment], mail: &[String]) -> Result<Self, RenderError> {
        let content = serde_json::to_string(segments)
            .map_err(|e| RenderError::DrawingError(format!("unserializable content: {e}")))?;
        let mut tokens: Vec<&str> = mail.iter().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens.dedup();
        Ok(Self {
            content,
            mail: tokens.join(","),
        })
    }
}

/// A shared bitmap and the comment that last claimed it
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Rasterized comment
    pub bitmap: Arc<Pixmap>,
    /// Index of the claiming comment
    pub claimant: usize,
}

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: usize,
    /// Lookups that had to rasterize
    pub misses: usize,
    /// Entries removed by eviction
    pub evictions: usize,
    /// Due evictions that left a reclaimed entry in place
    pub stale: usize,
}

#[derive(Debug)]
struct Eviction {
    at: Duration,
    seq: u64,
    key: CacheKey,
    claimant: usize,
}

impl PartialEq for Eviction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Eviction {}

impl PartialOrd for Eviction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Eviction {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Bitmap cache with an eviction queue ordered by due time
#[derive(Debug, Default)]
pub struct BitmapCache {
    entries: AHashMap<CacheKey, CacheEntry>,
    queue: BinaryHeap<Reverse<Eviction>>,
    seq: u64,
    stats: CacheStats,
}

impl BitmapCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` and make `claimant` its owner on a hit
    pub fn claim(&mut self, key: &CacheKey, claimant: usize) -> Option<Arc<Pixmap>> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.stats.hits += 1;
                entry.claimant = claimant;
                Some(Arc::clone(&entry.bitmap))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Peek at an entry without claiming it
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Store a freshly rasterized bitmap
    pub fn insert(&mut self, key: CacheKey, bitmap: Arc<Pixmap>, claimant: usize) {
        self.entries.insert(key, CacheEntry { bitmap, claimant });
    }

    /// Queue an eviction of `claimant`'s use of `key` at time `at`
    pub fn schedule(&mut self, key: CacheKey, claimant: usize, at: Duration) {
        self.seq += 1;
        self.queue.push(Reverse(Eviction {
            at,
            seq: self.seq,
            key,
            claimant,
        }));
    }

    /// Run every eviction due at `now`
    ///
    /// Returns the claimants whose bitmaps should be released, in due order.
    pub fn drain_expired(&mut self, now: Duration) -> Vec<usize> {
        let mut released = Vec::new();
        while self.queue.peek().is_some_and(|Reverse(next)| next.at <= now) {
            let Some(Reverse(eviction)) = self.queue.pop() else {
                break;
            };
            released.push(eviction.claimant);
            match self.entries.get(&eviction.key) {
                Some(entry) if entry.claimant == eviction.claimant => {
                    self.entries.remove(&eviction.key);
                    self.stats.evictions += 1;
                }
                Some(_) => self.stats.stale += 1,
                None => {}
            }
        }
        released
    }

    /// Cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Nothing cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued evictions
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every entry and pending eviction
    pub fn clear(&mut self) {
        self.entries.clear();
        self.queue.clear();
        self.stats = CacheStats::default();
    }
}
