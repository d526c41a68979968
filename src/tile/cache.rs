//! Tile cache for encoded tiles.
//!
//! This module provides a bounded LRU cache for encoded tiles, preventing
//! repeated disk reads and resampling for frequently requested tiles.
//!
//! # Cache Key
//!
//! Tiles are cached by a composite key of:
//! - Layer name
//! - Zoom level
//! - Tile row
//! - Tile column
//!
//! # Entry-Based Eviction
//!
//! Capacity is a fixed number of entries. Inserting a new key into a full
//! cache evicts exactly the least-recently-used entry.
//!
//! # Thread Safety
//!
//! The LRU map and its recency list sit behind a single mutex. Lookups
//! reorder the recency list, so `get` takes the same exclusive lock as `put`.
//! Hit and miss counters are updated while that lock is held.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use lru::LruCache;

use crate::error::CacheError;

/// Default cache capacity: 10 000 tiles
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 10_000;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for encoded tiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileCacheKey {
    /// Layer name
    pub layer: Arc<str>,

    /// Zoom level (0-15)
    pub zoom: u8,

    /// Tile row (0-indexed from the grid's north edge)
    pub row: u32,

    /// Tile column (0-indexed from the grid's west edge)
    pub col: u32,
}

impl TileCacheKey {
    /// Create a new cache key.
    pub fn new(layer: impl Into<Arc<str>>, zoom: u8, row: u32, col: u32) -> Self {
        Self {
            layer: layer.into(),
            zoom,
            row,
            col,
        }
    }
}

// =============================================================================
// Tile Cache
// =============================================================================

/// Bounded LRU cache with hit/miss accounting.
///
/// Values default to encoded tile bytes; the tile service stores its tagged
/// results so the tile source survives a cache hit.
///
/// # Example
///
/// ```
/// use tm35_tiles::tile::{TileCache, TileCacheKey};
/// use bytes::Bytes;
///
/// let cache: TileCache = TileCache::with_capacity(100).unwrap();
///
/// let key = TileCacheKey::new("terrain", 10, 100, 200);
/// let tile_data = Bytes::from_static(b"\x89PNG");
///
/// assert_eq!(cache.get(&key), None);
/// cache.put(key.clone(), tile_data.clone());
/// assert_eq!(cache.get(&key), Some(tile_data));
///
/// assert_eq!(cache.hits(), 1);
/// assert_eq!(cache.misses(), 1);
/// ```
pub struct TileCache<V = Bytes> {
    /// The underlying LRU cache
    cache: Mutex<LruCache<TileCacheKey, V>>,

    /// Lookups that found an entry
    hits: AtomicU64,

    /// Lookups that found nothing
    misses: AtomicU64,
}

impl<V: Clone> TileCache<V> {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// Fails if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::ZeroCapacity)?;
        Ok(Self::bounded(capacity))
    }

    /// Create a cache holding at most `capacity` entries.
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Lock the LRU map.
    ///
    /// A panic while holding the lock cannot leave the map half-updated
    /// (every operation is a single `LruCache` call), so a poisoned lock is
    /// recovered instead of propagated.
    fn lock(&self) -> MutexGuard<'_, LruCache<TileCacheKey, V>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a tile from the cache.
    ///
    /// Returns `Some(data)` and marks the entry as most recently used if the
    /// tile is cached, `None` otherwise.
    pub fn get(&self, key: &TileCacheKey) -> Option<V> {
        let mut cache = self.lock();
        match cache.get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Check if a tile is cached without updating LRU order or counters.
    pub fn contains(&self, key: &TileCacheKey) -> bool {
        self.lock().contains(key)
    }

    /// Store a tile in the cache.
    ///
    /// An existing entry is replaced and marked as recently used. Inserting a
    /// new key into a full cache evicts the least-recently-used entry.
    pub fn put(&self, key: TileCacheKey, value: V) {
        self.lock().put(key, value);
    }

    /// Clear all entries from the cache.
    ///
    /// Hit and miss counters are not reset.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Get the current number of cached tiles.
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Get the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Total number of lookups that found an entry.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total number of lookups that found nothing.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================
