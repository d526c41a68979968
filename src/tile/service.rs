//! Tile Service for serving pre-rendered and resampled tiles.
//!
//! The TileService is the main entry point for tile requests. It orchestrates:
//! - Request validation
//! - Cache lookups
//! - Pre-rendered tile lookup in the tile store
//! - Resampling from coarser zoom levels
//! - Result caching
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_tile()                           │    │
//! │  │  1. Check layer       4. Resample from coarser zoom     │    │
//! │  │  2. Check cache       5. Cache & return                 │    │
//! │  │  3. Read from disk                                      │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌───────────┐      ┌──────────────┐    ┌──────────────────┐  │
//! │    │ TileCache │      │  TileStore   │    │  TileResampler   │  │
//! │    └───────────┘      └──────────────┘    └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests run synchronously on the calling thread. The service is `Sync`
//! and is shared between request threads behind an `Arc`.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use bytes::Bytes;
use tracing::debug;

use crate::error::{CacheError, OpenError, StoreError, TileError};
use crate::grid::{self, TileCoordinate};
use crate::store::{discover_layers, Layer, TileStore};

use super::cache::{TileCache, TileCacheKey, DEFAULT_TILE_CACHE_CAPACITY};
use super::codec::{encode_png, is_png};
use super::resampler::{Resampled, TileResampler};

// =============================================================================
// Tile Result
// =============================================================================

/// How a served tile was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSource {
    PreRendered,
    Resampled,
}

impl TileSource {
    /// Stable name used in logs and response headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            TileSource::PreRendered => "pre-rendered",
            TileSource::Resampled => "resampled",
        }
    }
}

/// An encoded PNG tile tagged with how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileResult {
    /// Tile read from the on-disk pyramid
    PreRendered(Bytes),

    /// Tile synthesized from a coarser zoom level
    Resampled(Bytes),
}

impl TileResult {
    /// The encoded tile data.
    pub fn data(&self) -> &Bytes {
        match self {
            TileResult::PreRendered(data) | TileResult::Resampled(data) => data,
        }
    }

    /// Consume the result and return the encoded tile data.
    pub fn into_data(self) -> Bytes {
        match self {
            TileResult::PreRendered(data) | TileResult::Resampled(data) => data,
        }
    }

    pub fn source(&self) -> TileSource {
        match self {
            TileResult::PreRendered(_) => TileSource::PreRendered,
            TileResult::Resampled(_) => TileSource::Resampled,
        }
    }
}

/// Snapshot of tile cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service for serving and caching tiles of the discovered layers.
///
/// # Example
///
/// ```ignore
/// use tm35_tiles::tile::TileService;
///
/// let service = TileService::open("/srv/tiles", 10_000)?;
///
/// let tile = service.get_tile("terrain", 10, 100, 200)?;
/// println!("{} bytes, {}", tile.data().len(), tile.source().as_str());
/// ```
pub struct TileService {
    /// Tile store holding pre-rendered tiles
    store: TileStore,

    /// Layers discovered at construction
    layers: BTreeMap<String, Layer>,

    /// Cache for encoded tiles
    cache: TileCache<TileResult>,

    /// Fallback for zoom levels without pre-rendered tiles
    resampler: TileResampler,
}

impl TileService {
    /// Create a service over `store` with an already discovered layer set.
    pub fn new(
        store: TileStore,
        layers: BTreeMap<String, Layer>,
        cache_capacity: NonZeroUsize,
    ) -> Self {
        Self {
            resampler: TileResampler::new(store.clone()),
            store,
            layers,
            cache: TileCache::bounded(cache_capacity),
        }
    }

    /// Discover the layers under `base_dir` and create a service for them.
    ///
    /// # Errors
    ///
    /// Fails if the tile directory cannot be scanned or `cache_capacity` is
    /// zero.
    pub fn open(
        base_dir: impl Into<PathBuf>,
        cache_capacity: usize,
    ) -> Result<Self, OpenError> {
        let capacity = NonZeroUsize::new(cache_capacity).ok_or(CacheError::ZeroCapacity)?;
        let store = TileStore::new(base_dir);
        let layers = discover_layers(store.base())?;
        Ok(Self::new(store, layers, capacity))
    }

    /// Discover layers and create a service with the default cache capacity.
    pub fn open_default(base_dir: impl Into<PathBuf>) -> Result<Self, OpenError> {
        Self::open(base_dir, DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Discovered layers by name.
    pub fn layers(&self) -> &BTreeMap<String, Layer> {
        &self.layers
    }

    /// Get a tile, using the cache when available.
    ///
    /// Lookup order is cache, then the pre-rendered file, then resampling
    /// from the nearest coarser zoom.
    ///
    /// # Errors
    ///
    /// - [`TileError::UnknownLayer`] if the layer was not discovered
    /// - [`TileError::InvalidZoom`] if `zoom` is outside the grid
    /// - [`TileError::TileNotFound`] if no tile can be produced
    /// - [`TileError::Store`] on I/O or codec failures
    pub fn get_tile(
        &self,
        layer: &str,
        zoom: u8,
        row: u32,
        col: u32,
    ) -> Result<TileResult, TileError> {
        let layer_info = self
            .layers
            .get(layer)
            .ok_or_else(|| TileError::UnknownLayer {
                layer: layer.to_string(),
            })?;
        grid::validate_zoom(zoom)?;

        let cache_key = TileCacheKey::new(layer, zoom, row, col);
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(layer, zoom, row, col, source = cached.source().as_str(), "Tile cache hit");
            return Ok(cached);
        }

        let coord = TileCoordinate::new(zoom, row, col);
        let result = match self.read_pre_rendered(layer, coord)? {
            Some(data) => TileResult::PreRendered(data),
            None => match self.resampler.resample(layer_info, zoom, row, col)? {
                Resampled::Tile(tile) => TileResult::Resampled(encode_png(&tile)?),
                outcome => {
                    debug!(layer, zoom, row, col, outcome = ?outcome, "Tile not found");
                    return Err(TileError::TileNotFound {
                        layer: layer.to_string(),
                        zoom,
                        row,
                        col,
                    });
                }
            },
        };

        debug!(layer, zoom, row, col, source = result.source().as_str(), "Tile cache miss");
        self.cache.put(cache_key, result.clone());

        Ok(result)
    }

    /// Read a pre-rendered tile, rejecting files that are not PNGs.
    fn read_pre_rendered(
        &self,
        layer: &str,
        coord: TileCoordinate,
    ) -> Result<Option<Bytes>, StoreError> {
        let Some(data) = self.store.read_tile(layer, coord)? else {
            return Ok(None);
        };

        if !is_png(&data) {
            return Err(StoreError::Decode {
                message: format!("{}/{} is not a PNG file", layer, coord),
            });
        }

        Ok(Some(data))
    }

    /// Get tile cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.size(),
            capacity: self.cache.capacity(),
            hits: self.cache.hits(),
            misses: self.cache.misses(),
        }
    }

    /// Clear the tile cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Get a reference to the underlying tile store.
    pub fn store(&self) -> &TileStore {
        &self.store
    }
}

// =============================================================================
// Tests
// =============================================================================
