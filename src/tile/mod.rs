//! Tile service layer.
//!
//! This module provides tile lookup, resampling and caching for serving the
//! pre-rendered ETRS-TM35FIN tile pyramid over HTTP.
//!
//! # Architecture
//!
//! The tile service sits between the HTTP layer and the on-disk tile store:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  TileCache   │  │  TileResampler  │  │
//! │  │  (tagged     │  │  (coarser zoom  │  │
//! │  │   PNGs)      │  │   → 256×256)    │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileStore                 │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileService`]: Main entry point for tile requests
//! - [`TileCache`]: Entry-bounded LRU cache with hit/miss counters
//! - [`TileResampler`]: Synthesizes missing tiles from coarser zoom levels
//! - [`TileResult`]: Encoded tile tagged as pre-rendered or resampled
//! - [`codec`]: PNG encode/decode helpers shared with the import pipeline
//!
//! # Example
//!
//! ```
//! use tm35_tiles::tile::{TileCache, TileCacheKey};
//! use bytes::Bytes;
//!
//! let cache: TileCache = TileCache::with_capacity(1_000).unwrap();
//! let key = TileCacheKey::new("terrain", 10, 100, 200);
//!
//! if cache.get(&key).is_none() {
//!     cache.put(key.clone(), Bytes::from_static(b"png"));
//! }
//! assert!(cache.contains(&key));
//! ```

mod cache;
pub mod codec;
mod resampler;
mod service;

pub use cache::{TileCache, TileCacheKey, DEFAULT_TILE_CACHE_CAPACITY};
pub use resampler::{Resampled, TileResampler, MAX_ZOOM_GAP};
pub use service::{CacheStats, TileResult, TileService, TileSource};
