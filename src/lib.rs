//! # TM35 Tiles
//!
//! A tile pyramid builder and tile server for the Finnish ETRS-TM35FIN map
//! grid.
//!
//! This library cuts georeferenced raster images into a fixed-origin pyramid
//! of 256×256 PNG tiles on local disk, and serves those tiles over HTTP. Zoom
//! levels without pre-rendered tiles are filled on demand by resampling the
//! nearest coarser level.
//!
//! ## Features
//!
//! - **Fixed grid**: One projection, one origin, zoom 0-15, pixel size halving per level
//! - **World file import**: Zoom level derived from the `.pgw` pixel size
//! - **Compositing writes**: Overlapping sources merge into existing tiles
//! - **Zoom gap resampling**: Up to 3 levels synthesized from coarser tiles
//! - **In-memory caching**: Entry-bounded LRU cache with hit/miss counters
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`grid`] - Grid math and world file parsing
//! - [`store`] - On-disk tile layout, layer discovery and tile writing
//! - [`import`] - Raster extraction and the import pipeline
//! - [`tile`] - Tile service, resampling and caching
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use tm35_tiles::{create_router, RasterImportPipeline, RouterConfig, TileService};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Build a layer from georeferenced sources
//!     let pipeline = RasterImportPipeline::new("/srv/tiles", "terrain");
//!     let tiles = pipeline.import_files(["/data/sheets/L4131.png"]);
//!     println!("Wrote {} tiles", tiles);
//!
//!     // Serve every discovered layer
//!     let service = TileService::open("/srv/tiles", 10_000).unwrap();
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod import;
pub mod server;
pub mod store;
pub mod tile;

// Re-export commonly used types
pub use config::{Cli, Command, ImportConfig, LayersConfig, ServeConfig};
pub use error::{
    CacheError, GridError, ImportError, OpenError, StoreError, TileError, WorldFileError,
};
pub use grid::{TileBounds, TileCoordinate, WorldFileData, GRID_ID, TILE_SIZE};
pub use import::{import_source_paths, ExtractedTile, RasterImportPipeline, TileExtractor};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use store::{discover_layers, Layer, TileStore, TileWriter};
pub use tile::{
    CacheStats, Resampled, TileCache, TileCacheKey, TileResampler, TileResult, TileService,
    TileSource, DEFAULT_TILE_CACHE_CAPACITY,
};
