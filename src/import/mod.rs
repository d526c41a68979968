//! Tile pyramid import.
//!
//! Turns georeferenced source images into pre-rendered tiles:
//!
//! ```text
//! source.png + source.pgw
//!        │
//!        ▼
//! ┌──────────────────────┐   world file → pixel size → zoom level
//! │ RasterImportPipeline │
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐   cut along the grid, skip empty cells
//! │    TileExtractor     │
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐   composite over existing tiles
//! │      TileWriter      │
//! └──────────────────────┘
//! ```

mod extractor;
mod pipeline;

pub use extractor::{ExtractedTile, TileExtractor};
pub use pipeline::{import_source_paths, RasterImportPipeline};
