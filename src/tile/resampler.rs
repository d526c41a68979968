//! Zoom-gap resampling.
//!
//! When a layer has no pre-rendered tile at the requested zoom, a tile can be
//! synthesized from the nearest coarser zoom that does exist: the quadrant of
//! the coarser tile covering the requested area is cut out and scaled up to a
//! full 256×256 tile.
//!
//! ```text
//! source zoom z-2 (diff = 2)          requested zoom z
//! ┌───┬───┬───┬───┐
//! │   │   │   │   │                   ┌───────────────┐
//! ├───┼───┼───┼───┤   64×64 region    │               │
//! │   │   │ ▓ │   │ ────────────────▶ │  256×256 tile │
//! ├───┼───┼───┼───┤   scaled ×4       │               │
//! │   │   │   │   │                   └───────────────┘
//! ├───┼───┼───┼───┤
//! │   │   │   │   │   sub-row = row & 3, sub-col = col & 3
//! └───┴───┴───┴───┘
//! ```
//!
//! The extraction is always a single step from the nearest available zoom,
//! and results are never written back to disk.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::error::StoreError;
use crate::grid::{TileCoordinate, TILE_SIZE};
use crate::store::{Layer, TileStore};

use super::codec::decode_png;

/// Largest zoom difference that is resampled.
pub const MAX_ZOOM_GAP: u8 = 3;

/// Result of a resampling attempt.
#[derive(Debug, Clone)]
pub enum Resampled {
    /// A synthesized 256×256 tile
    Tile(RgbaImage),

    /// The layer has no zoom level below the requested one
    NoSourceZoom,

    /// The nearest coarser zoom is more than [`MAX_ZOOM_GAP`] levels away
    GapTooLarge { source_zoom: u8, gap: u8 },

    /// The covering tile at the source zoom does not exist
    SourceTileMissing { source: TileCoordinate },
}

/// Synthesizes missing tiles from coarser zoom levels of the tile store.
#[derive(Debug, Clone)]
pub struct TileResampler {
    store: TileStore,
    max_zoom_gap: u8,
    filter: FilterType,
}

impl TileResampler {
    /// Create a resampler with the default maximum zoom gap and bilinear
    /// scaling.
    pub fn new(store: TileStore) -> Self {
        Self {
            store,
            max_zoom_gap: MAX_ZOOM_GAP,
            filter: FilterType::Triangle,
        }
    }

    /// Set the scaling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Greatest available zoom of `layer` strictly below `zoom`.
    pub fn find_source_zoom(layer: &Layer, zoom: u8) -> Option<u8> {
        layer.available_zoom_levels.range(..zoom).next_back().copied()
    }

    /// Synthesize the tile at (`zoom`, `row`, `col`) from a coarser zoom.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O or decode failures on the source tile;
    /// absent data is reported through [`Resampled`].
    pub fn resample(
        &self,
        layer: &Layer,
        zoom: u8,
        row: u32,
        col: u32,
    ) -> Result<Resampled, StoreError> {
        let Some(source_zoom) = Self::find_source_zoom(layer, zoom) else {
            return Ok(Resampled::NoSourceZoom);
        };

        let gap = zoom - source_zoom;
        if gap > self.max_zoom_gap {
            return Ok(Resampled::GapTooLarge { source_zoom, gap });
        }

        let source = TileCoordinate::new(source_zoom, row >> gap, col >> gap);
        let Some(data) = self.store.read_tile(&layer.name, source)? else {
            return Ok(Resampled::SourceTileMissing { source });
        };
        let source_tile = decode_png(&data)?;
        let (width, height) = source_tile.dimensions();
        if (width, height) != (TILE_SIZE, TILE_SIZE) {
            return Err(StoreError::Decode {
                message: format!(
                    "source tile {}/{}/{} is {}x{}, expected {}x{}",
                    source.zoom, source.row, source.col, width, height, TILE_SIZE, TILE_SIZE
                ),
            });
        }

        let mask = (1u32 << gap) - 1;
        let region_size = TILE_SIZE >> gap;
        let offset_x = (col & mask) * region_size;
        let offset_y = (row & mask) * region_size;

        debug!(
            layer = %layer.name,
            zoom,
            row,
            col,
            source_zoom,
            gap,
            "Resampling tile from coarser zoom"
        );

        let region =
            imageops::crop_imm(&source_tile, offset_x, offset_y, region_size, region_size).to_image();
        let tile = imageops::resize(&region, TILE_SIZE, TILE_SIZE, self.filter);

        Ok(Resampled::Tile(tile))
    }
}
