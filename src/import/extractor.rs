//! Tile extraction from georeferenced source rasters.
//!
//! A source raster is cut along the tile grid at a single zoom level:
//!
//! ```text
//!   grid cells           source raster (world file placement)
//! ┌──────┬──────┬──────┐
//! │      │   ┌──┼──────┼──┐
//! │      │   │▒▒│▒▒▒▒▒▒│▒▒│      each intersecting cell:
//! ├──────┼───┼──┼──────┼──┤        1. map cell bounds to source pixels
//! │      │   │▒▒│▒▒▒▒▒▒│▒▒│        2. clamp to the raster
//! │      │   └──┼──────┼──┘        3. scale the window into a 256×256 canvas
//! └──────┴──────┴──────┘           4. skip if fully transparent
//! ```
//!
//! Tiles are handed to a sink one at a time; nothing is buffered, so a
//! single source may produce any number of tiles.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::GridError;
use crate::grid::{self, TileCoordinate, WorldFileData, TILE_SIZE};
use crate::tile::codec::{blank_tile, is_fully_transparent};

/// A grid-aligned tile cut from a source raster.
#[derive(Debug, Clone)]
pub struct ExtractedTile {
    pub coord: TileCoordinate,
    pub image: RgbaImage,
}

/// Source pixel window covered by a grid cell.
///
/// `x0..x1` and `y0..y1` are the unclamped fractional pixel coordinates of
/// the cell edges; the `s*` fields are the integer window clamped to the
/// raster.
#[derive(Debug, Clone, Copy)]
struct PixelWindow {
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    sx0: u32,
    sx1: u32,
    sy0: u32,
    sy1: u32,
}

impl PixelWindow {
    /// Map a cell's projected bounds into source pixels.
    ///
    /// Returns `None` if the cell does not overlap the raster.
    fn for_cell(
        world: &WorldFileData,
        width: u32,
        height: u32,
        bounds: &grid::TileBounds,
    ) -> Option<Self> {
        let pixel_x = world.pixel_width;
        let pixel_y = -world.pixel_height;

        let x0 = (bounds.west - world.ul_corner_x) / pixel_x;
        let x1 = (bounds.east - world.ul_corner_x) / pixel_x;
        let y0 = (world.ul_corner_y - bounds.north) / pixel_y;
        let y1 = (world.ul_corner_y - bounds.south) / pixel_y;

        let cx0 = x0.max(0.0);
        let cx1 = x1.min(f64::from(width));
        let cy0 = y0.max(0.0);
        let cy1 = y1.min(f64::from(height));

        if cx1 <= cx0 || cy1 <= cy0 {
            return None;
        }

        let sx0 = cx0.floor() as u32;
        let sx1 = (cx1.ceil() as u32).min(width);
        let sy0 = cy0.floor() as u32;
        let sy1 = (cy1.ceil() as u32).min(height);

        if sx1 <= sx0 || sy1 <= sy0 {
            return None;
        }

        Some(Self {
            x0,
            x1,
            y0,
            y1,
            sx0,
            sx1,
            sy0,
            sy1,
        })
    }

    /// Destination rectangle on the tile canvas as `(x, y, width, height)`.
    ///
    /// The offset may be negative when the integer window starts before the
    /// cell edge; the overhang is clipped when drawing.
    fn destination(&self) -> Option<(i64, i64, u32, u32)> {
        let tile = f64::from(TILE_SIZE);
        let scale_x = tile / (self.x1 - self.x0);
        let scale_y = tile / (self.y1 - self.y0);

        let dx0 = ((f64::from(self.sx0) - self.x0) * scale_x).round() as i64;
        let dx1 = ((f64::from(self.sx1) - self.x0) * scale_x).round() as i64;
        let dy0 = ((f64::from(self.sy0) - self.y0) * scale_y).round() as i64;
        let dy1 = ((f64::from(self.sy1) - self.y0) * scale_y).round() as i64;

        let width = u32::try_from(dx1 - dx0).ok().filter(|w| *w > 0)?;
        let height = u32::try_from(dy1 - dy0).ok().filter(|h| *h > 0)?;
        Some((dx0, dy0, width, height))
    }
}

/// Cuts source rasters into grid tiles.
#[derive(Debug, Clone, Copy)]
pub struct TileExtractor {
    filter: FilterType,
}

impl Default for TileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TileExtractor {
    /// Create an extractor using nearest-neighbour scaling.
    pub fn new() -> Self {
        Self {
            filter: FilterType::Nearest,
        }
    }

    /// Create an extractor with a specific scaling filter.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Extract every non-transparent tile of `source` at `zoom`.
    ///
    /// Each tile is passed to `sink` as soon as it is produced. Returns the
    /// number of tiles emitted; an error from `sink` stops extraction.
    pub fn extract<F, E>(
        &self,
        source: &RgbaImage,
        world: &WorldFileData,
        zoom: u8,
        mut sink: F,
    ) -> Result<usize, E>
    where
        F: FnMut(ExtractedTile) -> Result<(), E>,
        E: From<GridError>,
    {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Ok(0);
        }

        let (west, north, east, south) = world.extent(width, height);
        let col_min = grid::column(west, zoom)?.max(0);
        let col_max = grid::column(east, zoom)?;
        let row_min = grid::row(north, zoom)?.max(0);
        let row_max = grid::row(south, zoom)?;

        let mut emitted = 0;
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                let (Ok(tile_row), Ok(tile_col)) = (u32::try_from(row), u32::try_from(col)) else {
                    continue;
                };

                let bounds = grid::tile_bounds(zoom, row, col)?;
                let Some(tile) = self.render_cell(source, world, &bounds) else {
                    continue;
                };

                sink(ExtractedTile {
                    coord: TileCoordinate::new(zoom, tile_row, tile_col),
                    image: tile,
                })?;
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// Draw the part of `source` covered by `bounds` into a fresh canvas.
    ///
    /// Returns `None` if the cell misses the raster or only covers
    /// transparent pixels.
    fn render_cell(
        &self,
        source: &RgbaImage,
        world: &WorldFileData,
        bounds: &grid::TileBounds,
    ) -> Option<RgbaImage> {
        let (width, height) = source.dimensions();
        let window = PixelWindow::for_cell(world, width, height, bounds)?;
        let (dx, dy, dw, dh) = window.destination()?;

        let region = imageops::crop_imm(
            source,
            window.sx0,
            window.sy0,
            window.sx1 - window.sx0,
            window.sy1 - window.sy0,
        )
        .to_image();

        let scaled = if region.dimensions() == (dw, dh) {
            region
        } else {
            imageops::resize(&region, dw, dh, self.filter)
        };

        let mut canvas = blank_tile();
        imageops::replace(&mut canvas, &scaled, dx, dy);

        if is_fully_transparent(&canvas) {
            return None;
        }
        Some(canvas)
    }
}
