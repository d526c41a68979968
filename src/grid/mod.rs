//! ETRS-TM35FIN tile grid.
//!
//! The grid is a fixed pyramid of 256×256 pixel tiles anchored at a single
//! origin in projected (metre) coordinates. Zoom 0 has a pixel size of
//! 8192 m and every zoom step halves it:
//!
//! ```text
//! zoom   pixel size (m)   tile span (m)
//!  0        8192.0         2 097 152
//! 10           8.0             2 048
//! 14           0.5               128
//! 15           0.25               64
//! ```
//!
//! Rows grow southwards from [`ORIGIN_Y`] and columns grow eastwards from
//! [`ORIGIN_X`].
//!
//! # Example
//!
//! ```
//! use tm35_tiles::grid;
//!
//! assert_eq!(grid::pixel_size(14).unwrap(), 0.5);
//! assert_eq!(grid::column(224000.0, 14).unwrap(), 6035);
//! assert_eq!(grid::row(6678000.0, 14).unwrap(), 13364);
//! ```

pub mod world_file;

use std::fmt;

use crate::error::GridError;

pub use world_file::{world_file_path, WorldFileData, WORLD_FILE_EXTENSION};

/// Identifier of the projection, used as a directory name in the tile store.
pub const GRID_ID: &str = "ETRS-TM35FIN";

/// Easting of the grid origin (west edge of column 0).
pub const ORIGIN_X: f64 = -548576.0;

/// Northing of the grid origin (north edge of row 0).
pub const ORIGIN_Y: f64 = 8388608.0;

/// Tile width and height in pixels.
pub const TILE_SIZE: u32 = 256;

/// Lowest zoom level of the grid.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level of the grid.
pub const MAX_ZOOM: u8 = 15;

/// Pixel size at zoom 0, in projected units.
const ZOOM_ZERO_PIXEL_SIZE: f64 = 8192.0;

/// Absolute tolerance when matching a pixel size against a zoom level.
const PIXEL_SIZE_TOLERANCE: f64 = 0.001;

// =============================================================================
// Tile Coordinates
// =============================================================================

/// Address of a tile within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoordinate {
    pub zoom: u8,
    pub row: u32,
    pub col: u32,
}

impl TileCoordinate {
    pub fn new(zoom: u8, row: u32, col: u32) -> Self {
        Self { zoom, row, col }
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.row, self.col)
    }
}

/// Projected extent of a single tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

impl TileBounds {
    /// Whether the two extents overlap with a non-empty area.
    pub fn intersects(&self, other: &TileBounds) -> bool {
        self.west < other.east
            && other.west < self.east
            && self.south < other.north
            && other.south < self.north
    }
}

// =============================================================================
// Grid Math
// =============================================================================

/// Check that `zoom` is a valid zoom level of the grid.
pub fn validate_zoom(zoom: u8) -> Result<u8, GridError> {
    if zoom > MAX_ZOOM {
        return Err(GridError::ZoomOutOfRange { zoom: zoom as i64 });
    }
    Ok(zoom)
}

/// Size of a single pixel at `zoom`, in projected units.
pub fn pixel_size(zoom: u8) -> Result<f64, GridError> {
    let zoom = validate_zoom(zoom)?;
    Ok(ZOOM_ZERO_PIXEL_SIZE / f64::from(1u32 << zoom))
}

/// Width (and height) of a tile at `zoom`, in projected units.
pub fn tile_span(zoom: u8) -> Result<f64, GridError> {
    Ok(pixel_size(zoom)? * f64::from(TILE_SIZE))
}

/// Column index containing `easting` at `zoom`.
pub fn column(easting: f64, zoom: u8) -> Result<i64, GridError> {
    let span = tile_span(zoom)?;
    Ok(((easting - ORIGIN_X) / span).floor() as i64)
}

/// Row index containing `northing` at `zoom`.
pub fn row(northing: f64, zoom: u8) -> Result<i64, GridError> {
    let span = tile_span(zoom)?;
    Ok(((ORIGIN_Y - northing) / span).floor() as i64)
}

/// Projected extent of the tile at (`zoom`, `row`, `col`).
pub fn tile_bounds(zoom: u8, row: i64, col: i64) -> Result<TileBounds, GridError> {
    let span = tile_span(zoom)?;
    let west = ORIGIN_X + col as f64 * span;
    let north = ORIGIN_Y - row as f64 * span;
    Ok(TileBounds {
        west,
        north,
        east: west + span,
        south: north - span,
    })
}

/// Zoom level whose pixel size equals `pixel_width`.
///
/// Pixel sizes that are not within 0.001 of a grid resolution are rejected
/// rather than rounded to the nearest zoom.
pub fn zoom_level(pixel_width: f64) -> Result<u8, GridError> {
    let unsupported = GridError::UnsupportedPixelSize {
        pixel_size: pixel_width,
    };

    if !pixel_width.is_finite() || pixel_width <= 0.0 {
        return Err(unsupported);
    }

    let zoom = (ZOOM_ZERO_PIXEL_SIZE / pixel_width).log2().round();
    if zoom < f64::from(MIN_ZOOM) || zoom > f64::from(MAX_ZOOM) {
        return Err(unsupported);
    }

    let zoom = zoom as u8;
    let expected = pixel_size(zoom)?;
    if (expected - pixel_width).abs() > PIXEL_SIZE_TOLERANCE {
        return Err(unsupported);
    }

    Ok(zoom)
}

// =============================================================================
// Tests
// =============================================================================
