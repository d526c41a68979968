//! World file parsing.
//!
//! A world file is a six-line sidecar giving the affine transform of a
//! raster:
//!
//! ```text
//! line 1: pixel width          (x size of a pixel, > 0)
//! line 2: rotation about y     (must be 0)
//! line 3: rotation about x     (must be 0)
//! line 4: pixel height         (y size of a pixel, < 0 for north-up)
//! line 5: x of the upper-left pixel's center
//! line 6: y of the upper-left pixel's center
//! ```
//!
//! The parsed [`WorldFileData`] stores the outer corner of the first pixel,
//! half a pixel up and to the left of the center the file describes.

use std::fs;
use std::path::Path;

use crate::error::WorldFileError;

/// Extension of the world file accompanying a PNG source image.
pub const WORLD_FILE_EXTENSION: &str = "pgw";

/// Number of leading lines carrying the transform.
const WORLD_FILE_LINES: usize = 6;

/// Valid easting range for the upper-left corner.
const MIN_EASTING: f64 = 43547.79;
const MAX_EASTING: f64 = 764796.72;

/// Valid northing range for the upper-left corner.
const MIN_NORTHING: f64 = 6522236.87;
const MAX_NORTHING: f64 = 7795461.19;

/// Georeferencing of a north-up raster with square pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFileData {
    /// Pixel width in projected units (always positive)
    pub pixel_width: f64,

    /// Pixel height in projected units (always negative)
    pub pixel_height: f64,

    /// Easting of the upper-left corner of the first pixel
    pub ul_corner_x: f64,

    /// Northing of the upper-left corner of the first pixel
    pub ul_corner_y: f64,
}

impl WorldFileData {
    /// Parse world file contents.
    ///
    /// Lines beyond the sixth are ignored, and each line is trimmed before
    /// parsing.
    pub fn parse(contents: &str) -> Result<Self, WorldFileError> {
        let lines: Vec<&str> = contents.lines().take(WORLD_FILE_LINES).collect();
        if lines.len() < WORLD_FILE_LINES {
            return Err(WorldFileError::TooFewLines { found: lines.len() });
        }

        let mut values = [0.0f64; WORLD_FILE_LINES];
        for (index, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            values[index] = trimmed
                .parse::<f64>()
                .map_err(|_| WorldFileError::InvalidNumber {
                    line: index + 1,
                    value: trimmed.to_string(),
                })?;
        }

        let [pixel_width, rotation_y, rotation_x, pixel_height, center_x, center_y] = values;

        if rotation_y != 0.0 || rotation_x != 0.0 {
            return Err(WorldFileError::Rotated {
                rotation_x,
                rotation_y,
            });
        }

        if !(pixel_width > 0.0 && pixel_height < 0.0) {
            return Err(WorldFileError::NotNorthUp {
                pixel_width,
                pixel_height,
            });
        }

        if pixel_width != pixel_height.abs() {
            return Err(WorldFileError::NonSquarePixels {
                pixel_width,
                pixel_height,
            });
        }

        let ul_corner_x = center_x - pixel_width / 2.0;
        let ul_corner_y = center_y - pixel_height / 2.0;

        if !(MIN_EASTING..=MAX_EASTING).contains(&ul_corner_x)
            || !(MIN_NORTHING..=MAX_NORTHING).contains(&ul_corner_y)
        {
            return Err(WorldFileError::CornerOutOfBounds {
                x: ul_corner_x,
                y: ul_corner_y,
            });
        }

        Ok(Self {
            pixel_width,
            pixel_height,
            ul_corner_x,
            ul_corner_y,
        })
    }

    /// Read and parse a world file from disk.
    pub fn from_file(path: &Path) -> Result<Self, WorldFileError> {
        let contents = fs::read_to_string(path).map_err(|e| WorldFileError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&contents)
    }

    /// Projected extent of a raster of `width` × `height` pixels as
    /// `(west, north, east, south)`.
    pub fn extent(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let east = self.ul_corner_x + f64::from(width) * self.pixel_width;
        let south = self.ul_corner_y + f64::from(height) * self.pixel_height;
        (self.ul_corner_x, self.ul_corner_y, east, south)
    }
}

/// Path of the world file that accompanies `image_path`.
pub fn world_file_path(image_path: &Path) -> std::path::PathBuf {
    image_path.with_extension(WORLD_FILE_EXTENSION)
}
