//! Tile writer.
//!
//! Persists extracted tiles for one layer. When a tile already exists at
//! the target path, the new raster is alpha-composited over it so that
//! overlapping source images accumulate instead of overwriting each other.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::{imageops, RgbaImage};

use crate::error::StoreError;
use crate::grid::TileCoordinate;
use crate::tile::codec::{blank_tile, decode_png, encode_png};

use super::{validate_layer_name, TileStore};

/// Writes tiles of a single layer into a [`TileStore`].
#[derive(Debug, Clone)]
pub struct TileWriter {
    store: TileStore,
    layer: String,
}

impl TileWriter {
    pub fn new(store: TileStore, layer: impl Into<String>) -> Self {
        Self {
            store,
            layer: layer.into(),
        }
    }

    /// Layer this writer targets.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Root directory of the layer, `<base>/<layer>`.
    pub fn layer_root(&self) -> PathBuf {
        self.store.layer_dir(&self.layer)
    }

    /// Write `raster` at `coord`, compositing over any existing tile.
    ///
    /// Returns the path of the written file.
    pub fn write(&self, coord: TileCoordinate, raster: &RgbaImage) -> Result<PathBuf, StoreError> {
        validate_layer_name(&self.layer)?;
        let path = self.store.tile_path(&self.layer, coord);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let encoded = match read_existing(&path)? {
            Some(existing) => {
                let mut canvas = blank_tile();
                imageops::replace(&mut canvas, &existing, 0, 0);
                imageops::overlay(&mut canvas, raster, 0, 0);
                encode_png(&canvas)?
            }
            None => encode_png(raster)?,
        };

        fs::write(&path, &encoded).map_err(|e| StoreError::io(&path, e))?;
        Ok(path)
    }
}

/// Decode the tile currently stored at `path`, if any.
fn read_existing(path: &Path) -> Result<Option<RgbaImage>, StoreError> {
    match fs::read(path) {
        Ok(data) => decode_png(&data).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
