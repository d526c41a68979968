//! On-disk tile store.
//!
//! Tiles live in a fixed directory layout under a base directory:
//!
//! ```text
//! <base>/<layer>/ETRS-TM35FIN/<zoom>/<row>/<col>.png
//! ```
//!
//! The store is the durable source of truth. It is written only by the
//! import pipeline ([`TileWriter`]) and read by discovery and the tile
//! service.
//!
//! # Components
//!
//! - [`TileStore`]: Path layout and raw tile reads
//! - [`discover_layers`]: Enumerates layers and their materialized zoom levels
//! - [`TileWriter`]: Writes tiles, compositing over existing ones

mod discovery;
mod writer;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::StoreError;
use crate::grid::{TileCoordinate, GRID_ID};

pub use discovery::{discover_layers, Layer};
pub use writer::TileWriter;

/// File extension of stored tiles.
pub const TILE_EXTENSION: &str = "png";

/// Check that `layer` names exactly one directory below the store root.
///
/// Names must be non-empty, use only `[A-Za-z0-9_.-]` and not start with `.`.
pub fn validate_layer_name(layer: &str) -> Result<(), StoreError> {
    let valid = !layer.is_empty()
        && !layer.starts_with('.')
        && layer
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidLayerName {
            layer: layer.to_string(),
        })
    }
}

/// Path layout of a tile store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct TileStore {
    base: PathBuf,
}

impl TileStore {
    /// Create a store rooted at `base`. The directory need not exist yet.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Base directory of the store.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `<base>/<layer>`
    pub fn layer_dir(&self, layer: &str) -> PathBuf {
        self.base.join(layer)
    }

    /// `<base>/<layer>/ETRS-TM35FIN`
    pub fn projection_dir(&self, layer: &str) -> PathBuf {
        self.layer_dir(layer).join(GRID_ID)
    }

    /// `<base>/<layer>/ETRS-TM35FIN/<zoom>/<row>/<col>.png`
    pub fn tile_path(&self, layer: &str, coord: TileCoordinate) -> PathBuf {
        self.projection_dir(layer)
            .join(coord.zoom.to_string())
            .join(coord.row.to_string())
            .join(format!("{}.{}", coord.col, TILE_EXTENSION))
    }

    /// Read the encoded tile at `coord`.
    ///
    /// Returns `Ok(None)` if no tile file exists. Any other filesystem error
    /// is returned as [`StoreError::Io`].
    pub fn read_tile(&self, layer: &str, coord: TileCoordinate) -> Result<Option<Bytes>, StoreError> {
        let path = self.tile_path(layer, coord);
        match fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}
