//! Layer discovery.
//!
//! Scans the tile store for layers and the zoom levels that have at least
//! one tile file on disk. The result is a snapshot taken once, typically at
//! startup.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::StoreError;
use crate::grid::{GRID_ID, MAX_ZOOM, MIN_ZOOM};

use super::TILE_EXTENSION;

/// A layer and the zoom levels materialized for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub available_zoom_levels: BTreeSet<u8>,
}

impl Layer {
    pub fn new(name: impl Into<String>, zooms: impl IntoIterator<Item = u8>) -> Self {
        Self {
            name: name.into(),
            available_zoom_levels: zooms.into_iter().collect(),
        }
    }

    /// Whether tiles exist on disk at `zoom`.
    pub fn has_zoom(&self, zoom: u8) -> bool {
        self.available_zoom_levels.contains(&zoom)
    }
}

/// Discover all layers under `base`.
///
/// A layer is reported only if `<base>/<layer>/ETRS-TM35FIN/` contains at
/// least one zoom directory (named 0-15) holding a tile file. Other entries
/// are ignored. A missing base directory yields no layers.
pub fn discover_layers(base: &Path) -> Result<BTreeMap<String, Layer>, StoreError> {
    let mut layers = BTreeMap::new();

    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %base.display(), "Tile directory does not exist");
            return Ok(layers);
        }
        Err(e) => return Err(StoreError::io(base, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(base, e))?;
        let layer_path = entry.path();
        if !layer_path.is_dir() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %layer_path.display(), "Skipping non UTF-8 directory");
            continue;
        };

        let zooms = discover_zoom_levels(&layer_path.join(GRID_ID))?;
        if zooms.is_empty() {
            debug!(layer = %name, "Skipping directory without tiles");
            continue;
        }

        debug!(layer = %name, zooms = ?zooms, "Discovered layer");
        layers.insert(
            name.clone(),
            Layer {
                name,
                available_zoom_levels: zooms,
            },
        );
    }

    Ok(layers)
}

/// Zoom levels under a projection directory that contain tile files.
fn discover_zoom_levels(projection_dir: &Path) -> Result<BTreeSet<u8>, StoreError> {
    let mut zooms = BTreeSet::new();

    let entries = match fs::read_dir(projection_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(zooms),
        Err(e) => return Err(StoreError::io(projection_dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(projection_dir, e))?;
        let zoom_path = entry.path();
        if !zoom_path.is_dir() {
            continue;
        }

        let zoom = match entry.file_name().to_str().and_then(|s| s.parse::<u8>().ok()) {
            Some(zoom) if (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) => zoom,
            _ => continue,
        };

        if contains_tile(&zoom_path) {
            zooms.insert(zoom);
        }
    }

    Ok(zooms)
}

/// Whether `<zoom_dir>/<row>/<col>.png` exists for any row and column.
fn contains_tile(zoom_dir: &Path) -> bool {
    WalkDir::new(zoom_dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %zoom_dir.display(), "Failed to scan zoom directory: {}", e);
                None
            }
        })
        .any(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(TILE_EXTENSION))
        })
}
