//! Raster import pipeline.
//!
//! Builds a layer's tile pyramid from georeferenced PNG sources. Each source
//! is imported independently: a missing or invalid world file, an
//! undecodable image or a failed tile write skips that file only, and the
//! batch carries on with the next one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::{ImageReader, RgbaImage};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{ImportError, StoreError};
use crate::grid::{self, world_file_path, WorldFileData};
use crate::store::{validate_layer_name, TileStore, TileWriter, TILE_EXTENSION};

use super::extractor::TileExtractor;

/// Imports source rasters into one layer of a tile store.
#[derive(Debug, Clone)]
pub struct RasterImportPipeline {
    writer: TileWriter,
    extractor: TileExtractor,
}

impl RasterImportPipeline {
    /// Create a pipeline writing into `<base_dir>/<layer>`.
    pub fn new(base_dir: impl Into<PathBuf>, layer: impl Into<String>) -> Self {
        Self {
            writer: TileWriter::new(TileStore::new(base_dir), layer),
            extractor: TileExtractor::new(),
        }
    }

    /// Use a custom extractor (e.g. a different scaling filter).
    pub fn with_extractor(mut self, extractor: TileExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Layer this pipeline writes into.
    pub fn layer(&self) -> &str {
        self.writer.layer()
    }

    /// Import a single source image and return the number of tiles written.
    ///
    /// Failures are logged and reported as zero tiles.
    pub fn import_file(&self, path: &Path) -> usize {
        let started = Instant::now();

        match self.try_import_file(path) {
            Ok(tiles) => {
                info!(
                    layer = self.layer(),
                    path = %path.display(),
                    tiles,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Imported source image"
                );
                tiles
            }
            Err(e @ (ImportError::MissingWorldFile { .. }
            | ImportError::WorldFile(_)
            | ImportError::Grid(_))) => {
                warn!(path = %path.display(), "Skipping source image: {}", e);
                0
            }
            Err(e) => {
                error!(path = %path.display(), "Failed to import source image: {}", e);
                0
            }
        }
    }

    /// Import source images in order and return the total tiles written.
    ///
    /// Where sources overlap, later files are composited over earlier ones.
    pub fn import_files<I, P>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut files = 0usize;
        let mut total = 0usize;

        for path in paths {
            files += 1;
            total += self.import_file(path.as_ref());
        }

        info!(layer = self.layer(), files, tiles = total, "Import finished");
        total
    }

    /// Delete every tile of the layer. A missing layer is not an error.
    ///
    /// Fails with [`StoreError::InvalidLayerName`] before touching the disk
    /// if the layer name does not resolve to its own directory.
    pub fn truncate_layer(&self) -> Result<(), StoreError> {
        validate_layer_name(self.layer())?;
        let root = self.writer.layer_root();
        match fs::remove_dir_all(&root) {
            Ok(()) => {
                info!(layer = self.layer(), path = %root.display(), "Truncated layer");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(layer = self.layer(), "Layer does not exist, nothing to truncate");
                Ok(())
            }
            Err(e) => Err(StoreError::io(root, e)),
        }
    }

    fn try_import_file(&self, path: &Path) -> Result<usize, ImportError> {
        let world_path = world_file_path(path);
        if !world_path.is_file() {
            return Err(ImportError::MissingWorldFile { path: world_path });
        }

        let world = WorldFileData::from_file(&world_path)?;
        let zoom = grid::zoom_level(world.pixel_width)?;
        debug!(path = %path.display(), zoom, "Resolved zoom level from world file");

        let source = decode_source(path)?;

        self.extractor
            .extract(&source, &world, zoom, |tile| -> Result<(), ImportError> {
                self.writer.write(tile.coord, &tile.image)?;
                Ok(())
            })
    }
}

/// Decode a source image into RGBA, whatever its stored color type.
fn decode_source(path: &Path) -> Result<RgbaImage, ImportError> {
    let decode_error = |message: String| ImportError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_error(e.to_string()))?;

    // Source sheets can exceed the decoder's default allocation limit
    reader.no_limits();

    let img = reader.decode().map_err(|e| decode_error(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Expand files and directories into the list of source images to import.
///
/// Directories contribute every `*.png` file below them, sorted by path so
/// the composite order is reproducible. Files are kept as given.
pub fn import_source_paths<I, P>(inputs: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut sources = Vec::new();

    for input in inputs {
        let input = input.as_ref();
        if !input.is_dir() {
            sources.push(input.to_path_buf());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(path = %input.display(), "Failed to scan source directory: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(TILE_EXTENSION))
            })
            .collect();

        found.sort();
        sources.extend(found);
    }

    sources
}
