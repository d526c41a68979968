//! Import pipeline integration tests.
//!
//! Tests verify:
//! - Sources are cut along the grid at the zoom of their world file
//! - Overlapping sources composite into existing tiles
//! - Invalid sources are skipped without aborting the batch
//! - Imported layers are discovered and served by the tile service

use std::fs;

use image::{Rgba, RgbaImage};

use tm35_tiles::tile::codec::decode_png;
use tm35_tiles::{
    discover_layers, import_source_paths, RasterImportPipeline, TileCoordinate, TileResult,
    TileService, TileSource,
};

use super::test_utils::{close_to, palette_png, write_source, write_world_file, BLUE, RED};

/// North-west corner of tile (14, 13364, 6035).
const CELL_WEST: f64 = 223904.0;
const CELL_NORTH: f64 = 6678016.0;
const CELL: TileCoordinate = TileCoordinate {
    zoom: 14,
    row: 13364,
    col: 6035,
};

#[test]
fn test_import_aligned_source() {
    let dir = tempfile::tempdir().unwrap();
    let tiles_dir = dir.path().join("tiles");
    let source = RgbaImage::from_fn(256, 256, |x, y| Rgba([x as u8, y as u8, 128, 255]));
    let png = write_source(dir.path(), "sheet", &source, 0.5, CELL_WEST, CELL_NORTH);

    let pipeline = RasterImportPipeline::new(&tiles_dir, "terrain");
    assert_eq!(pipeline.import_file(&png), 1);

    let service = TileService::open(&tiles_dir, 100).unwrap();
    assert!(service.layers()["terrain"].has_zoom(14));

    let tile = service.get_tile("terrain", 14, CELL.row, CELL.col).unwrap();
    assert_eq!(tile.source(), TileSource::PreRendered);

    let img = decode_png(tile.data()).unwrap();
    assert_eq!(img, source);
}

#[test]
fn test_import_indexed_color_source() {
    let dir = tempfile::tempdir().unwrap();
    let tiles_dir = dir.path().join("tiles");
    let palette = [[30, 60, 90], [200, 150, 10]];
    let png = dir.path().join("indexed.png");
    fs::write(&png, palette_png(256, 256, &palette, |x, _| u8::from(x >= 128))).unwrap();
    write_world_file(dir.path(), "indexed", 0.5, CELL_WEST, CELL_NORTH);

    let pipeline = RasterImportPipeline::new(&tiles_dir, "basemap");
    assert_eq!(pipeline.import_file(&png), 1);

    let service = TileService::open(&tiles_dir, 100).unwrap();
    let tile = service.get_tile("basemap", 14, CELL.row, CELL.col).unwrap();
    let img = decode_png(tile.data()).unwrap();

    assert_eq!(img.get_pixel(10, 200), &Rgba([30, 60, 90, 255]));
    assert_eq!(img.get_pixel(250, 5), &Rgba([200, 150, 10, 255]));
}

#[test]
fn test_import_multi_tile_source() {
    let dir = tempfile::tempdir().unwrap();
    let tiles_dir = dir.path().join("tiles");
    let source = RgbaImage::from_pixel(512, 512, RED);
    let png = write_source(dir.path(), "sheet", &source, 0.5, CELL_WEST, CELL_NORTH);

    let pipeline = RasterImportPipeline::new(&tiles_dir, "terrain");
    assert_eq!(pipeline.import_files([&png]), 4);

    let layers = discover_layers(&tiles_dir).unwrap();
    assert_eq!(layers["terrain"].available_zoom_levels.len(), 1);

    let service = TileService::open(&tiles_dir, 100).unwrap();
    for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        let tile = service
            .get_tile("terrain", 14, CELL.row + row, CELL.col + col)
            .unwrap();
        assert!(matches!(tile, TileResult::PreRendered(_)));
    }

    // Zoom 15 is resampled from the imported zoom 14 tiles
    let tile = service.get_tile("terrain", 15, CELL.row * 2, CELL.col * 2).unwrap();
    assert_eq!(tile.source(), TileSource::Resampled);
    let img = decode_png(tile.data()).unwrap();
    assert!(close_to(img.get_pixel(128, 128), &RED));
}

#[test]
fn test_overlapping_sources_composite() {
    let dir = tempfile::tempdir().unwrap();
    let tiles_dir = dir.path().join("tiles");

    let base = RgbaImage::from_pixel(256, 256, RED);
    let overlay = RgbaImage::from_fn(256, 256, |x, _| {
        if x < 128 {
            Rgba([0, 0, 0, 0])
        } else {
            BLUE
        }
    });

    let first = write_source(dir.path(), "base", &base, 0.5, CELL_WEST, CELL_NORTH);
    let second = write_source(dir.path(), "overlay", &overlay, 0.5, CELL_WEST, CELL_NORTH);

    let pipeline = RasterImportPipeline::new(&tiles_dir, "terrain");
    assert_eq!(pipeline.import_files([&first, &second]), 2);

    let service = TileService::open(&tiles_dir, 100).unwrap();
    let tile = service.get_tile("terrain", 14, CELL.row, CELL.col).unwrap();
    let img = decode_png(tile.data()).unwrap();

    assert_eq!(*img.get_pixel(10, 10), RED);
    assert_eq!(*img.get_pixel(200, 10), BLUE);
}

#[test]
fn test_invalid_sources_do_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let tiles_dir = dir.path().join("tiles");
    let opaque = RgbaImage::from_pixel(256, 256, RED);

    // No world file
    let orphan = dir.path().join("orphan.png");
    opaque.save(&orphan).unwrap();

    // Pixel size that is not a zoom level of the grid
    let odd = write_source(dir.path(), "odd", &opaque, 0.3, CELL_WEST, CELL_NORTH);

    // Undecodable image with a valid world file
    let broken = write_source(dir.path(), "broken", &opaque, 0.5, CELL_WEST, CELL_NORTH);
    fs::write(&broken, b"not a png").unwrap();

    let good = write_source(dir.path(), "good", &opaque, 0.5, CELL_WEST, CELL_NORTH);

    let pipeline = RasterImportPipeline::new(&tiles_dir, "terrain");
    assert_eq!(pipeline.import_files([&orphan, &odd, &broken, &good]), 1);
}

#[test]
fn test_fully_transparent_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let tiles_dir = dir.path().join("tiles");
    let empty = RgbaImage::new(256, 256);
    let png = write_source(dir.path(), "empty", &empty, 0.5, CELL_WEST, CELL_NORTH);

    let pipeline = RasterImportPipeline::new(&tiles_dir, "terrain");
    assert_eq!(pipeline.import_file(&png), 0);
    assert!(discover_layers(&tiles_dir).unwrap().is_empty());
}

#[test]
fn test_truncate_then_reimport() {
    let dir = tempfile::tempdir().unwrap();
    let tiles_dir = dir.path().join("tiles");

    let red = write_source(
        dir.path(),
        "red",
        &RgbaImage::from_pixel(256, 256, RED),
        0.5,
        CELL_WEST,
        CELL_NORTH,
    );
    let blue = write_source(
        dir.path(),
        "blue",
        &RgbaImage::from_pixel(256, 256, BLUE),
        0.5,
        CELL_WEST + 1024.0,
        CELL_NORTH,
    );

    let pipeline = RasterImportPipeline::new(&tiles_dir, "terrain");
    pipeline.import_file(&red);
    pipeline.truncate_layer().unwrap();
    pipeline.import_file(&blue);

    let service = TileService::open(&tiles_dir, 100).unwrap();
    assert!(service.get_tile("terrain", 14, CELL.row, CELL.col).is_err());

    let tile = service
        .get_tile("terrain", 14, CELL.row, CELL.col + 8)
        .unwrap();
    assert_eq!(*decode_png(tile.data()).unwrap().get_pixel(0, 0), BLUE);
}

#[test]
fn test_import_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let sources_dir = dir.path().join("sources");
    fs::create_dir_all(sources_dir.join("nested")).unwrap();
    let tiles_dir = dir.path().join("tiles");

    let opaque = RgbaImage::from_pixel(256, 256, RED);
    write_source(&sources_dir, "a", &opaque, 0.5, CELL_WEST, CELL_NORTH);
    write_source(
        &sources_dir.join("nested"),
        "b",
        &opaque,
        0.5,
        CELL_WEST + 128.0,
        CELL_NORTH,
    );

    let sources = import_source_paths([&sources_dir]);
    assert_eq!(sources.len(), 2);

    let pipeline = RasterImportPipeline::new(&tiles_dir, "terrain");
    assert_eq!(pipeline.import_files(&sources), 2);
}
