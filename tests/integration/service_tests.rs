//! Tile service integration tests.
//!
//! Tests verify:
//! - Pre-rendered tiles are returned byte-for-byte
//! - Missing zoom levels are resampled from the nearest coarser level
//! - Cache hits return the stored result without touching the miss counter
//! - Unknown layers, invalid zooms and uncovered tiles are rejected

use image::Rgba;

use tm35_tiles::tile::codec::decode_png;
use tm35_tiles::{TileCoordinate, TileError, TileResult, TileService, TileSource};

use super::test_utils::{
    close_to, quadrant_tile, write_solid_tile, write_tile, BLUE, GREEN, RED, WHITE,
};

// =============================================================================
// Pre-rendered
// =============================================================================

#[test]
fn test_pre_rendered_tile() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_solid_tile(
        dir.path(),
        "terrain",
        TileCoordinate::new(10, 100, 200),
        Rgba([12, 34, 56, 255]),
    );

    let service = TileService::open(dir.path(), 100).unwrap();
    let tile = service.get_tile("terrain", 10, 100, 200).unwrap();

    assert_eq!(tile, TileResult::PreRendered(data));
}

#[test]
fn test_pre_rendered_preferred_over_resampling() {
    let dir = tempfile::tempdir().unwrap();
    write_solid_tile(dir.path(), "terrain", TileCoordinate::new(10, 50, 100), RED);
    let fine = write_solid_tile(dir.path(), "terrain", TileCoordinate::new(11, 100, 200), BLUE);

    let service = TileService::open(dir.path(), 100).unwrap();
    let tile = service.get_tile("terrain", 11, 100, 200).unwrap();

    assert_eq!(tile.source(), TileSource::PreRendered);
    assert_eq!(tile.data(), &fine);
}

// =============================================================================
// Resampling
// =============================================================================

#[test]
fn test_resampled_from_coarser_zoom() {
    let dir = tempfile::tempdir().unwrap();
    write_tile(dir.path(), "terrain", TileCoordinate::new(10, 50, 100), &quadrant_tile());

    let service = TileService::open(dir.path(), 100).unwrap();

    let cases = [
        ((100, 200), RED),
        ((100, 201), GREEN),
        ((101, 200), BLUE),
        ((101, 201), WHITE),
    ];

    for ((row, col), expected) in cases {
        let tile = service.get_tile("terrain", 11, row, col).unwrap();
        assert_eq!(tile.source(), TileSource::Resampled);

        let img = decode_png(tile.data()).unwrap();
        assert_eq!(img.dimensions(), (256, 256));
        assert!(close_to(img.get_pixel(0, 0), &expected));
        assert!(close_to(img.get_pixel(255, 255), &expected));
    }
}

#[test]
fn test_resampling_up_to_three_levels() {
    let dir = tempfile::tempdir().unwrap();
    write_solid_tile(dir.path(), "terrain", TileCoordinate::new(10, 50, 100), GREEN);

    let service = TileService::open(dir.path(), 100).unwrap();

    for zoom in 11..=13u8 {
        let gap = zoom - 10;
        let tile = service
            .get_tile("terrain", zoom, 50 << gap, 100 << gap)
            .unwrap();
        assert_eq!(tile.source(), TileSource::Resampled);
    }

    let result = service.get_tile("terrain", 14, 50 << 4, 100 << 4);
    assert!(matches!(result, Err(TileError::TileNotFound { .. })));
}

#[test]
fn test_resampling_uses_nearest_coarser_zoom() {
    let dir = tempfile::tempdir().unwrap();
    write_solid_tile(dir.path(), "terrain", TileCoordinate::new(8, 12, 25), RED);
    write_solid_tile(dir.path(), "terrain", TileCoordinate::new(10, 50, 100), BLUE);

    let service = TileService::open(dir.path(), 100).unwrap();
    let tile = service.get_tile("terrain", 12, 200, 400).unwrap();

    let img = decode_png(tile.data()).unwrap();
    assert!(close_to(img.get_pixel(128, 128), &BLUE));
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn test_second_request_is_cache_hit() {
    let dir = tempfile::tempdir().unwrap();
    write_tile(dir.path(), "terrain", TileCoordinate::new(10, 50, 100), &quadrant_tile());

    let service = TileService::open(dir.path(), 100).unwrap();

    let first = service.get_tile("terrain", 11, 100, 200).unwrap();
    let after_first = service.cache_stats();
    assert_eq!(after_first.misses, 1);
    assert_eq!(after_first.hits, 0);

    let second = service.get_tile("terrain", 11, 100, 200).unwrap();
    let after_second = service.cache_stats();

    assert_eq!(first.data(), second.data());
    assert_eq!(second.source(), TileSource::Resampled);
    assert_eq!(after_second.hits, after_first.hits + 1);
    assert_eq!(after_second.misses, after_first.misses);
}

#[test]
fn test_cache_survives_file_removal() {
    let dir = tempfile::tempdir().unwrap();
    let coord = TileCoordinate::new(10, 100, 200);
    let data = write_solid_tile(dir.path(), "terrain", coord, RED);

    let service = TileService::open(dir.path(), 100).unwrap();
    service.get_tile("terrain", 10, 100, 200).unwrap();

    std::fs::remove_file(service.store().tile_path("terrain", coord)).unwrap();

    let cached = service.get_tile("terrain", 10, 100, 200).unwrap();
    assert_eq!(cached, TileResult::PreRendered(data));

    service.clear_cache();
    let result = service.get_tile("terrain", 10, 100, 200);
    assert!(matches!(result, Err(TileError::TileNotFound { .. })));
}

#[test]
fn test_cache_capacity_bounds_entries() {
    let dir = tempfile::tempdir().unwrap();
    for col in 0..5 {
        write_solid_tile(dir.path(), "terrain", TileCoordinate::new(10, 0, col), RED);
    }

    let service = TileService::open(dir.path(), 3).unwrap();
    for col in 0..5 {
        service.get_tile("terrain", 10, 0, col).unwrap();
    }

    let stats = service.cache_stats();
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.capacity, 3);
    assert_eq!(stats.misses, 5);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unknown_layer() {
    let dir = tempfile::tempdir().unwrap();
    write_solid_tile(dir.path(), "terrain", TileCoordinate::new(10, 100, 200), RED);

    let service = TileService::open(dir.path(), 100).unwrap();
    assert!(!service.layers().contains_key("orthophoto"));

    let result = service.get_tile("orthophoto", 10, 100, 200);
    assert!(matches!(result, Err(TileError::UnknownLayer { .. })));
}

#[test]
fn test_invalid_zoom() {
    let dir = tempfile::tempdir().unwrap();
    write_solid_tile(dir.path(), "terrain", TileCoordinate::new(10, 100, 200), RED);

    let service = TileService::open(dir.path(), 100).unwrap();
    let result = service.get_tile("terrain", 16, 0, 0);
    assert!(matches!(result, Err(TileError::InvalidZoom(_))));
}

#[test]
fn test_tile_not_found_below_lowest_zoom() {
    let dir = tempfile::tempdir().unwrap();
    write_solid_tile(dir.path(), "terrain", TileCoordinate::new(10, 100, 200), RED);

    let service = TileService::open(dir.path(), 100).unwrap();
    let result = service.get_tile("terrain", 9, 50, 100);

    match result {
        Err(TileError::TileNotFound {
            layer,
            zoom,
            row,
            col,
        }) => {
            assert_eq!(layer, "terrain");
            assert_eq!((zoom, row, col), (9, 50, 100));
        }
        other => panic!("Expected TileNotFound, got {:?}", other),
    }
}

#[test]
fn test_empty_store_has_no_layers() {
    let dir = tempfile::tempdir().unwrap();
    let service = TileService::open(dir.path().join("missing"), 100).unwrap();
    assert!(service.layers().is_empty());
}
