//! Test utilities for integration tests.
//!
//! Provides helpers to build tile stores and georeferenced sources on disk.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::{Rgba, RgbaImage};

use tm35_tiles::tile::codec::encode_png;
use tm35_tiles::{TileCoordinate, TileStore};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A 256×256 tile with four solid quadrants: red, green / blue, white.
pub fn quadrant_tile() -> RgbaImage {
    RgbaImage::from_fn(256, 256, |x, y| match (x < 128, y < 128) {
        (true, true) => RED,
        (false, true) => GREEN,
        (true, false) => BLUE,
        (false, false) => WHITE,
    })
}

/// Write a pre-rendered tile into the store and return its encoded bytes.
pub fn write_tile(base: &Path, layer: &str, coord: TileCoordinate, img: &RgbaImage) -> Bytes {
    let path = TileStore::new(base).tile_path(layer, coord);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let data = encode_png(img).unwrap();
    fs::write(&path, &data).unwrap();
    data
}

/// Write a solid-color pre-rendered tile.
pub fn write_solid_tile(base: &Path, layer: &str, coord: TileCoordinate, color: Rgba<u8>) -> Bytes {
    write_tile(base, layer, coord, &RgbaImage::from_pixel(256, 256, color))
}

/// Write `<dir>/<name>.png` with a world file placing its top-left pixel
/// corner at (`west`, `north`).
pub fn write_source(
    dir: &Path,
    name: &str,
    img: &RgbaImage,
    pixel_size: f64,
    west: f64,
    north: f64,
) -> PathBuf {
    let png = dir.join(format!("{}.png", name));
    img.save(&png).unwrap();
    write_world_file(dir, name, pixel_size, west, north);

    png
}

/// Write `<dir>/<name>.pgw` placing the top-left pixel corner at
/// (`west`, `north`).
pub fn write_world_file(dir: &Path, name: &str, pixel_size: f64, west: f64, north: f64) {
    // World files carry the center of the top-left pixel
    let half = pixel_size / 2.0;
    let world = format!(
        "{}\n0.0\n0.0\n{}\n{}\n{}\n",
        pixel_size,
        -pixel_size,
        west + half,
        north - half
    );
    fs::write(dir.join(format!("{}.pgw", name)), world).unwrap();
}

/// Encode an 8-bit indexed-color PNG.
///
/// `index` maps each pixel to an entry of `palette`. Image data is stored
/// in uncompressed deflate blocks.
pub fn palette_png(
    width: u32,
    height: u32,
    palette: &[[u8; 3]],
    index: impl Fn(u32, u32) -> u8,
) -> Vec<u8> {
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // Bit depth 8, color type 3 (indexed), default compression, filter, no interlace
    ihdr.extend_from_slice(&[8, 3, 0, 0, 0]);

    let plte: Vec<u8> = palette.iter().flatten().copied().collect();

    let mut raw = Vec::with_capacity(((width + 1) * height) as usize);
    for y in 0..height {
        raw.push(0);
        raw.extend((0..width).map(|x| index(x, y)));
    }

    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    push_chunk(&mut png, b"IHDR", &ihdr);
    push_chunk(&mut png, b"PLTE", &plte);
    push_chunk(&mut png, b"IDAT", &zlib_stored(&raw));
    push_chunk(&mut png, b"IEND", &[]);
    png
}

fn push_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);
    let crc = crc32(kind.iter().chain(data));
    png.extend_from_slice(&crc.to_be_bytes());
}

/// Wrap `data` in a zlib stream of stored deflate blocks.
fn zlib_stored(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0x78, 0x01];
    let mut blocks = data.chunks(u16::MAX as usize).peekable();
    while let Some(block) = blocks.next() {
        let last = blocks.peek().is_none();
        out.push(u8::from(last));
        let len = block.len() as u16;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(block);
    }
    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
}

fn crc32<'a>(bytes: impl IntoIterator<Item = &'a u8>) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

fn adler32(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + byte as u32) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

/// Check whether every channel differs by at most 15.
pub fn close_to(actual: &Rgba<u8>, expected: &Rgba<u8>) -> bool {
    actual
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, e)| (*a as i16 - *e as i16).abs() <= 15)
}

/// Validate PNG signature.
pub fn is_valid_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}
