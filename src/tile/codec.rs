//! PNG tile codec.
//!
//! Tiles are stored and served as 256×256 RGBA PNGs. This module wraps the
//! `image` crate for decoding stored tiles, encoding composited or resampled
//! rasters, and a few canvas helpers shared by the import and serve paths.

use std::io::Cursor;

use bytes::Bytes;
use image::{ImageFormat, ImageReader, RgbaImage};

use crate::error::StoreError;
use crate::grid::TILE_SIZE;

/// PNG file signature.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Decode PNG bytes into an RGBA raster.
///
/// Palette, grayscale and RGB images are expanded to RGBA.
pub fn decode_png(data: &[u8]) -> Result<RgbaImage, StoreError> {
    let reader = ImageReader::with_format(Cursor::new(data), ImageFormat::Png);

    let img = reader.decode().map_err(|e| StoreError::Decode {
        message: e.to_string(),
    })?;

    Ok(img.to_rgba8())
}

/// Encode an RGBA raster as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Bytes, StoreError> {
    let mut output = Cursor::new(Vec::new());

    img.write_to(&mut output, ImageFormat::Png)
        .map_err(|e| StoreError::Encode {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output.into_inner()))
}

/// Check whether `data` starts with the PNG signature.
#[inline]
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// A fully transparent tile-sized canvas.
pub fn blank_tile() -> RgbaImage {
    RgbaImage::new(TILE_SIZE, TILE_SIZE)
}

/// Whether every pixel of `img` has zero alpha.
pub fn is_fully_transparent(img: &RgbaImage) -> bool {
    img.pixels().all(|p| p[3] == 0)
}
