use std::path::PathBuf;

use thiserror::Error;

/// Errors from tile grid coordinate math
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Zoom level outside the grid's supported range
    #[error("Zoom level out of range: {zoom} (valid range: 0-15)")]
    ZoomOutOfRange { zoom: i64 },

    /// Pixel size that does not correspond to any zoom level of the grid
    #[error("Unsupported pixel size: {pixel_size} does not match any zoom level")]
    UnsupportedPixelSize { pixel_size: f64 },
}

/// Errors raised while reading or validating a world file
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldFileError {
    /// The world file could not be read from disk
    #[error("Failed to read world file {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Fewer than the six required lines
    #[error("World file too short: expected 6 lines, got {found}")]
    TooFewLines { found: usize },

    /// A field is not a floating-point number
    #[error("Invalid number on line {line}: {value:?}")]
    InvalidNumber { line: usize, value: String },

    /// Rotation terms are not zero
    #[error("Rotated world files are not supported: rotation x = {rotation_x}, rotation y = {rotation_y}")]
    Rotated { rotation_x: f64, rotation_y: f64 },

    /// Raster is not north-up (pixel width must be positive, height negative)
    #[error("Raster is not north-up: pixel width = {pixel_width}, pixel height = {pixel_height}")]
    NotNorthUp { pixel_width: f64, pixel_height: f64 },

    /// Pixel width and height magnitudes differ
    #[error("Pixels are not square: width = {pixel_width}, height = {pixel_height}")]
    NonSquarePixels { pixel_width: f64, pixel_height: f64 },

    /// Upper-left corner lies outside the ETRS-TM35FIN bounds
    #[error("Corner ({x}, {y}) is outside the ETRS-TM35FIN bounds")]
    CornerOutOfBounds { x: f64, y: f64 },
}

/// Errors from the on-disk tile store and PNG codec
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("I/O error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Tile data is not a decodable PNG
    #[error("Failed to decode tile: {message}")]
    Decode { message: String },

    /// Tile could not be encoded as PNG
    #[error("Failed to encode tile: {message}")]
    Encode { message: String },

    /// Layer name does not map to a single directory under the store root
    #[error("Invalid layer name '{layer}': use letters, digits, '_', '-' or '.'")]
    InvalidLayerName { layer: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Errors that abort the import of a single source file
#[derive(Debug, Clone, Error)]
pub enum ImportError {
    /// No sibling world file next to the source image
    #[error("Missing world file: {path}")]
    MissingWorldFile { path: PathBuf },

    /// The world file is malformed or unsupported
    #[error("Invalid world file: {0}")]
    WorldFile(#[from] WorldFileError),

    /// The pixel size does not map onto the tile grid
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// The source image could not be decoded
    #[error("Failed to decode source image {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Writing a tile failed
    #[error("Tile store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised when constructing a tile cache
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Capacity must be at least one entry
    #[error("Cache capacity must be greater than 0")]
    ZeroCapacity,
}

/// Errors raised while opening a tile service over a tile store
#[derive(Debug, Clone, Error)]
pub enum OpenError {
    #[error("Invalid cache configuration: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to discover layers: {0}")]
    Discovery(#[from] StoreError),
}

/// Errors returned by the tile service
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The layer was not discovered in the tile store
    #[error("Unknown layer: {layer}")]
    UnknownLayer { layer: String },

    /// Neither a pre-rendered nor a resampled tile exists
    #[error("Tile not found: {layer}/{zoom}/{row}/{col}")]
    TileNotFound {
        layer: String,
        zoom: u8,
        row: u32,
        col: u32,
    },

    /// Requested zoom is outside the grid
    #[error("Invalid zoom: {0}")]
    InvalidZoom(#[from] GridError),

    /// Tile store failure while reading or decoding
    #[error("Tile store error: {0}")]
    Store(#[from] StoreError),

    /// Blocking worker executing the request failed
    #[error("Tile worker failed: {message}")]
    Worker { message: String },
}
