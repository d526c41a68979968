//! HTTP request handlers for the tile API.
//!
//! This module contains the Axum handlers for serving tiles, layer listings
//! and health checks.
//!
//! # Endpoints
//!
//! - `GET /tiles/{layer}/{zoom}/{row}/{col}.png` - Serve a tile
//! - `GET /layers` - List layers and their zoom levels
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::TileError;
use crate::grid::GRID_ID;
use crate::tile::TileService;

/// Response header naming how the tile was produced.
pub const TILE_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-tile-source");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The tile service for processing tile requests
    pub tile_service: Arc<TileService>,

    /// Cache control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl AppState {
    /// Create a new application state with the given tile service.
    pub fn new(tile_service: TileService) -> Self {
        Self::with_cache_max_age(tile_service, 3600)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(tile_service: TileService, cache_max_age: u32) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/tiles/{layer}/{zoom}/{row}/{filename}`
/// where filename is `{col}` or `{col}.png`
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Layer name
    pub layer: String,

    /// Zoom level (0 = coarsest)
    pub zoom: u8,

    /// Tile row, counted southward from the grid origin
    pub row: u32,

    /// Tile column with optional .png extension (e.g., "200" or "200.png")
    pub filename: String,
}

impl TilePathParams {
    /// Parse the column from the filename, stripping any .png extension.
    pub fn col(&self) -> Result<u32, std::num::ParseIntError> {
        let col_str = self.filename.strip_suffix(".png").unwrap_or(&self.filename);
        col_str.parse()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "tile_not_found", "unknown_layer")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// A layer and the zoom levels it has pre-rendered tiles for.
#[derive(Debug, Serialize)]
pub struct LayerResponse {
    pub name: String,
    pub zoom_levels: Vec<u8>,
}

/// Response from the layers endpoint.
#[derive(Debug, Serialize)]
pub struct LayersResponse {
    /// Grid identifier of every layer
    pub projection: String,

    /// Layers sorted by name
    pub layers: Vec<LayerResponse>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Build a JSON error response, logging by severity:
/// - 5xx errors are logged at ERROR level
/// - 404 is logged at DEBUG level (common and expected)
/// - other 4xx errors are logged at WARN level
fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            message
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let error_response = ErrorResponse::with_status(error_type, message, status);
    (status, Json(error_response)).into_response()
}

/// Convert TileError to HTTP response.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::UnknownLayer { .. } => (StatusCode::BAD_REQUEST, "unknown_layer"),
            TileError::InvalidZoom(_) => (StatusCode::BAD_REQUEST, "invalid_zoom"),
            TileError::TileNotFound { .. } => (StatusCode::NOT_FOUND, "tile_not_found"),
            TileError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            TileError::Worker { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        error_response(status, error_type, self.to_string())
    }
}

/// Errors returned by the tile handler.
#[derive(Debug)]
pub enum HandlerError {
    /// The column segment is not a number
    InvalidColumn { filename: String },

    /// The tile service rejected or failed the request
    Tile(TileError),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::InvalidColumn { filename } => error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                format!("Invalid tile column: {}", filename),
            ),
            HandlerError::Tile(err) => err.into_response(),
        }
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError::Tile(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{layer}/{zoom}/{row}/{col}.png`
///
/// # Path Parameters
///
/// - `layer`: Layer name
/// - `zoom`: Zoom level 0-15
/// - `row`: Tile row
/// - `col`: Tile column, with or without the `.png` extension
///
/// # Response
///
/// - `200 OK`: PNG tile image with `Content-Type: image/png`
/// - `400 Bad Request`: Unknown layer, invalid zoom or malformed coordinates
/// - `404 Not Found`: No pre-rendered or resampled tile exists
/// - `500 Internal Server Error`: Store or processing error
///
/// # Headers
///
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Tile-Source: pre-rendered|resampled`
pub async fn tile_handler(
    State(state): State<AppState>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, HandlerError> {
    // Parse column from filename (handles both "200" and "200.png")
    let col = params.col().map_err(|_| HandlerError::InvalidColumn {
        filename: params.filename.clone(),
    })?;

    let service = Arc::clone(&state.tile_service);
    let TilePathParams {
        layer, zoom, row, ..
    } = params;

    // Disk reads and image scaling block, keep them off the async workers
    let tile = tokio::task::spawn_blocking(move || service.get_tile(&layer, zoom, row, col))
        .await
        .map_err(|e| TileError::Worker {
            message: e.to_string(),
        })??;

    let source = tile.source();
    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (TILE_SOURCE_HEADER, source.as_str().to_string()),
    ];

    Ok((StatusCode::OK, headers, tile.into_data()).into_response())
}

/// Handle layer listing requests.
///
/// # Endpoint
///
/// `GET /layers`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "projection": "ETRS-TM35FIN",
///   "layers": [
///     { "name": "terrain", "zoom_levels": [8, 9, 10] }
///   ]
/// }
/// ```
pub async fn layers_handler(State(state): State<AppState>) -> Json<LayersResponse> {
    let layers = state
        .tile_service
        .layers()
        .values()
        .map(|layer| LayerResponse {
            name: layer.name.clone(),
            zoom_levels: layer.available_zoom_levels.iter().copied().collect(),
        })
        .collect();

    Json(LayersResponse {
        projection: GRID_ID.to_string(),
        layers,
    })
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
