//! HTTP server layer.
//!
//! This module provides the HTTP API for serving tiles from the tile store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │          GET /tiles/{layer}/{zoom}/{row}/{col}.png              │
//! │                                                                 │
//! │  ┌───────────────────────────┐  ┌───────────────────────────┐   │
//! │  │         handlers          │  │          routes           │   │
//! │  │ (requests, error mapping) │  │  (router config, CORS)    │   │
//! │  └───────────────────────────┘  └───────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, layers_handler, tile_handler, AppState, ErrorResponse, HandlerError,
    HealthResponse, LayerResponse, LayersResponse, TilePathParams, TILE_SOURCE_HEADER,
};
pub use routes::{create_router, RouterConfig};
