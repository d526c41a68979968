//! Configuration management for the tile server and importer.
//!
//! This module provides the command-line interface:
//! - Command-line arguments via clap
//! - Environment variables with `TM35_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use tm35_tiles::config::{Cli, Command};
//!
//! // Parse from command line and environment
//! let cli = Cli::parse();
//!
//! match cli.into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Import(config) => println!("Importing into {}", config.layer),
//!     Command::Layers(config) => println!("Scanning {}", config.tiles_dir.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! Options can be set via environment variables with the `TM35_` prefix:
//!
//! - `TM35_HOST` - Server bind address (default: 0.0.0.0)
//! - `TM35_PORT` - Server port (default: 3000)
//! - `TM35_TILES_DIR` - Root directory of the tile store (required)
//! - `TM35_CACHE_TILES` - Max tiles to cache (default: 10000)
//! - `TM35_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `TM35_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `TM35_LAYER` - Target layer of an import

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::store;
use crate::tile::DEFAULT_TILE_CACHE_CAPACITY;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// TM35 Tiles - A tile server for the ETRS-TM35FIN map grid.
///
/// Imports georeferenced rasters into a pre-rendered tile pyramid and serves
/// the tiles over HTTP, resampling missing zoom levels on the fly.
#[derive(Parser, Debug, Clone)]
#[command(name = "tm35-tiles")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Consume the parsed arguments and return the selected subcommand.
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve tiles over HTTP.
    Serve(ServeConfig),

    /// Import georeferenced PNG rasters into a layer.
    Import(ImportConfig),

    /// List discovered layers and their zoom levels as JSON.
    Layers(LayersConfig),
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TM35_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TM35_PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Root directory of the tile store.
    #[arg(long, env = "TM35_TILES_DIR")]
    pub tiles_dir: PathBuf,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Maximum number of encoded tiles to cache.
    #[arg(long, default_value_t = DEFAULT_TILE_CACHE_CAPACITY, env = "TM35_CACHE_TILES")]
    pub cache_tiles: usize,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TM35_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TM35_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_dir.as_os_str().is_empty() {
            return Err("Tile directory is required. Set --tiles-dir or TM35_TILES_DIR".to_string());
        }

        if !self.tiles_dir.is_dir() {
            return Err(format!(
                "Tile directory does not exist: {}",
                self.tiles_dir.display()
            ));
        }

        if self.cache_tiles == 0 {
            return Err("cache_tiles must be greater than 0".to_string());
        }

        if let Some(ref origins) = self.cors_origins {
            if origins.iter().any(|origin| origin.trim().is_empty()) {
                return Err("cors_origins must not contain empty entries".to_string());
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Import
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ImportConfig {
    /// Root directory of the tile store.
    #[arg(long, env = "TM35_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Layer to import into.
    #[arg(long, env = "TM35_LAYER")]
    pub layer: String,

    /// Delete the layer's existing tiles before importing.
    #[arg(long, default_value_t = false)]
    pub truncate: bool,

    /// Source PNG files, or directories searched recursively for them.
    ///
    /// Each PNG needs a `.pgw` world file next to it.
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ImportConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_dir.as_os_str().is_empty() {
            return Err("Tile directory is required. Set --tiles-dir or TM35_TILES_DIR".to_string());
        }

        validate_layer_name(&self.layer)?;

        if self.sources.is_empty() {
            return Err("At least one source file or directory is required".to_string());
        }

        if let Some(missing) = self.sources.iter().find(|source| !source.exists()) {
            return Err(format!("Source does not exist: {}", missing.display()));
        }

        Ok(())
    }
}

/// A layer name becomes a directory under the tile store root.
fn validate_layer_name(layer: &str) -> Result<(), String> {
    if layer.is_empty() {
        return Err("Layer name is required. Set --layer or TM35_LAYER".to_string());
    }

    store::validate_layer_name(layer).map_err(|e| e.to_string())
}

// =============================================================================
// Layers
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct LayersConfig {
    /// Root directory of the tile store.
    #[arg(long, env = "TM35_TILES_DIR")]
    pub tiles_dir: PathBuf,
}

impl LayersConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tiles_dir.as_os_str().is_empty() {
            return Err("Tile directory is required. Set --tiles-dir or TM35_TILES_DIR".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
