//! TM35 Tiles - A tile server for the ETRS-TM35FIN map grid.
//!
//! This binary runs the HTTP server, the raster importer and the layer
//! listing.

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tm35_tiles::{
    config::{Cli, Command, ImportConfig, LayersConfig, ServeConfig},
    discover_layers, import_source_paths,
    server::{create_router, LayerResponse, LayersResponse, RouterConfig},
    tile::TileService,
    RasterImportPipeline, GRID_ID,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Import(config) => run_import(config),
        Command::Layers(config) => run_layers(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("TM35 Tiles v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Tile directory: {}", config.tiles_dir.display());
    info!(
        "  Cache: {} tiles, max-age {}s",
        config.cache_tiles, config.cache_max_age
    );

    let tile_service = match TileService::open(&config.tiles_dir, config.cache_tiles) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to open tile store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if tile_service.layers().is_empty() {
        warn!("No layers found in {}", config.tiles_dir.display());
    }
    for layer in tile_service.layers().values() {
        info!(
            layer = %layer.name,
            zoom_levels = ?layer.available_zoom_levels,
            "Discovered layer"
        );
    }

    let router = create_router(tile_service, build_router_config(&config));
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Import Command
// =============================================================================

fn run_import(config: ImportConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let pipeline = RasterImportPipeline::new(&config.tiles_dir, &config.layer);

    if config.truncate {
        if let Err(e) = pipeline.truncate_layer() {
            error!("Failed to truncate layer {}: {}", config.layer, e);
            return ExitCode::FAILURE;
        }
    }

    let sources = import_source_paths(&config.sources);
    if sources.is_empty() {
        warn!("No source images found");
    }

    let started = Instant::now();
    let tiles = pipeline.import_files(&sources);

    println!(
        "Imported {} tile(s) from {} source(s) into layer '{}' in {:.1}s",
        tiles,
        sources.len(),
        config.layer,
        started.elapsed().as_secs_f64()
    );

    ExitCode::SUCCESS
}

// =============================================================================
// Layers Command
// =============================================================================

fn run_layers(config: LayersConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let layers = match discover_layers(&config.tiles_dir) {
        Ok(layers) => layers,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let response = LayersResponse {
        projection: GRID_ID.to_string(),
        layers: layers
            .into_values()
            .map(|layer| LayerResponse {
                name: layer.name,
                zoom_levels: layer.available_zoom_levels.into_iter().collect(),
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&response) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tm35_tiles=debug,tower_http=debug"
    } else {
        "tm35_tiles=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
