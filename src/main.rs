//! Imager - a photo manager backend for an e-ink picture frame.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imager::{
    config::Config,
    server::{create_router, AppState, RouterConfig},
    DisplayRunner, ImageReencoder, ImageStore, LocalImageStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    run_serve(config).await
}

async fn run_serve(config: Config) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let directory = match config.prepare_directory() {
        Ok(directory) => directory,
        Err(e) => {
            error!(
                "Failed to prepare storage directory {}: {}",
                config.directory.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    info!("Imager v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Storage directory: {}", directory.display());
    info!("  JPEG quality: {}", config.jpeg_quality);
    info!("  Max upload size: {}KB", config.max_upload_size / 1024);

    let store = Arc::new(LocalImageStore::new(directory));
    match store.list().await {
        Ok(names) => info!("  Found {} stored image(s)", names.len()),
        Err(e) => {
            error!("Storage directory is not readable: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let mut state = AppState::new(store, ImageReencoder::new(config.jpeg_quality));

    match &config.inky_executable {
        Some(program) => {
            info!(
                "  Display: {} (timeout {}s)",
                program.display(),
                config.inky_timeout
            );
            state = state.with_display(DisplayRunner::new(program, config.inky_timeout()));
        }
        None => {
            warn!("  Display: DISABLED - no executable configured, POST /inky is not served");
            warn!("           Enable with --inky-executable=<path>");
        }
    }

    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/images", addr);
    info!("    curl -F file=@photo.jpg http://{}/upload", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "imager=debug,tower_http=debug"
    } else {
        "imager=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_max_upload_bytes(config.max_upload_size)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
