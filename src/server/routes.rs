//! Router configuration for Imager.
//!
//! This module defines the HTTP routes and applies middleware for body limits,
//! CORS and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                    - Health check
//! /images                    - List stored images (GET)
//! /images/{file}             - Delete a stored image (DELETE)
//! /upload                    - Upload an image (POST, multipart)
//! /inky                      - Display a stored image (POST, only with a display executable)
//! /static/images/{file}      - Stored image files (read-only)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use imager::server::{create_router, AppState, RouterConfig};
//! use imager::{ImageReencoder, LocalImageStore};
//!
//! let store = Arc::new(LocalImageStore::new("/data/images"));
//! let state = AppState::new(store, ImageReencoder::default());
//!
//! let router = create_router(state, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_image_handler, display_handler, health_handler, list_images_handler, upload_handler,
    AppState,
};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::store::{ImageStore, STATIC_IMAGES_ROUTE};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - Request bodies are limited to 50 MiB
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the maximum request body size in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The display route is only mounted when `state` carries a display runner;
/// without one, `POST /inky` answers 404 like any unknown route.
pub fn create_router<S>(state: AppState<S>, config: RouterConfig) -> Router
where
    S: ImageStore + 'static,
{
    let static_files = ServeDir::new(state.store.directory());
    let display_enabled = state.display.is_some();

    let mut api = Router::new()
        .route("/health", get(health_handler))
        .route("/images", get(list_images_handler::<S>))
        .route("/images/{file}", delete(delete_image_handler::<S>))
        .route("/upload", post(upload_handler::<S>));

    if display_enabled {
        api = api.route("/inky", post(display_handler::<S>));
    }

    let router = api
        .with_state(state)
        .nest_service(STATIC_IMAGES_ROUTE, static_files)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([http::header::LOCATION])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
