//! # Imager
//!
//! A small photo manager backend for an e-ink picture frame.
//!
//! Images are uploaded over HTTP, validated against their declared type,
//! stripped of metadata by re-encoding, and stored under an opaque random name
//! in a single directory. Stored images can be listed, deleted, fetched as
//! static files, and pushed to the display by an external executable.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`mod@format`] - Supported file types and magic-byte checks
//! - [`store`] - The `ImageStore` trait and its directory-backed implementation
//! - [`intake`] - Upload validation, re-encoding and persistence
//! - [`display`] - Running the display executable with a timeout
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use imager::{create_router, AppState, ImageReencoder, LocalImageStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(LocalImageStore::new("/data/images"));
//!     let state = AppState::new(store, ImageReencoder::default());
//!     let router = create_router(state, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod format;
pub mod intake;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use display::{resolve_stored_path, DisplayOutput, DisplayRunner};
pub use error::{DisplayError, IntakeError, StoreError};
pub use format::{is_valid_signature, matches_signature, SupportedFileType};
pub use intake::{
    generate_file_name, ImageReencoder, ImageUpload, IntakeService, UploadedImage,
    DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use server::{create_router, AppState, DisplayRequest, ErrorResponse, RouterConfig};
pub use store::{
    validate_file_name, ImageStore, LocalImageStore, StoredImage, STATIC_IMAGES_ROUTE,
};
