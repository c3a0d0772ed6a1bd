//! HTTP server layer for Imager.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │    GET /images · POST /upload · DELETE /images/{file}           │
//! │    POST /inky · GET /static/images/{file} · GET /health         │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (requests, error → JSON) │  │ (CORS, body limit, tracing) │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    delete_image_handler, display_handler, health_handler, list_images_handler, upload_handler,
    AppState, DisplayRequest, ErrorResponse, HealthResponse, UPLOAD_FIELD,
};
pub use routes::{create_router, RouterConfig};
