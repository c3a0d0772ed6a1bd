//! Upload intake layer.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             IntakeService               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  Signature   │  │  ImageReencoder │  │
//! │  │  validator   │  │  (decode →      │  │
//! │  │              │  │   encode)       │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ImageStore                 │
//! └─────────────────────────────────────────┘
//! ```
//!
//! - [`IntakeService`]: validates and persists one upload
//! - [`ImageReencoder`]: strips metadata by decoding and re-encoding
//! - [`ImageUpload`] / [`UploadedImage`]: input and result of an intake

mod encoder;
mod service;

pub use encoder::{ImageReencoder, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY};
pub use service::{generate_file_name, ImageUpload, IntakeService, UploadedImage};
