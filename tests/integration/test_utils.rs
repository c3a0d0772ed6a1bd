//! Test utilities for integration tests.
//!
//! This module provides an in-memory image store, multipart request builders,
//! test image generators and fake display executables.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use imager::error::StoreError;
use imager::store::{validate_file_name, ImageStore};
use imager::{create_router, AppState, ImageReencoder, RouterConfig};

// =============================================================================
// In-Memory Image Store
// =============================================================================

/// An image store that keeps files in memory under a fictional directory.
pub struct MemoryImageStore {
    directory: PathBuf,
    files: RwLock<HashMap<String, Bytes>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self {
            directory: PathBuf::from("/memory/images"),
            files: RwLock::new(HashMap::new()),
        }
    }

    pub async fn with_file(self, file_name: &str, data: Vec<u8>) -> Self {
        self.files
            .write()
            .await
            .insert(file_name.to_string(), Bytes::from(data));
        self
    }

    pub async fn get(&self, file_name: &str) -> Option<Bytes> {
        self.files.read().await.get(file_name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

impl Default for MemoryImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    fn directory(&self) -> &Path {
        &self.directory
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.files.read().await.keys().cloned().collect())
    }

    async fn write(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, StoreError> {
        validate_file_name(file_name)?;
        let mut files = self.files.write().await;
        if files.contains_key(file_name) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                file_name.to_string(),
            )));
        }
        files.insert(file_name.to_string(), Bytes::copy_from_slice(data));
        Ok(self.path_of(file_name))
    }

    async fn delete(&self, file_name: &str) -> Result<bool, StoreError> {
        validate_file_name(file_name)?;
        Ok(self.files.write().await.remove(file_name).is_some())
    }

    async fn exists(&self, file_name: &str) -> Result<bool, StoreError> {
        validate_file_name(file_name)?;
        Ok(self.files.read().await.contains_key(file_name))
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a router over `store` with tracing disabled.
pub fn router_for<S: ImageStore + 'static>(store: Arc<S>) -> axum::Router {
    let state = AppState::new(store, ImageReencoder::default());
    create_router(state, RouterConfig::new().with_tracing(false))
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

// =============================================================================
// Multipart Requests
// =============================================================================

const BOUNDARY: &str = "----imager-test-boundary-7MA4YWxkTrZu0gW";

/// Build a `multipart/form-data` body with a single file field.
pub fn multipart_body(field_name: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field_name, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Build a `POST /upload` request carrying `data` in the given field.
pub fn upload_request_with_field(field_name: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field_name, file_name, data)))
        .unwrap()
}

/// Build a `POST /upload` request carrying `data` in the `file` field.
pub fn upload_request(file_name: &str, data: &[u8]) -> Request<Body> {
    upload_request_with_field("file", file_name, data)
}

/// Build a `POST /inky` request with a JSON body.
pub fn display_request(json: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/inky")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

// =============================================================================
// Test Images
// =============================================================================

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

/// Create a test PNG image.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    gradient(width, height)
        .write_with_encoder(PngEncoder::new(&mut buf))
        .unwrap();
    buf
}

/// Create a test JPEG image (JFIF, starts with FF D8 FF E0).
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    gradient(width, height)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 85))
        .unwrap();
    buf
}

/// Create bytes that carry a HEIC `ftyp` header followed by `payload`.
pub fn create_test_heic(payload: &[u8]) -> Vec<u8> {
    let mut data = vec![0x00, 0x00, 0x00, 0x18];
    data.extend_from_slice(b"ftypheic");
    data.extend_from_slice(payload);
    data
}

// =============================================================================
// Fake Display Executables
// =============================================================================

/// Write an executable shell script into `dir` and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
