//! HTTP request handlers for the Imager API.
//!
//! # Endpoints
//!
//! - `GET /images` - List stored images
//! - `POST /upload` - Upload an image (multipart field `file`)
//! - `DELETE /images/{file}` - Delete a stored image
//! - `POST /inky` - Show a stored image on the e-ink display
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::display::DisplayRunner;
use crate::error::{DisplayError, IntakeError, StoreError};
use crate::intake::{ImageReencoder, ImageUpload, IntakeService, UploadedImage};
use crate::store::{ImageStore, StoredImage};

/// Multipart field that carries the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: ImageStore> {
    /// Upload pipeline writing into `store`
    pub intake: Arc<IntakeService<S>>,

    /// The image store
    pub store: Arc<S>,

    /// Display runner, if a display executable is configured
    pub display: Option<Arc<DisplayRunner>>,
}

impl<S: ImageStore> AppState<S> {
    /// Create a new application state around `store`.
    pub fn new(store: Arc<S>, encoder: ImageReencoder) -> Self {
        Self {
            intake: Arc::new(IntakeService::new(Arc::clone(&store), encoder)),
            store,
            display: None,
        }
    }

    /// Enable the display endpoint.
    pub fn with_display(mut self, runner: DisplayRunner) -> Self {
        self.display = Some(Arc::new(runner));
        self
    }
}

impl<S: ImageStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
            store: Arc::clone(&self.store),
            display: self.display.clone(),
        }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of a display request.
///
/// Accepts either a bare JSON string or `{ "filePath": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DisplayRequest {
    /// `"/data/images/x.png"`
    Path(String),

    /// `{ "filePath": "/data/images/x.png" }`
    Object {
        #[serde(rename = "filePath")]
        file_path: String,
    },
}

impl DisplayRequest {
    /// The requested image path.
    pub fn file_path(&self) -> &str {
        match self {
            DisplayRequest::Path(path) => path,
            DisplayRequest::Object { file_path } => file_path,
        }
    }
}

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "unsupported_file_type")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

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

// =============================================================================
// Error Mapping
// =============================================================================

/// Log an error by severity and build the JSON error response.
///
/// - 5xx errors are logged at ERROR level with the internal detail
/// - 404s are logged at DEBUG level
/// - other 4xx errors are logged at WARN level
fn error_response(
    status: StatusCode,
    error_type: &str,
    message: &str,
    detail: &dyn std::fmt::Display,
) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            detail
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            detail
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            detail
        );
    }

    let body = ErrorResponse::with_status(error_type, message, status);
    (status, Json(body)).into_response()
}

/// Convert IntakeError to HTTP response.
///
/// Client mistakes get a short fixed message; processing and storage failures
/// are reported generically and only logged in detail.
impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            IntakeError::EmptyUpload => (
                StatusCode::BAD_REQUEST,
                "empty_upload",
                "No file uploaded.".to_string(),
            ),
            IntakeError::Malformed { message } => (
                StatusCode::BAD_REQUEST,
                "malformed_upload",
                format!("Malformed upload: {}", message),
            ),
            IntakeError::TooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "upload_too_large",
                "Uploaded file is too large.".to_string(),
            ),
            IntakeError::UnsupportedFileType { .. } | IntakeError::SignatureMismatch { .. } => (
                StatusCode::BAD_REQUEST,
                "unsupported_file_type",
                "Unsupported file type.".to_string(),
            ),
            IntakeError::Decode { .. } | IntakeError::Encode { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "processing_error",
                "Failed to process uploaded image.".to_string(),
            ),
            IntakeError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "Failed to store uploaded image.".to_string(),
            ),
        };

        error_response(status, error_type, &message, &self)
    }
}

/// Convert StoreError to HTTP response.
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            StoreError::InvalidName(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_file_name",
                "Invalid file name.",
            ),
            StoreError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "Storage error.",
            ),
        };

        error_response(status, error_type, message, &self)
    }
}

/// Convert DisplayError to HTTP response.
///
/// Anything other than a missing image is a single fixed server error; the
/// executable's output never reaches the client.
impl IntoResponse for DisplayError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            DisplayError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "not_found", "Image not found.")
            }
            DisplayError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "display_not_configured",
                "No display executable configured.",
            ),
            DisplayError::Spawn { .. }
            | DisplayError::ExitStatus { .. }
            | DisplayError::Timeout { .. }
            | DisplayError::Wait { .. }
            | DisplayError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "display_error",
                "Failed to update inky display",
            ),
        };

        error_response(status, error_type, message, &self)
    }
}

fn multipart_error(err: MultipartError) -> IntakeError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::TooLarge {
            message: err.body_text(),
        }
    } else {
        IntakeError::Malformed {
            message: err.body_text(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image listing requests.
///
/// # Endpoint
///
/// `GET /images`
///
/// # Response
///
/// `200 OK` with a JSON array, in no particular order:
/// ```json
/// [
///   {
///     "filePath": "/data/images/3f2a...c1.png",
///     "url": "/static/images/3f2a...c1.png",
///     "fileNameWithExtension": "3f2a...c1.png"
///   }
/// ]
/// ```
pub async fn list_images_handler<S: ImageStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<StoredImage>>, StoreError> {
    let directory = state.store.directory();
    let images = state
        .store
        .list()
        .await?
        .iter()
        .map(|name| StoredImage::from_name(directory, name))
        .collect::<Vec<_>>();

    debug!(count = images.len(), "Listed stored images");

    Ok(Json(images))
}

/// Handle image uploads.
///
/// # Endpoint
///
/// `POST /upload` with a `multipart/form-data` body whose `file` field holds
/// the image. Only the extension of the client file name is used.
///
/// # Response
///
/// - `201 Created` with `Location: /images/{fileName}` and JSON body
///   `{ "fileName": "...", "size": 1234 }`
/// - `400 Bad Request`: no file, unsupported type, or mismatched content
/// - `413 Payload Too Large`: body exceeds the upload limit
/// - `500 Internal Server Error`: decode, encode, or storage failure
pub async fn upload_handler<S: ImageStore>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<Response, IntakeError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some(ImageUpload::new(file_name, data));
        break;
    }

    let upload = upload.ok_or(IntakeError::EmptyUpload)?;
    let uploaded: UploadedImage = state.intake.accept(upload).await?;

    let location = format!("/images/{}", uploaded.file_name);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(uploaded),
    )
        .into_response())
}

/// Handle image deletion.
///
/// # Endpoint
///
/// `DELETE /images/{file}`
///
/// # Response
///
/// - `204 No Content` whether or not the file existed
/// - `400 Bad Request`: `file` is not a plain file name
pub async fn delete_image_handler<S: ImageStore>(
    State(state): State<AppState<S>>,
    Path(file): Path<String>,
) -> Result<StatusCode, StoreError> {
    if state.store.delete(&file).await? {
        info!("Deleted image {}", file);
    } else {
        debug!("Delete of missing image {}", file);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Handle display-now requests.
///
/// # Endpoint
///
/// `POST /inky` with a JSON body, either `"/data/images/x.png"` or
/// `{ "filePath": "/data/images/x.png" }`.
///
/// # Response
///
/// - `200 OK`: the display executable exited with status zero
/// - `404 Not Found`: the path is not a stored image (nothing is spawned)
/// - `500 Internal Server Error`: spawn failure, non-zero exit, or timeout
pub async fn display_handler<S: ImageStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<DisplayRequest>,
) -> Result<StatusCode, DisplayError> {
    let runner = state.display.as_ref().ok_or(DisplayError::NotConfigured)?;

    runner
        .display(state.store.as_ref(), request.file_path())
        .await?;

    info!("Display updated with {}", request.file_path());
    Ok(StatusCode::OK)
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
