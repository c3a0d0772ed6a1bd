//! Intake service for uploaded images.
//!
//! The IntakeService is the single entry point for new images. For each
//! upload it:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        IntakeService::accept                    │
//! │  1. Reject empty uploads      4. Generate opaque file name      │
//! │  2. Resolve file type         5. Decode & re-encode             │
//! │  3. Check magic bytes         6. Write to the ImageStore        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is written unless every earlier step succeeded.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::IntakeError;
use crate::format::{is_valid_signature, SupportedFileType};
use crate::store::ImageStore;

use super::encoder::ImageReencoder;

// =============================================================================
// Upload / Result Types
// =============================================================================

/// A single uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name supplied by the client (only its extension is used)
    pub file_name: String,

    /// Raw uploaded bytes
    pub data: Bytes,
}

impl ImageUpload {
    /// Create a new upload.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Extension of the final path component of the client file name, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .file_name()
            .map(Path::new)
            .and_then(|name| name.extension())
            .and_then(|ext| ext.to_str())
    }
}

/// Result of a successful intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    /// Generated opaque file name the image was stored under
    pub file_name: String,

    /// Size in bytes of the original upload
    pub size: u64,
}

// =============================================================================
// Intake Service
// =============================================================================

/// Validates, sanitizes and stores uploaded images.
pub struct IntakeService<S: ImageStore> {
    store: Arc<S>,
    encoder: ImageReencoder,
}

impl<S: ImageStore> IntakeService<S> {
    /// Create an intake service writing to `store`.
    pub fn new(store: Arc<S>, encoder: ImageReencoder) -> Self {
        Self { store, encoder }
    }

    /// Validate, re-encode and persist one upload.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::EmptyUpload`] for zero-length uploads
    /// - [`IntakeError::UnsupportedFileType`] for unknown extensions
    /// - [`IntakeError::SignatureMismatch`] when the bytes don't match the extension
    /// - [`IntakeError::Decode`] / [`IntakeError::Encode`] when re-encoding fails
    /// - [`IntakeError::Store`] when the write fails
    pub async fn accept(&self, upload: ImageUpload) -> Result<UploadedImage, IntakeError> {
        if upload.data.is_empty() {
            return Err(IntakeError::EmptyUpload);
        }

        let extension = upload.extension().unwrap_or_default().to_string();
        let file_type = SupportedFileType::from_extension(&extension).ok_or_else(|| {
            IntakeError::UnsupportedFileType {
                extension: extension.clone(),
            }
        })?;

        if !is_valid_signature(&mut &upload.data[..], file_type).await {
            return Err(IntakeError::SignatureMismatch { file_type });
        }

        let file_name = generate_file_name(&extension);

        let encoder = self.encoder.clone();
        let source = upload.data.clone();
        let encoded = tokio::task::spawn_blocking(move || encoder.reencode(&source, file_type))
            .await
            .map_err(|e| IntakeError::Encode {
                message: format!("re-encode task failed: {}", e),
            })??;

        let path = self.store.write(&file_name, &encoded).await?;

        info!(
            original = %upload.file_name,
            size = upload.data.len(),
            stored_size = encoded.len(),
            "Stored upload at {}",
            path.display()
        );

        Ok(UploadedImage {
            file_name,
            size: upload.data.len() as u64,
        })
    }
}

/// Generate an opaque file name: 128 random bits as hex plus the original extension.
pub fn generate_file_name(extension: &str) -> String {
    let token = Uuid::new_v4().simple();
    if extension.is_empty() {
        token.to_string()
    } else {
        format!("{}.{}", token, extension)
    }
}

// =============================================================================
// Tests
// =============================================================================
