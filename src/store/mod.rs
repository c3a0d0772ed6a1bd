//! Image storage layer.
//!
//! Stored images live as flat files directly under one storage directory.
//! Handlers talk to storage only through the [`ImageStore`] trait so that the
//! HTTP layer can be exercised against an in-memory store in tests.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        HTTP handlers / IntakeService    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          ImageStore trait               │
//! │   list · write · delete · exists        │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │  LocalImageStore (tokio::fs directory)  │
//! └─────────────────────────────────────────┘
//! ```

mod local;

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::StoreError;

pub use local::LocalImageStore;

/// URL prefix under which the storage directory is served read-only.
pub const STATIC_IMAGES_ROUTE: &str = "/static/images";

// =============================================================================
// ImageStore Trait
// =============================================================================

/// Flat, name-addressed storage for image files.
///
/// Every method takes a bare file name; implementations must reject names
/// that are not a single plain path component (see [`validate_file_name`]).
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// The directory all names are resolved against.
    fn directory(&self) -> &Path;

    /// Full path of a stored file.
    fn path_of(&self, file_name: &str) -> PathBuf {
        self.directory().join(file_name)
    }

    /// Names of all files directly under the directory, in no particular order.
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Write a new file. Fails if a file with that name already exists.
    ///
    /// Returns the full path of the written file.
    async fn write(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, StoreError>;

    /// Delete a file if present.
    ///
    /// Returns whether a file was actually removed.
    async fn delete(&self, file_name: &str) -> Result<bool, StoreError>;

    /// Check whether a file exists.
    async fn exists(&self, file_name: &str) -> Result<bool, StoreError>;
}

/// Check that `file_name` is a single, normal path component.
///
/// Rejects empty names, `.`/`..`, anything containing a path separator, and
/// names with NUL bytes.
pub fn validate_file_name(file_name: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidName(file_name.to_string());

    if file_name.is_empty() || file_name.contains('\0') || file_name.contains(['/', '\\']) {
        return Err(invalid());
    }

    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

// =============================================================================
// StoredImage
// =============================================================================

/// A stored image as exposed by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    /// Full path of the file on disk
    pub file_path: String,

    /// Public URL the file is served under
    pub url: String,

    /// Bare file name including extension
    pub file_name_with_extension: String,
}

impl StoredImage {
    /// Project a stored file name into its listing record.
    pub fn from_name(directory: &Path, file_name: &str) -> Self {
        Self {
            file_path: directory.join(file_name).to_string_lossy().into_owned(),
            url: format!("{}/{}", STATIC_IMAGES_ROUTE, file_name),
            file_name_with_extension: file_name.to_string(),
        }
    }
}
