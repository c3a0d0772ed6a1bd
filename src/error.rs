use std::time::Duration;

use thiserror::Error;

use crate::format::SupportedFileType;

/// Errors raised by an image store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File name is not a single plain path component
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
}

/// Errors that can occur while taking in an uploaded image
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Upload had no `file` field or zero bytes (HTTP 400)
    #[error("No file uploaded.")]
    EmptyUpload,

    /// Multipart body could not be read (HTTP 400)
    #[error("Malformed upload: {message}")]
    Malformed { message: String },

    /// Request body exceeded the configured upload limit (HTTP 413)
    #[error("Upload too large: {message}")]
    TooLarge { message: String },

    /// Extension does not map to a supported format (HTTP 400)
    #[error("Unsupported file type: {extension:?}")]
    UnsupportedFileType { extension: String },

    /// Leading bytes do not match the format implied by the extension (HTTP 400)
    #[error("File content does not match a {file_type} signature")]
    SignatureMismatch { file_type: SupportedFileType },

    /// Upload has a valid signature but could not be decoded
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Re-encoding the decoded image failed
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Writing the re-encoded image failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from pushing an image to the external display executable
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Path is outside the storage directory or does not exist (HTTP 404)
    #[error("Image not found: {path}")]
    NotFound { path: String },

    /// No display executable is configured
    #[error("No display executable configured")]
    NotConfigured,

    /// The executable could not be started
    #[error("Failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },

    /// The executable ran but reported failure
    #[error("{program} exited with status {code:?}")]
    ExitStatus { program: String, code: Option<i32> },

    /// The executable did not finish in time and was killed
    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    /// Waiting on the child process failed
    #[error("I/O error waiting for {program}: {message}")]
    Wait { program: String, message: String },

    /// Checking the image in the store failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
