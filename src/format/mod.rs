//! Image format identification.
//!
//! Two checks gate every upload:
//!
//! - [`SupportedFileType::from_extension`] maps the uploaded file's extension
//!   onto the closed set of accepted formats (JPEG, PNG, HEIC).
//! - [`is_valid_signature`] confirms that the leading bytes of the upload
//!   actually carry that format's magic bytes.

pub mod file_type;
pub mod signature;

pub use file_type::SupportedFileType;
pub use signature::{header_len, is_valid_signature, matches_signature, signatures};
