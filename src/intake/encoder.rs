//! Image re-encoder.
//!
//! Uploads are decoded to pixels and written back out in their own format
//! before they reach disk. Anything that is not pixel data (EXIF blocks,
//! embedded thumbnails, text chunks, trailing bytes) is dropped on the way.
//!
//! # Design Decisions
//!
//! - **Same format out as in**: a `.png` stays PNG and a `.jpg` stays JPEG.
//! - **No resizing**: dimensions are preserved exactly.
//! - **No passthrough**: a format without a decoder (HEIC) fails with
//!   [`IntakeError::Decode`] instead of being stored as received.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::IntakeError;
use crate::format::SupportedFileType;

/// Default JPEG quality (1-100) for re-encoded photos.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Re-encoder
// =============================================================================

/// Decodes an upload and re-encodes it in the same format.
///
/// # Example
///
/// ```ignore
/// use imager::intake::ImageReencoder;
/// use imager::format::SupportedFileType;
///
/// let encoder = ImageReencoder::new(90);
/// let clean = encoder.reencode(&upload_bytes, SupportedFileType::Png)?;
/// ```
#[derive(Debug, Clone)]
pub struct ImageReencoder {
    jpeg_quality: u8,
}

impl Default for ImageReencoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageReencoder {
    /// Create a re-encoder writing JPEGs at `jpeg_quality` (clamped to 1-100).
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY),
        }
    }

    /// JPEG quality used for output.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Decode `source` as `file_type` and encode it again.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::Decode`] if the data cannot be decoded as that format,
    ///   or if no decoder exists for it
    /// - [`IntakeError::Encode`] if writing the output fails
    pub fn reencode(&self, source: &[u8], file_type: SupportedFileType) -> Result<Bytes, IntakeError> {
        let format = codec_format(file_type).ok_or_else(|| IntakeError::Decode {
            message: format!("no decoder available for {}", file_type),
        })?;

        let img = ImageReader::with_format(Cursor::new(source), format)
            .decode()
            .map_err(|e| IntakeError::Decode {
                message: e.to_string(),
            })?;

        let mut output = Vec::new();
        let encoded = match file_type {
            SupportedFileType::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut output, self.jpeg_quality);
                jpeg_compatible(img).write_with_encoder(encoder)
            }
            _ => img.write_with_encoder(PngEncoder::new(&mut output)),
        };

        encoded.map_err(|e| IntakeError::Encode {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(output))
    }
}

fn codec_format(file_type: SupportedFileType) -> Option<ImageFormat> {
    match file_type {
        SupportedFileType::Jpeg => Some(ImageFormat::Jpeg),
        SupportedFileType::Png => Some(ImageFormat::Png),
        SupportedFileType::Heic => None,
    }
}

/// The JPEG encoder only takes 8-bit luma or RGB.
fn jpeg_compatible(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

// =============================================================================
// Tests
// =============================================================================
