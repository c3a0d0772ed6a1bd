//! Magic-byte validation for uploaded images.
//!
//! Each supported format has a small set of known leading byte sequences.
//! Validation reads exactly as many bytes as the longest signature of the
//! requested format and checks whether any signature is a prefix of them.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::SupportedFileType;

const JPEG_SIGNATURES: &[&[u8]] = &[
    &[0xFF, 0xD8, 0xFF, 0xE0], // JFIF
    &[0xFF, 0xD8, 0xFF, 0xE2], // ICC profile / CIFF
    &[0xFF, 0xD8, 0xFF, 0xE3], // Samsung
];

const PNG_SIGNATURES: &[&[u8]] = &[&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]];

// ISO-BMFF `ftyp` box of size 0x18 followed by a HEIF brand
const HEIC_SIGNATURES: &[&[u8]] = &[
    &[0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c'],
    &[0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'x'],
    &[0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'h', b'e', b'v', b'c'],
    &[0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'h', b'e', b'v', b'x'],
];

/// Known signatures for a file type.
pub fn signatures(file_type: SupportedFileType) -> &'static [&'static [u8]] {
    match file_type {
        SupportedFileType::Jpeg => JPEG_SIGNATURES,
        SupportedFileType::Png => PNG_SIGNATURES,
        SupportedFileType::Heic => HEIC_SIGNATURES,
    }
}

/// Number of header bytes needed to check every signature of a file type.
pub fn header_len(file_type: SupportedFileType) -> usize {
    signatures(file_type)
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(0)
}

/// Check an already-read header against the signatures of a file type.
///
/// The header must hold at least [`header_len`] bytes; shorter input never
/// matches.
pub fn matches_signature(header: &[u8], file_type: SupportedFileType) -> bool {
    if header.len() < header_len(file_type) {
        return false;
    }
    signatures(file_type)
        .iter()
        .any(|signature| header.starts_with(signature))
}

/// Read the header of `reader` and check it against the signatures of a file type.
///
/// A stream shorter than the required header is treated as a mismatch. The
/// reader's position afterwards is unspecified; callers must start over from
/// the original bytes for any further reads.
pub async fn is_valid_signature<R>(reader: &mut R, file_type: SupportedFileType) -> bool
where
    R: AsyncRead + Unpin,
{
    let mut header = vec![0u8; header_len(file_type)];
    match reader.read_exact(&mut header).await {
        Ok(_) => matches_signature(&header, file_type),
        Err(_) => false,
    }
}
