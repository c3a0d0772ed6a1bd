//! Mapping from file extensions to the closed set of supported image formats.

use std::fmt;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedFileType {
    /// JPEG / JFIF / EXIF images (`.jpg`, `.jpeg`)
    Jpeg,

    /// Portable Network Graphics (`.png`)
    Png,

    /// High Efficiency Image File Format (`.heic`)
    Heic,
}

impl SupportedFileType {
    /// Resolve a file extension, with or without the leading dot.
    ///
    /// Matching is case-insensitive. Returns `None` for anything that is not
    /// a supported image extension, including the empty string.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.strip_prefix('.').unwrap_or(extension);
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "heic" => Some(Self::Heic),
            _ => None,
        }
    }

    /// Get a human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Heic => "HEIC",
        }
    }
}

impl fmt::Display for SupportedFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
