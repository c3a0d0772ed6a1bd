//! Configuration management for Imager.
//!
//! Configuration is read once at startup from command-line arguments, falling
//! back to environment variables with the `IMAGER_` prefix, and is never
//! mutated afterwards.
//!
//! # Environment Variables
//!
//! - `IMAGER_HOST` - Server bind address (default: 0.0.0.0)
//! - `IMAGER_PORT` - Server port (default: 5000)
//! - `IMAGER_DIRECTORY` - Storage directory for images (required)
//! - `IMAGER_INKY_EXECUTABLE` - Display update executable (optional)
//! - `IMAGER_INKY_TIMEOUT` - Display update timeout in seconds (default: 60)
//! - `IMAGER_JPEG_QUALITY` - Quality for re-encoded JPEGs (default: 90)
//! - `IMAGER_MAX_UPLOAD_SIZE` - Request body limit, e.g. "50MB" (default: 50MB)
//! - `IMAGER_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::intake::DEFAULT_JPEG_QUALITY;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default display update timeout in seconds.
pub const DEFAULT_INKY_TIMEOUT_SECS: u64 = 60;

/// Default request body limit in bytes (50MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Imager - a small photo manager backend.
///
/// Accepts image uploads into a local directory, lists and deletes them, and
/// can push a stored image to an e-ink display through an external program.
#[derive(Parser, Debug, Clone)]
#[command(name = "imager")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IMAGER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "IMAGER_PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Directory uploaded images are stored in. Created if missing.
    #[arg(short, long, env = "IMAGER_DIRECTORY")]
    pub directory: PathBuf,

    /// Maximum accepted request body size (e.g. "20MB", "512KB").
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "IMAGER_MAX_UPLOAD_SIZE", value_parser = parse_size)]
    pub max_upload_size: usize,

    /// JPEG quality used when re-encoding uploads (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "IMAGER_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    // =========================================================================
    // Display Configuration
    // =========================================================================
    /// Executable that pushes an image to the e-ink display.
    ///
    /// Invoked with the image path as its only argument. When unset, the
    /// display endpoint is disabled.
    #[arg(long, env = "IMAGER_INKY_EXECUTABLE")]
    pub inky_executable: Option<PathBuf>,

    /// Timeout in seconds for one display update.
    #[arg(long, default_value_t = DEFAULT_INKY_TIMEOUT_SECS, env = "IMAGER_INKY_TIMEOUT")]
    pub inky_timeout: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "IMAGER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.directory.as_os_str().is_empty() {
            return Err(
                "Storage directory is required. Set --directory or IMAGER_DIRECTORY".to_string(),
            );
        }

        if self.inky_timeout == 0 {
            return Err("inky_timeout must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.max_upload_size == 0 {
            return Err("max_upload_size must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Display update timeout.
    pub fn inky_timeout(&self) -> Duration {
        Duration::from_secs(self.inky_timeout)
    }

    /// Create the storage directory if needed and return its absolute path.
    pub fn prepare_directory(&self) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;
        absolute_path(&self.directory)
    }
}

fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Parse a human-readable size such as "50MB", "512KB" or "1048576".
pub fn parse_size(value: &str) -> Result<usize, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let number: usize = digits
        .parse()
        .map_err(|_| format!("invalid size: {:?}", value))?;

    let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit: {:?}", other)),
    };

    number
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {:?}", value))
}

// =============================================================================
// Tests
// =============================================================================
