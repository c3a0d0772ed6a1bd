//! Pushing a stored image to the e-ink display.
//!
//! The display itself is driven by a separate executable that takes the path
//! of an image as its only argument. This module checks that the requested
//! path really is a stored image, runs the executable against it and bounds
//! the run with a timeout.
//!
//! The child is spawned with `kill_on_drop`, so it is killed both when the
//! timeout fires and when the surrounding request future is dropped (client
//! disconnect). Captured output is logged, never returned.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{DisplayError, StoreError};
use crate::store::ImageStore;

/// Output captured from a display run.
#[derive(Debug, Clone)]
pub struct DisplayOutput {
    /// Process exit status
    pub status: ExitStatus,

    /// Captured standard output (lossy UTF-8)
    pub stdout: String,

    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

/// Runs the external display executable.
#[derive(Debug, Clone)]
pub struct DisplayRunner {
    program: PathBuf,
    timeout: Duration,
}

impl DisplayRunner {
    /// Create a runner for `program` with the given timeout.
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Path of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Maximum time a single run may take.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a client-supplied path to a stored image and show it.
    ///
    /// Fails with [`DisplayError::NotFound`] without spawning anything when
    /// the path does not point at an existing file directly inside the
    /// store's directory.
    pub async fn display<S: ImageStore>(
        &self,
        store: &S,
        requested: &str,
    ) -> Result<DisplayOutput, DisplayError> {
        let path = resolve_stored_path(store, requested).await?;
        self.run(&path).await
    }

    /// Run the executable against `path`.
    ///
    /// # Errors
    ///
    /// - [`DisplayError::Spawn`] if the process cannot be started
    /// - [`DisplayError::Timeout`] if it runs longer than the timeout (it is killed)
    /// - [`DisplayError::ExitStatus`] if it exits non-zero
    /// - [`DisplayError::Wait`] if collecting its output fails
    pub async fn run(&self, path: &Path) -> Result<DisplayOutput, DisplayError> {
        let program = self.program_name();

        let child = Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DisplayError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;

        info!("Updating display with {}", path.display());

        // On timeout the wait future is dropped together with the child,
        // which kills the process.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(DisplayError::Wait {
                    program,
                    message: e.to_string(),
                })
            }
            Err(_elapsed) => {
                return Err(DisplayError::Timeout {
                    program,
                    after: self.timeout,
                })
            }
        };

        let result = DisplayOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.status.success() {
            warn!(
                status = %result.status,
                stderr = %result.stderr.trim(),
                "{} reported failure", program
            );
            return Err(DisplayError::ExitStatus {
                program,
                code: result.status.code(),
            });
        }

        debug!(stdout = %result.stdout.trim(), "{} finished", program);
        Ok(result)
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }
}

/// Check that `requested` names an existing file directly inside the store.
///
/// The parent directory must equal the store directory exactly; no
/// normalization is applied, so `..` segments never match.
pub async fn resolve_stored_path<S: ImageStore>(
    store: &S,
    requested: &str,
) -> Result<PathBuf, DisplayError> {
    let not_found = || DisplayError::NotFound {
        path: requested.to_string(),
    };

    let path = Path::new(requested);
    if path.parent() != Some(store.directory()) {
        return Err(not_found());
    }

    let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(not_found)?;

    match store.exists(file_name).await {
        Ok(true) => Ok(path.to_path_buf()),
        Ok(false) | Err(StoreError::InvalidName(_)) => Err(not_found()),
        Err(e) => Err(e.into()),
    }
}
