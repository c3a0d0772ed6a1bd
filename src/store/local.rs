//! Filesystem-backed image store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::StoreError;

use super::{validate_file_name, ImageStore};

/// [`ImageStore`] over a single local directory.
///
/// The directory is expected to exist; see
/// [`Config::prepare_directory`](crate::config::Config::prepare_directory).
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    directory: PathBuf,
}

impl LocalImageStore {
    /// Create a store rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    fn directory(&self) -> &Path {
        &self.directory
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!("Skipping non UTF-8 file name: {:?}", raw),
            }
        }

        Ok(names)
    }

    async fn write(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, StoreError> {
        validate_file_name(file_name)?;
        let path = self.path_of(file_name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            // Leave nothing half-written behind
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove partial file {}: {}", path.display(), cleanup);
            }
            return Err(e.into());
        }

        Ok(path)
    }

    async fn delete(&self, file_name: &str) -> Result<bool, StoreError> {
        validate_file_name(file_name)?;
        match tokio::fs::remove_file(self.path_of(file_name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, file_name: &str) -> Result<bool, StoreError> {
        validate_file_name(file_name)?;
        match tokio::fs::metadata(self.path_of(file_name)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
