use super::{ArtifactStore, StoredArtifact, STATIC_URL_PREFIX};
use crate::image::mime::extension_for_mime;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Flat directory of `generated_<uuid>.<ext>` files, served at `/static`.
pub struct StaticDirStore {
    dir: PathBuf,
}

impl StaticDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to create static directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    async fn write_new(path: &Path, data: &[u8]) -> std::io::Result<()> {
        // create_new: an existing file is never overwritten
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(data).await?;
        file.flush().await
    }
}

#[async_trait]
impl ArtifactStore for StaticDirStore {
    async fn save(&self, data: &[u8], mime_type: &str) -> Result<StoredArtifact> {
        let extension = extension_for_mime(mime_type).ok_or_else(|| {
            Error::Storage(format!(
                "Cannot derive a file extension from MIME type '{}'",
                mime_type
            ))
        })?;

        self.ensure_dir().await?;

        let filename = format!("generated_{}.{}", Uuid::new_v4(), extension);
        let path = self.dir.join(&filename);

        Self::write_new(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write artifact {}: {}", path.display(), e);
            Error::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!("Saved {} ({} bytes) to {}", mime_type, data.len(), path.display());

        Ok(StoredArtifact {
            url: format!("{}/{}", STATIC_URL_PREFIX, filename),
            filename,
            path,
        })
    }
}
