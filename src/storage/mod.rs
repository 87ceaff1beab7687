//! Artifact storage for generated images
//!
//! Writes generated images into the static directory under fresh unique
//! names and hands back the public URL they are served from.

pub mod local;
pub mod mock;

pub use local::StaticDirStore;
pub use mock::MockArtifactStore;

use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// URL prefix the static directory is mounted under.
pub const STATIC_URL_PREFIX: &str = "/static";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save(&self, data: &[u8], mime_type: &str) -> Result<StoredArtifact>;
}
