use super::{ArtifactStore, StoredArtifact, STATIC_URL_PREFIX};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory store that records what it was asked to save.
pub struct MockArtifactStore {
    saved: Arc<Mutex<Vec<(StoredArtifact, Vec<u8>)>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockArtifactStore {
    pub fn new() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn saved(&self) -> Vec<(StoredArtifact, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl Default for MockArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for MockArtifactStore {
    async fn save(&self, data: &[u8], mime_type: &str) -> Result<StoredArtifact> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Storage("Mock failure".to_string()));
        }

        let extension = crate::image::mime::subtype(mime_type).unwrap_or("bin");
        let filename = format!("generated_{}.{}", Uuid::new_v4(), extension);
        let artifact = StoredArtifact {
            path: PathBuf::from("/mock").join(&filename),
            url: format!("{}/{}", STATIC_URL_PREFIX, filename),
            filename,
        };

        self.saved
            .lock()
            .unwrap()
            .push((artifact.clone(), data.to_vec()));
        Ok(artifact)
    }
}
