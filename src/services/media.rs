//! Media storage for uploaded event images

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::models::ImageUpload;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::helpers;

/// Stores uploads under generated unique names; the engine keeps only the key
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, upload: &ImageUpload) -> Result<String>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Writes uploads to a local directory
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalMediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: PathBuf::from(&config.upload_dir),
            max_bytes: config.max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate(&self, upload: &ImageUpload) -> Result<()> {
        if upload.bytes.is_empty() {
            return Err(EventDeskError::InvalidInput("Uploaded image is empty.".to_string()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(EventDeskError::InvalidInput(format!(
                "Uploaded image exceeds {} bytes.",
                self.max_bytes
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, upload: &ImageUpload) -> Result<String> {
        self.validate(upload)?;

        let key = helpers::generate_file_name(&upload.file_name);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&key), &upload.bytes).await?;

        info!(key = %key, size = upload.bytes.len(), "Event image stored");
        Ok(key)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        // keys are generated file names; anything with a path component is not ours
        if key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(EventDeskError::InvalidInput(format!("Invalid media key: {}", key)));
        }
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => {
                debug!(key = %key, "Event image removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
