use std::sync::Arc;
use std::time::Duration;

use common::media::filesystem::FilesystemMediaStore;
use common::media::s3::S3MediaStore;
use common::{MediaError, MediaKind, MediaStore, StagedFile};
use tracing::{info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::AppError;

/// A file accepted by the media store.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    pub url: String,
    pub storage_id: String,
    pub kind: MediaKind,
    /// Length in seconds, for videos whose duration could be probed.
    pub duration: Option<f64>,
}

/// Moves staged uploads into the configured [`MediaStore`] and deletes them
/// again, with a deadline on every store call.
#[derive(Clone)]
pub struct MediaGateway {
    store: Arc<dyn MediaStore>,
    timeout: Duration,
    ffprobe_bin: String,
}

impl MediaGateway {
    pub fn new(store: Arc<dyn MediaStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            timeout: Duration::from_secs(config.upload_timeout_secs),
            ffprobe_bin: config.ffprobe_bin.clone(),
        }
    }

    /// Build the store selected by `storage.backend`.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, MediaError> {
        let store: Arc<dyn MediaStore> = match config.backend {
            StorageBackend::Filesystem => Arc::new(
                FilesystemMediaStore::new(
                    config.filesystem.root.clone(),
                    &config.filesystem.public_base_url,
                )
                .await?,
            ),
            StorageBackend::S3 => {
                let s3 = config.s3.as_ref().ok_or_else(|| {
                    MediaError::Remote("storage.backend is s3 but storage.s3 is not set".into())
                })?;
                Arc::new(S3MediaStore::new(s3)?)
            }
        };
        info!("Media storage backend: {}", store.backend());
        Ok(Self::new(store, config))
    }

    /// Upload a staged file. The staged file is released whatever the outcome.
    pub async fn upload(&self, staged: StagedFile, kind: MediaKind) -> Result<MediaAsset, AppError> {
        let result: Result<MediaAsset, AppError> = async {
            let duration = match kind {
                MediaKind::Video => self.probe(&staged).await,
                MediaKind::Image => None,
            };

            let stored = tokio::time::timeout(self.timeout, self.store.put(&staged, kind))
                .await
                .map_err(|_| MediaError::Timeout(self.timeout))??;

            Ok(MediaAsset {
                url: stored.url,
                storage_id: stored.storage_id,
                kind,
                duration,
            })
        }
        .await;

        staged.release().await;

        result
    }

    async fn probe(&self, staged: &StagedFile) -> Option<f64> {
        if self.ffprobe_bin.is_empty() {
            return None;
        }
        match super::probe::probe_duration(&self.ffprobe_bin, staged.path()).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Could not read video duration: {e}");
                None
            }
        }
    }

    /// Delete a stored object. Failures are logged and otherwise ignored.
    pub async fn delete(&self, storage_id: &str, kind: MediaKind) {
        let result = tokio::time::timeout(self.timeout, self.store.delete(storage_id, kind)).await;
        match result {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                tracing::debug!(storage_id, "Media object was already gone");
            }
            Ok(Err(e)) => warn!(storage_id, "Failed to delete media object: {e}"),
            Err(_) => warn!(storage_id, "Timed out deleting media object"),
        }
    }

    /// Delete an asset uploaded earlier in a request that then failed.
    pub async fn discard(&self, asset: &MediaAsset) {
        self.delete(&asset.storage_id, asset.kind).await;
    }
}
