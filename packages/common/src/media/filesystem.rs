use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::MediaError;
use super::kind::MediaKind;
use super::staged::StagedFile;
use super::traits::{MediaStore, StoredObject};
use super::validate_storage_id;

/// Filesystem-backed media store.
///
/// Objects are laid out as `{root}/{kind}/{uuid}[.ext]` and exposed under
/// `{public_base_url}/{kind}/{uuid}[.ext]`.
pub struct FilesystemMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store, creating the layout if needed.
    pub async fn new(root: PathBuf, public_base_url: &str) -> Result<Self, MediaError> {
        fs::create_dir_all(root.join(MediaKind::Image.as_str())).await?;
        fs::create_dir_all(root.join(MediaKind::Video.as_str())).await?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn object_path(&self, storage_id: &str) -> PathBuf {
        self.root.join(storage_id)
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn put(&self, file: &StagedFile, kind: MediaKind) -> Result<StoredObject, MediaError> {
        let name = match file.extension() {
            Some(ext) => format!("{}.{ext}", uuid::Uuid::now_v7()),
            None => uuid::Uuid::now_v7().to_string(),
        };
        let storage_id = format!("{kind}/{name}");
        let target = self.object_path(&storage_id);

        let size = match fs::copy(file.path(), &target).await {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&target).await;
                return Err(e.into());
            }
        };

        Ok(StoredObject {
            url: format!("{}/{storage_id}", self.public_base_url),
            storage_id,
            size,
        })
    }

    async fn delete(&self, storage_id: &str, kind: MediaKind) -> Result<bool, MediaError> {
        validate_storage_id(storage_id)?;
        if !storage_id.starts_with(kind.as_str()) {
            return Err(MediaError::InvalidId(storage_id.to_string()));
        }
        match fs::remove_file(self.object_path(storage_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn backend(&self) -> &'static str {
        "filesystem"
    }
}
