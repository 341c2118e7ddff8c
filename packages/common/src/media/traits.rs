use async_trait::async_trait;
use serde::Serialize;

use super::error::MediaError;
use super::kind::MediaKind;
use super::staged::StagedFile;

/// Reference to an object held by a [`MediaStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// Publicly reachable URL of the object.
    pub url: String,
    /// Stable identifier used to delete the object later (`{kind}/{name}`).
    pub storage_id: String,
    /// Size in bytes.
    pub size: u64,
}

/// External media hosting.
///
/// Implementations copy a locally staged file to durable storage. They never
/// remove the staged file; releasing it is the caller's job.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the staged file and return its public reference.
    async fn put(&self, file: &StagedFile, kind: MediaKind) -> Result<StoredObject, MediaError>;

    /// Delete a previously stored object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, storage_id: &str, kind: MediaKind) -> Result<bool, MediaError>;

    /// Short name used in logs.
    fn backend(&self) -> &'static str;
}
