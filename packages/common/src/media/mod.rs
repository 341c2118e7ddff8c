mod error;
mod kind;
mod staged;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::MediaError;
pub use kind::MediaKind;
pub use staged::StagedFile;
pub use traits::{MediaStore, StoredObject};

/// Validate a storage id of the form `{kind}/{name}` produced by a [`MediaStore`].
///
/// Rejects anything that could escape the store's namespace.
pub(crate) fn validate_storage_id(storage_id: &str) -> Result<(), MediaError> {
    let mut parts = storage_id.splitn(2, '/');
    let (Some(prefix), Some(name)) = (parts.next(), parts.next()) else {
        return Err(MediaError::InvalidId(storage_id.to_string()));
    };
    if MediaKind::from_prefix(prefix).is_none()
        || name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.starts_with('.')
    {
        return Err(MediaError::InvalidId(storage_id.to_string()));
    }
    Ok(())
}
