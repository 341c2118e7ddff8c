pub mod media;

pub use media::{MediaError, MediaKind, MediaStore, StagedFile, StoredObject};
