use std::path::{Path, PathBuf};

use tokio::fs;

use super::error::MediaError;
use super::kind::MediaKind;

/// A file staged on local disk between the request body and the media store.
///
/// The file is removed on every exit path: call [`StagedFile::release`] once
/// the upload has been attempted, and `Drop` removes it if the value is
/// discarded early (for example when a later multipart field fails
/// validation). Removal tolerates the file already being gone.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file_name: Option<String>,
    size: u64,
    released: bool,
}

impl StagedFile {
    /// Create an empty staged file in `dir` and return it with a writable handle.
    pub async fn create_in(
        dir: &Path,
        file_name: Option<String>,
    ) -> Result<(Self, fs::File), MediaError> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(format!("upload-{}", uuid::Uuid::new_v4()));
        let file = fs::File::create(&path).await?;
        Ok((
            Self {
                path,
                file_name,
                size: 0,
                released: false,
            },
            file,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename supplied by the client, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// Lower-cased alphanumeric extension of the client filename, if present.
    pub fn extension(&self) -> Option<String> {
        let ext = Path::new(self.file_name.as_deref()?)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext)
    }

    /// MIME type guessed from the client filename.
    pub fn content_type(&self, kind: MediaKind) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|m| m.to_string())
            .unwrap_or_else(|| kind.default_content_type().to_string())
    }

    /// Remove the staged file from disk.
    pub async fn release(mut self) {
        self.released = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to remove staged file: {e}");
            }
        }
    }
}

fn remove_blocking(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to remove staged file: {e}");
        }
    }
}

impl Drop for StagedFile {
    /// Unlinks on the blocking pool when dropped inside a runtime, inline otherwise.
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_blocking(&path));
            }
            Err(_) => remove_blocking(&path),
        }
    }
}
