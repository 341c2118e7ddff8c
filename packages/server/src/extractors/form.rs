use std::collections::HashMap;
use std::path::Path;

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use common::StagedFile;
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;
use crate::error::AppError;

/// Largest accepted text field, in bytes.
const MAX_TEXT_FIELD: usize = 64 * 1024;

/// A fully read multipart form: text fields in memory, file fields staged on disk.
///
/// Staged files that are not taken out are removed when the form is dropped.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl MultipartForm {
    /// Read every part of `multipart`. Parts named in `file_fields` are streamed
    /// to the staging directory; at most one file is accepted per name. Files
    /// under any other name are skipped.
    pub async fn collect(
        mut multipart: Multipart,
        file_fields: &[&str],
        storage: &StorageConfig,
    ) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if file_fields.contains(&name.as_str()) {
                if form.files.contains_key(&name) {
                    return Err(AppError::Validation(format!(
                        "Only one '{name}' file is allowed"
                    )));
                }
                let staged = stage_field(
                    field,
                    &name,
                    &storage.staging_dir,
                    storage.max_upload_size,
                )
                .await?;
                if let Some(staged) = staged {
                    form.files.insert(name, staged);
                }
            } else if field.file_name().is_none() {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
                if text.len() > MAX_TEXT_FIELD {
                    return Err(AppError::Validation(format!("'{name}' is too long")));
                }
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }
}

/// Stream one file part to the staging directory.
///
/// An empty part (a form submitted without choosing a file) yields `None`.
async fn stage_field(
    mut field: Field<'_>,
    name: &str,
    staging_dir: &Path,
    max_size: u64,
) -> Result<Option<StagedFile>, AppError> {
    let (mut staged, mut file) =
        StagedFile::create_in(staging_dir, field.file_name().map(str::to_string))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {e}")))?;

    let mut total_size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        total_size += chunk.len() as u64;
        if total_size > max_size {
            return Err(AppError::Validation(format!(
                "'{name}' exceeds maximum size of {max_size} bytes"
            )));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Staged file write failed: {e}")))?;
    }

    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Staged file flush failed: {e}")))?;
    drop(file);

    if total_size == 0 {
        staged.release().await;
        return Ok(None);
    }
    staged.set_size(total_size);
    Ok(Some(staged))
}
