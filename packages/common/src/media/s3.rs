use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;

use super::error::MediaError;
use super::kind::MediaKind;
use super::staged::StagedFile;
use super::traits::{MediaStore, StoredObject};
use super::validate_storage_id;

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). Empty means AWS.
    #[serde(default)]
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL objects are served from. Defaults to the bucket URL.
    #[serde(default)]
    pub public_base_url: String,
    #[serde(default)]
    pub path_style: bool,
}

/// Media store backed by an S3-compatible bucket.
pub struct S3MediaStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3MediaStore {
    pub fn new(config: &S3Config) -> Result<Self, MediaError> {
        let region = if config.endpoint.is_empty() {
            config
                .region
                .parse::<Region>()
                .map_err(|e| MediaError::Remote(format!("invalid region: {e}")))?
        } else {
            Region::Custom {
                region: config.region.clone(),
                endpoint: config.endpoint.clone(),
            }
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| MediaError::Remote(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| MediaError::Remote(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        let public_base_url = if config.public_base_url.is_empty() {
            bucket.url()
        } else {
            config.public_base_url.clone()
        };

        Ok(Self {
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn put(&self, file: &StagedFile, kind: MediaKind) -> Result<StoredObject, MediaError> {
        let name = match file.extension() {
            Some(ext) => format!("{}.{ext}", uuid::Uuid::now_v7()),
            None => uuid::Uuid::now_v7().to_string(),
        };
        let storage_id = format!("{kind}/{name}");

        let mut reader = tokio::fs::File::open(file.path()).await?;
        let response = self
            .bucket
            .put_object_stream_with_content_type(&mut reader, &storage_id, file.content_type(kind))
            .await
            .map_err(|e| MediaError::Remote(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(MediaError::Remote(format!(
                "upload of {storage_id} returned HTTP {status}"
            )));
        }

        Ok(StoredObject {
            url: format!("{}/{storage_id}", self.public_base_url),
            storage_id,
            size: file.size(),
        })
    }

    async fn delete(&self, storage_id: &str, kind: MediaKind) -> Result<bool, MediaError> {
        validate_storage_id(storage_id)?;
        if !storage_id.starts_with(kind.as_str()) {
            return Err(MediaError::InvalidId(storage_id.to_string()));
        }

        let response = self
            .bucket
            .delete_object(storage_id)
            .await
            .map_err(|e| MediaError::Remote(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(MediaError::Remote(format!(
                "delete of {storage_id} returned HTTP {status}"
            ))),
        }
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}
