//! Blob storage for recipe and restaurant images (S3 / MinIO).

pub mod images;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    #[error("S3 delete failed for {key}: {message}")]
    Delete { key: String, message: String },
}

/// Which record family an image belongs to. Stored as text in `images.owner_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    Recipe,
    Restaurant,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Recipe => "recipe",
            OwnerKind::Restaurant => "restaurant",
        }
    }
}

/// An image received from a client or the image model, not yet stored.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct ImageStore {
    s3: S3Client,
    bucket: String,
    public_url: String,
}

impl ImageStore {
    pub fn new(s3: S3Client, bucket: String, public_url: &str) -> Self {
        Self {
            s3,
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Uploads one image and returns its object key.
    pub async fn put(
        &self,
        kind: OwnerKind,
        owner_id: Uuid,
        image: &NewImage,
    ) -> Result<String, StorageError> {
        let key = object_key(kind, owner_id, &image.filename);
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(image.bytes.clone()))
            .content_type(&image.content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.clone(),
                message: e.to_string(),
            })?;

        info!("Uploaded image to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.s3
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Deletes every key, logging failures instead of returning them. Used after
    /// the owning rows are gone, when a leftover blob is only wasted space.
    pub async fn delete_best_effort(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.delete(key).await {
                warn!("Leaving orphaned blob behind: {e}");
            }
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

/// `<kind>/<owner_id>/<uuid>-<sanitized filename>`
pub fn object_key(kind: OwnerKind, owner_id: Uuid, filename: &str) -> String {
    format!(
        "{}/{}/{}-{}",
        kind.as_str(),
        owner_id,
        Uuid::new_v4(),
        sanitize_filename(filename)
    )
}

fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(['-', '.']).to_string();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        let owner = Uuid::new_v4();
        let key = object_key(OwnerKind::Recipe, owner, "My Pancakes.JPG");
        let prefix = format!("recipe/{owner}/");
        assert!(key.starts_with(&prefix));
        assert!(key.ends_with("-My-Pancakes.JPG"));
    }

    #[test]
    fn test_sanitize_filename_strips_paths_and_symbols() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\dish (1).png"), "dish--1-.png");
        assert_eq!(sanitize_filename("???"), "image");
    }

    #[test]
    fn test_public_url_joins_without_double_slash() {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        let store = ImageStore::new(
            S3Client::from_conf(conf),
            "larder".to_string(),
            "http://localhost:9000/larder/",
        );
        assert_eq!(
            store.public_url("recipe/1/a.png"),
            "http://localhost:9000/larder/recipe/1/a.png"
        );
    }
}
