//! Shared behavior of the S3-compatible backends
//!
//! Both S3 strategies differ only in how they talk to the store. The
//! bucket guarantee and download URL synthesis live here, on top of the
//! [`ObjectTransport`] each strategy implements.

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::core::error::{Result, StorageError, TransportError};

/// Raw bucket and object operations of an S3-compatible client
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    async fn bucket_exists(&self) -> std::result::Result<bool, TransportError>;

    /// Create the bucket.
    ///
    /// Returns `TransportError::BucketAlreadyExists` only when the store
    /// unambiguously reports the bucket as already present.
    async fn create_bucket(&self) -> std::result::Result<(), TransportError>;

    async fn put_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> std::result::Result<(), TransportError>;
}

/// Build the public URL of an uploaded object
pub fn download_url(download_host: &str, bucket_name: &str, path: &str) -> String {
    format!("{}/{}/{}", download_host, bucket_name, path)
}

/// S3-compatible storage service over a transport strategy
pub struct S3CompatibleService<T> {
    transport: T,
    bucket_name: String,
    download_host: String,
}

impl<T: ObjectTransport> S3CompatibleService<T> {
    /// Wrap a transport, making sure the bucket exists first
    pub async fn connect(transport: T, bucket_name: &str, download_host: &str) -> Result<Self> {
        ensure_bucket_exists(&transport, bucket_name).await?;

        Ok(Self {
            transport,
            bucket_name: bucket_name.to_string(),
            download_host: download_host.to_string(),
        })
    }

    pub async fn upload(&self, path: &str, content: Vec<u8>, content_type: &str) -> Result<String> {
        debug!(
            "Uploading file '{}' ({} bytes) to bucket '{}'",
            path,
            content.len(),
            self.bucket_name
        );

        self.transport
            .put_object(path, content, content_type)
            .await
            .map_err(|source| {
                error!("Failed to upload file '{}': {}", path, source);
                StorageError::Upload {
                    path: path.to_string(),
                    source,
                }
            })?;

        let url = download_url(&self.download_host, &self.bucket_name, path);
        debug!("Uploaded file '{}' -> {}", path, url);
        Ok(url)
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

/// Check-then-create, tolerating a concurrent creator
async fn ensure_bucket_exists<T: ObjectTransport>(transport: &T, bucket_name: &str) -> Result<()> {
    let construction = |source| StorageError::Construction {
        bucket: bucket_name.to_string(),
        source,
    };

    if transport.bucket_exists().await.map_err(construction)? {
        debug!("Bucket '{}' already exists", bucket_name);
        return Ok(());
    }

    info!("Bucket '{}' does not exist, creating it", bucket_name);
    match transport.create_bucket().await {
        Ok(()) => {
            info!("Bucket '{}' created successfully", bucket_name);
            Ok(())
        }
        Err(TransportError::BucketAlreadyExists(_)) => {
            debug!("Bucket '{}' was created concurrently", bucket_name);
            Ok(())
        }
        Err(e) => {
            error!("Failed to create bucket '{}': {}", bucket_name, e);
            Err(construction(e))
        }
    }
}
