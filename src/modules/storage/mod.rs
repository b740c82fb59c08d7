//! Storage module for file uploads
//!
//! One capability contract, [`OssService`], served by three backends:
//! MinIO (rust-s3 library), S3 (hand-signed requests) and the iFly gateway.
//! [`factory::create`] picks one from [`StorageConfig`].
//!
//! [`StorageConfig`]: crate::core::config::StorageConfig

mod endpoint;
pub mod factory;
mod gateway_client;
mod minio_client;
mod s3_client;
mod s3_compatible;
mod sigv4;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::shared::constants::DEFAULT_CONTENT_TYPE;

pub use endpoint::Endpoint;
pub use factory::{create, select_backend};
pub use gateway_client::{sign_request, GatewayAuth, IFlyGatewayStorageClient};
pub use minio_client::{MinIOService, MinIOTransport};
pub use s3_client::{S3Service, S3Transport};
pub use s3_compatible::{download_url, ObjectTransport, S3CompatibleService};
pub use sigv4::{SigV4Signer, SignedHeaders};

/// Backend a storage client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OssBackend {
    /// S3-compatible store through the rust-s3 library
    Minio,
    /// S3-compatible store through SigV4-signed HTTP requests
    S3,
    /// iFly gateway storage
    IflyGateway,
}

/// Object storage capability shared by every backend
#[async_trait]
pub trait OssService: Send + Sync {
    /// Upload `content` to `path` and return its download URL.
    ///
    /// `content_type` defaults to `application/octet-stream`. Existing
    /// objects at `path` are overwritten.
    async fn upload(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String>;

    fn backend(&self) -> OssBackend;
}

/// Storage client produced by the factory
pub enum StorageClient {
    Minio(MinIOService),
    S3(S3Service),
    IflyGateway(IFlyGatewayStorageClient),
}

impl StorageClient {
    pub fn bucket_name(&self) -> &str {
        match self {
            StorageClient::Minio(service) => service.bucket_name(),
            StorageClient::S3(service) => service.bucket_name(),
            StorageClient::IflyGateway(client) => client.bucket_name(),
        }
    }
}

#[async_trait]
impl OssService for StorageClient {
    async fn upload(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);

        match self {
            StorageClient::Minio(service) => service.upload(path, content, content_type).await,
            StorageClient::S3(service) => service.upload(path, content, content_type).await,
            StorageClient::IflyGateway(client) => client.upload(path, content, content_type).await,
        }
    }

    fn backend(&self) -> OssBackend {
        match self {
            StorageClient::Minio(_) => OssBackend::Minio,
            StorageClient::S3(_) => OssBackend::S3,
            StorageClient::IflyGateway(_) => OssBackend::IflyGateway,
        }
    }
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("backend", &self.backend())
            .field("bucket", &self.bucket_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use crate::core::error::StorageError;

    #[tokio::test]
    async fn test_dispatch_through_trait_object() {
        let config = StorageConfig::from_lookup(|key| match key {
            "OSS_ENDPOINT" => Some("http://127.0.0.1:1".to_string()),
            "OSS_BUCKET_NAME" => Some("workflow".to_string()),
            _ => None,
        })
        .unwrap();

        let client: Box<dyn OssService> = Box::new(create(&config).await.unwrap());
        assert_eq!(client.backend(), OssBackend::IflyGateway);

        let err = client.upload("a.bin", vec![0u8; 4], None).await.unwrap_err();
        assert!(matches!(err, StorageError::Upload { .. }));
    }
}
